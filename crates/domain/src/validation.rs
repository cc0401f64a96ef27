use taskgenie_errors::{TaskGenieError, TaskGenieResult};

pub const MAX_TITLE_LENGTH: usize = 255;

/// A title must be non-empty and at most 255 characters, on creation and
/// on every partial update alike.
pub fn validate_title(title: &str) -> TaskGenieResult<()> {
    if title.is_empty() {
        return Err(TaskGenieError::validation("title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TaskGenieError::validation(format!(
            "title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_title() {
        assert!(validate_title("Buy milk").is_ok());
        assert!(validate_title("x").is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = validate_title("").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_title_at_limit_accepted() {
        let title = "a".repeat(MAX_TITLE_LENGTH);
        assert!(validate_title(&title).is_ok());
    }

    #[test]
    fn test_oversized_title_rejected() {
        let title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&title).is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 255 multi-byte characters are within the limit
        let title = "汉".repeat(MAX_TITLE_LENGTH);
        assert!(validate_title(&title).is_ok());
    }
}
