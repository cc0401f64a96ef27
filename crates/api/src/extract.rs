use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON extractor whose rejection renders the standard `{error, code}`
/// body instead of axum's plain-text default.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
