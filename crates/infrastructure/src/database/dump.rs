//! Plain-SQL dump and restore for the operator CLI.
//!
//! The dump is a self-contained script: schema objects first, then row
//! inserts per table. Foreign keys are switched off for the duration of
//! the restore so table order does not matter.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use taskgenie_errors::{TaskGenieError, TaskGenieResult};

/// Render the whole database as an executable SQL script.
pub async fn dump_database(pool: &SqlitePool) -> TaskGenieResult<String> {
    let mut out = String::new();
    out.push_str("PRAGMA foreign_keys=OFF;\n");
    out.push_str("BEGIN TRANSACTION;\n");

    let objects: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT type, name, sql FROM sqlite_master
        WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%'
        ORDER BY CASE type WHEN 'table' THEN 0 ELSE 1 END, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    for (kind, name, sql) in &objects {
        out.push_str(sql);
        out.push_str(";\n");

        if kind == "table" {
            let select = format!("SELECT * FROM \"{name}\"");
            let rows = sqlx::query(&select).fetch_all(pool).await?;
            for row in &rows {
                let values = (0..row.len())
                    .map(|index| render_value(row, index))
                    .collect::<TaskGenieResult<Vec<_>>>()?
                    .join(", ");
                out.push_str(&format!("INSERT INTO \"{name}\" VALUES ({values});\n"));
            }
        }
    }

    out.push_str("COMMIT;\n");
    Ok(out)
}

/// Execute a dump script against an empty database.
pub async fn restore_database(pool: &SqlitePool, script: &str) -> TaskGenieResult<()> {
    sqlx::raw_sql(script).execute(pool).await?;
    Ok(())
}

/// SQL literal for one column of a row, based on the value's runtime type.
fn render_value(row: &SqliteRow, index: usize) -> TaskGenieResult<String> {
    use sqlx::{TypeInfo as _, ValueRef as _};

    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok("NULL".to_string());
    }
    let type_name = raw.type_info().name().to_string();

    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Ok(row.try_get::<i64, _>(index)?.to_string()),
        "REAL" => Ok(row.try_get::<f64, _>(index)?.to_string()),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(index)?;
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            Ok(format!("X'{hex}'"))
        }
        "TEXT" | "DATETIME" | "DATE" | "TIME" | "NUMERIC" => {
            Ok(quote_text(&row.try_get::<String, _>(index)?))
        }
        other => Err(TaskGenieError::database_error(format!(
            "cannot dump column of type {other}"
        ))),
    }
}

fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
