use super::FormattedResult;
use crate::error::QueryError;

/// Format matches as pretty-printed JSON
pub fn format_output(result: &FormattedResult) -> Result<String, QueryError> {
    Ok(serde_json::to_string_pretty(result)?)
}
