use super::FormattedResult;
use crate::error::QueryError;

/// Format matches as a YAML sequence of capture maps
pub fn format_output(result: &FormattedResult) -> Result<String, QueryError> {
    Ok(serde_yaml::to_string(result)?)
}
