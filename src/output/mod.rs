pub mod json;
pub mod result;
pub mod yaml;

pub use result::{format, Fragment, FormattedResult, LineColumn};

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Encode a formatted result as text in the given format.
pub fn encode(result: &FormattedResult, format: OutputFormat) -> Result<String, QueryError> {
    match format {
        OutputFormat::Yaml => yaml::format_output(result),
        OutputFormat::Json => json::format_output(result),
    }
}
