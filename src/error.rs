use crate::query::QuerySyntaxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("cannot process this file type: no grammar registered for '{language}'")]
    GrammarNotFound { language: String },

    #[error("failed to parse {language} source: {message}")]
    ParseFailure { language: String, message: String },

    #[error("invalid query: {0}")]
    QuerySyntax(#[from] QuerySyntaxError),

    #[error("query was compiled for {query} but the file is {file}")]
    LanguageMismatch { query: String, file: String },

    #[error("grammar '{language}' could not be loaded: {message}")]
    InvalidGrammar { language: String, message: String },

    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML serialization error")]
    Yaml(#[from] serde_yaml::Error),
}

impl QueryError {
    pub fn parse_failure(language: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::ParseFailure {
            language: language.into(),
            message: message.into(),
        }
    }
}
