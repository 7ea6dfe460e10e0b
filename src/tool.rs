//! The `code_query` tool: a `{filename, query}` request answered with
//! encoded matches or one of two sentinels.

use crate::error::QueryError;
use crate::output::{encode, OutputFormat};
use crate::service::{QueryOutcome, QueryService, SourceFile};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const TOOL_NAME: &str = "code_query";
pub const TOOL_DESCRIPTION: &str = "Uses tree-sitter to query code";

/// Returned when the workspace has no content for the requested file.
pub const FILE_NOT_FOUND: &str = "<file_not_found>";
/// Returned when the query ran but matched nothing.
pub const NO_MATCH_FOUND: &str = "<no_match_found>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Path of the file to search, relative to the workspace.
    pub filename: String,
    /// Query in tree-sitter syntax.
    pub query: String,
}

impl ToolRequest {
    pub fn new(filename: impl Into<String>, query: impl Into<String>) -> Self {
        ToolRequest {
            filename: filename.into(),
            query: query.into(),
        }
    }

    /// JSON schema of the request parameters.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Path of the file to search, relative to the workspace."
                },
                "query": {
                    "type": "string",
                    "description": "code query using tree-sitter syntax"
                }
            },
            "required": ["filename", "query"]
        })
    }
}

/// Source of file contents for the tool.
pub trait WorkspaceReader {
    /// `Ok(None)` when the file does not exist.
    fn read_text(&self, filename: &str) -> Result<Option<String>, QueryError>;
}

/// Reads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsWorkspace { root: root.into() }
    }

    /// Path of `filename` under the root, or `None` when it is absolute or
    /// climbs out of the root with `..`.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let relative = Path::new(filename);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl WorkspaceReader for FsWorkspace {
    fn read_text(&self, filename: &str) -> Result<Option<String>, QueryError> {
        let Some(path) = self.resolve(filename) else {
            debug!(filename, "path leaves the workspace");
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| QueryError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        String::from_utf8(bytes).map(Some).map_err(|e| {
            let language = path.extension().and_then(|ext| ext.to_str()).unwrap_or("unknown");
            QueryError::parse_failure(language, format!("{} is not valid UTF-8: {}", filename, e))
        })
    }
}

pub struct CodeQueryTool<R> {
    reader: R,
    service: QueryService,
    format: OutputFormat,
    language: Option<String>,
}

impl<R: WorkspaceReader> CodeQueryTool<R> {
    pub fn new(reader: R, service: QueryService) -> Self {
        CodeQueryTool {
            reader,
            service,
            format: OutputFormat::default(),
            language: None,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Parse every file as `language` instead of detecting it from the
    /// file extension.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn invoke(&self, request: &ToolRequest) -> Result<String, QueryError> {
        let content = match self.reader.read_text(&request.filename)? {
            Some(content) if !content.is_empty() => content,
            _ => {
                debug!(filename = %request.filename, "file not found");
                return Ok(FILE_NOT_FOUND.to_string());
            }
        };

        let file = match &self.language {
            Some(language) => SourceFile::new(&request.filename, language.as_str(), content),
            None => SourceFile::detect(self.service.registry(), &request.filename, content)?,
        };

        match self.service.run(&file, &request.query)? {
            QueryOutcome::Matches(result) => encode(&result, self.format),
            QueryOutcome::NoMatch => Ok(NO_MATCH_FOUND.to_string()),
        }
    }

    /// Decode a JSON request and invoke the tool with it.
    pub fn invoke_json(&self, request: &str) -> Result<String, QueryError> {
        let request: ToolRequest = serde_json::from_str(request)?;
        self.invoke(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemoryWorkspace(HashMap<&'static str, &'static str>);

    impl WorkspaceReader for MemoryWorkspace {
        fn read_text(&self, filename: &str) -> Result<Option<String>, QueryError> {
            Ok(self.0.get(filename).map(|s| s.to_string()))
        }
    }

    fn tool() -> CodeQueryTool<MemoryWorkspace> {
        let files = HashMap::from([
            ("app.js", "function foo() { bar(); }"),
            ("empty.js", ""),
            ("script", "print('hi')\n"),
        ]);
        CodeQueryTool::new(MemoryWorkspace(files), QueryService::builtin().unwrap())
    }

    #[test]
    fn missing_and_empty_files_are_not_found() {
        let tool = tool();
        let missing = tool
            .invoke(&ToolRequest::new("nope.js", "(call_expression) @c"))
            .unwrap();
        assert_eq!(missing, FILE_NOT_FOUND);
        let empty = tool
            .invoke(&ToolRequest::new("empty.js", "(call_expression) @c"))
            .unwrap();
        assert_eq!(empty, FILE_NOT_FOUND);
    }

    #[test]
    fn no_match_sentinel_differs_from_not_found() {
        let output = tool()
            .invoke(&ToolRequest::new("app.js", "(class_declaration) @c"))
            .unwrap();
        assert_eq!(output, NO_MATCH_FOUND);
        assert_ne!(NO_MATCH_FOUND, FILE_NOT_FOUND);
    }

    #[test]
    fn matches_are_yaml_by_default() {
        let output = tool()
            .invoke(&ToolRequest::new("app.js", "(call_expression) @call"))
            .unwrap();
        assert!(output.starts_with("- call:"));
        assert!(output.contains("text: bar()"));
    }

    #[test]
    fn json_format_and_json_requests() {
        let tool = tool().with_format(OutputFormat::Json);
        let output = tool
            .invoke_json(r#"{"filename": "app.js", "query": "(call_expression) @call"}"#)
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["call"]["text"], "bar()");

        assert!(matches!(
            tool.invoke_json(r#"{"filename": "app.js"}"#),
            Err(QueryError::Serialization(_))
        ));
    }

    #[test]
    fn language_override_handles_files_without_extension() {
        let request = ToolRequest::new("script", "(call) @call");
        assert!(matches!(
            tool().invoke(&request),
            Err(QueryError::GrammarNotFound { .. })
        ));
        let output = tool().with_language("python").invoke(&request).unwrap();
        assert!(output.contains("kind: call"));
    }

    #[test]
    fn invalid_query_is_an_error_not_a_sentinel() {
        let err = tool()
            .invoke(&ToolRequest::new("app.js", "(not_a_kind) @x"))
            .unwrap_err();
        assert!(err.to_string().contains("not_a_kind"));
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = ToolRequest::schema();
        assert_eq!(schema["required"], json!(["filename", "query"]));
    }

    #[test]
    fn fs_workspace_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
        let workspace = FsWorkspace::new(dir.path());
        assert!(workspace.read_text("a.py").unwrap().is_some());
        assert!(workspace.read_text("b.py").unwrap().is_none());
        // a directory is not a readable file
        assert!(workspace.read_text(".").unwrap().is_none());
        assert!(workspace.read_text("./a.py").unwrap().is_some());
    }

    #[test]
    fn fs_workspace_rejects_paths_outside_root() {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join("secret.py"), "x = 1\n").unwrap();
        fs::create_dir(outer.path().join("ws")).unwrap();
        let workspace = FsWorkspace::new(outer.path().join("ws"));

        assert!(workspace.read_text("../secret.py").unwrap().is_none());
        let absolute = outer.path().join("secret.py");
        assert!(workspace
            .read_text(absolute.to_str().unwrap())
            .unwrap()
            .is_none());

        let tool = CodeQueryTool::new(workspace, QueryService::builtin().unwrap());
        let output = tool
            .invoke(&ToolRequest::new("../secret.py", "(identifier) @i"))
            .unwrap();
        assert_eq!(output, FILE_NOT_FOUND);
    }

    #[test]
    fn fs_workspace_invalid_utf8_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), b"x = '\xff\xfe'\n").unwrap();
        let workspace = FsWorkspace::new(dir.path());
        assert!(matches!(
            workspace.read_text("a.py"),
            Err(QueryError::ParseFailure { ref language, .. }) if language == "py"
        ));

        let tool = CodeQueryTool::new(workspace, QueryService::builtin().unwrap());
        let err = tool
            .invoke(&ToolRequest::new("a.py", "(identifier) @i"))
            .unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"), "{}", err);
    }
}
