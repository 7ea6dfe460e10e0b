use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const FIXTURE_DIR: &str = "tests/fixtures";

fn run_codequery(args: &[&str]) -> (String, String, bool) {
    let bin = env!("CARGO_BIN_EXE_codequery");
    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to run codequery");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (stdout, stderr, output.status.success())
}

fn run_ok(args: &[&str]) -> String {
    let (stdout, stderr, success) = run_codequery(args);
    assert!(success, "codequery failed: {}", stderr);
    stdout
}

fn run_err(args: &[&str]) -> String {
    let (_, stderr, success) = run_codequery(args);
    assert!(!success, "codequery unexpectedly succeeded");
    stderr
}

fn write_file(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn test_query_prints_yaml() {
    let output = run_ok(&[
        "-w",
        FIXTURE_DIR,
        "sample.js",
        "(function_declaration name: (identifier) @name)",
    ]);
    assert!(output.starts_with("- name:"), "{}", output);
    assert!(output.contains("text: getName"));
    assert!(output.contains("text: setName"));
    assert!(output.contains("kind: identifier"));
}

#[test]
fn test_query_prints_json() {
    let output = run_ok(&[
        "--workspace",
        FIXTURE_DIR,
        "--json",
        "sample.py",
        "(class_definition name: (identifier) @name) @class",
    ]);
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["name"]["text"], "Config");
    assert_eq!(value[0]["class"]["start"]["line"], 5);
}

#[test]
fn test_sentinels() {
    let missing = run_ok(&["-w", FIXTURE_DIR, "nope.rs", "(function_item) @f"]);
    assert_eq!(missing, "<file_not_found>\n");

    let none = run_ok(&["-w", FIXTURE_DIR, "sample.rs", "(union_item) @u"]);
    assert_eq!(none, "<no_match_found>\n");
}

#[test]
fn test_empty_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "empty.rs", "");
    let output = run_ok(&[
        "-w",
        dir.path().to_str().unwrap(),
        "empty.rs",
        "(function_item) @f",
    ]);
    assert_eq!(output, "<file_not_found>\n");
}

#[test]
fn test_query_file() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir,
        "calls.scm",
        "; calls to a bare identifier\n(call_expression function: (identifier) @f)\n",
    );
    write_file(&dir, "app.js", "function foo() { bar(); }\n");
    let query = dir.path().join("calls.scm");
    let output = run_ok(&[
        "-w",
        dir.path().to_str().unwrap(),
        "--query-file",
        query.to_str().unwrap(),
        "app.js",
    ]);
    assert!(output.contains("text: bar"), "{}", output);
}

#[test]
fn test_preset() {
    let output = run_ok(&["-w", FIXTURE_DIR, "--preset", "functions", "sample.rs"]);
    for name in ["new", "greeting", "fmt", "index", "main"] {
        assert!(output.contains(&format!("text: {}", name)), "missing {}", name);
    }

    let stderr = run_err(&["-w", FIXTURE_DIR, "--preset", "nope", "sample.rs"]);
    assert!(stderr.contains("unknown preset 'nope'"), "{}", stderr);
    assert!(stderr.contains("functions"));
}

#[test]
fn test_language_override() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "Makefile.inc", "def build():\n    run()\n");
    let root = dir.path().to_str().unwrap();

    let stderr = run_err(&["-w", root, "Makefile.inc", "(call) @c"]);
    assert!(stderr.contains("cannot process this file type"), "{}", stderr);

    let output = run_ok(&["-w", root, "-l", "python", "Makefile.inc", "(call) @c"]);
    assert!(output.contains("text: run()"), "{}", output);
}

#[test]
fn test_invalid_query_fails() {
    let stderr = run_err(&["-w", FIXTURE_DIR, "sample.py", "(call macro: (identifier))"]);
    assert!(stderr.starts_with("Error: invalid query"), "{}", stderr);
    assert!(stderr.contains("macro"));

    let stderr = run_err(&["-w", FIXTURE_DIR, "sample.js", "(call_expression"]);
    assert!(stderr.contains("unexpected end of query"), "{}", stderr);
}

#[test]
fn test_missing_file_fails() {
    let stderr = run_err(&["-w", FIXTURE_DIR]);
    assert!(stderr.contains("required"), "{}", stderr);
    assert!(stderr.contains("<FILE>"), "{}", stderr);

    // subcommands do not need FILE
    run_ok(&["grammar"]);
}

#[test]
fn test_missing_query_fails() {
    let stderr = run_err(&["-w", FIXTURE_DIR, "sample.js"]);
    assert!(stderr.contains("QUERY"), "{}", stderr);
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_tool(args: &[&str], request: &str) -> (String, bool) {
    let bin = env!("CARGO_BIN_EXE_codequery");
    let mut child = Command::new(bin)
        .arg("tool")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run codequery");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(request.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    (String::from_utf8(output.stdout).unwrap(), output.status.success())
}

#[test]
fn test_tool_reads_request_from_stdin() {
    let (stdout, success) = run_tool(
        &["-w", FIXTURE_DIR, "--json"],
        r#"{"filename": "sample.ts", "query": "(interface_declaration name: (_) @name)"}"#,
    );
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value[0]["name"]["text"], "Shape");

    let (stdout, success) = run_tool(
        &["-w", FIXTURE_DIR],
        r#"{"filename": "gone.ts", "query": "(identifier) @i"}"#,
    );
    assert!(success);
    assert_eq!(stdout, "<file_not_found>\n");

    let (_, success) = run_tool(&["-w", FIXTURE_DIR], "not json");
    assert!(!success);
}

#[test]
fn test_grammar_lists_languages() {
    let output = run_ok(&["grammar"]);
    for language in ["rust", "typescript", "tsx", "javascript", "python"] {
        assert!(
            output.lines().any(|l| l.starts_with(language)),
            "missing {}",
            language
        );
    }
}

#[test]
fn test_grammar_lists_kinds_and_fields() {
    let output = run_ok(&["grammar", "rs"]);
    assert!(output.lines().any(|l| l == "function_item"));
    assert!(output.lines().any(|l| l == "_expression (supertype)"));
    assert!(output.lines().any(|l| l == r#"token: "fn""#), "{}", output);
    assert!(output.contains("preset: functions"));

    let output = run_ok(&["grammar", "python", "call"]);
    assert!(output.contains("field: function"));
    assert!(output.contains("field: arguments"));

    let stderr = run_err(&["grammar", "python", "call_expression"]);
    assert!(stderr.contains("unknown node kind 'call_expression'"), "{}", stderr);
}
