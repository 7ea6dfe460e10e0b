use clap::{Parser, Subcommand};
use codequery::languages::Grammar;
use codequery::{
    logging, CodeQueryTool, FsWorkspace, GrammarRegistry, OutputFormat, QueryError, QueryService,
    ToolRequest,
};
use std::fmt::Write;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::{fs, process};

#[derive(Parser)]
#[command(name = "codequery")]
#[command(about = "Structural code search with tree-sitter queries", long_about = None, version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File to search, relative to the workspace
    #[arg(value_name = "FILE", required = true)]
    file: Option<String>,

    /// Query in tree-sitter syntax
    #[arg(value_name = "QUERY", conflicts_with_all = ["query_file", "preset"])]
    query: Option<String>,

    /// Read the query from a file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    query_file: Option<PathBuf>,

    /// Use a canned query of the file's language (see `grammar LANG`)
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Parse as this language instead of detecting it from the extension
    #[arg(short, long)]
    language: Option<String>,

    /// Directory file paths are resolved against
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// JSON output instead of YAML
    #[arg(long)]
    json: bool,

    /// Log filter, e.g. `debug` (default: RUST_LOG, else warn)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one JSON request `{"filename": ..., "query": ...}` read from stdin
    Tool {
        /// Directory file paths are resolved against
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,

        /// JSON output instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// List languages, the node kinds and tokens of a language, or the fields of a kind
    Grammar {
        /// Language tag or alias
        language: Option<String>,

        /// Node kind to describe
        kind: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let result = match (cli.command, cli.file) {
        (Some(Commands::Tool { workspace, json }), _) => handle_tool(workspace, json),
        (Some(Commands::Grammar { language, kind }), _) => {
            handle_grammar(language.as_deref(), kind.as_deref())
        }
        (None, Some(file)) => handle_query(
            &file,
            cli.query,
            cli.query_file,
            cli.preset,
            cli.language,
            cli.workspace,
            cli.json,
        ),
        // FILE is required unless a subcommand is given
        (None, None) => unreachable!(),
    };

    match result {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    }
}

fn handle_query(
    file: &str,
    query: Option<String>,
    query_file: Option<PathBuf>,
    preset: Option<String>,
    language: Option<String>,
    workspace: PathBuf,
    json: bool,
) -> Result<String, String> {
    let service = QueryService::builtin().map_err(|e| e.to_string())?;

    let query = match (query, query_file, preset) {
        (Some(query), _, _) => query,
        (None, Some(path), _) => fs::read_to_string(&path)
            .map_err(|e| {
                QueryError::ReadError {
                    path: path.display().to_string(),
                    source: e,
                }
                .to_string()
            })?,
        (None, None, Some(name)) => {
            let grammar = match &language {
                Some(language) => service.grammar(language),
                None => service.registry().grammar_for_path(Path::new(file)),
            }
            .map_err(|e| e.to_string())?;
            preset_query(grammar.as_ref(), &name)?.to_string()
        }
        (None, None, None) => {
            return Err("a QUERY, --query-file or --preset is required".to_string())
        }
    };

    let mut tool =
        CodeQueryTool::new(FsWorkspace::new(workspace), service).with_format(output_format(json));
    if let Some(language) = language {
        tool = tool.with_language(language);
    }
    tool.invoke(&ToolRequest::new(file, query))
        .map_err(|e| e.to_string())
}

fn preset_query<'g>(grammar: &'g dyn Grammar, name: &str) -> Result<&'g str, String> {
    grammar
        .presets()
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, query)| *query)
        .ok_or_else(|| {
            let known: Vec<&str> = grammar.presets().iter().map(|(p, _)| *p).collect();
            format!(
                "unknown preset '{}' for {} (available: {})",
                name,
                grammar.name(),
                known.join(", ")
            )
        })
}

fn handle_tool(workspace: PathBuf, json: bool) -> Result<String, String> {
    let mut request = String::new();
    io::stdin()
        .read_to_string(&mut request)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    let service = QueryService::builtin().map_err(|e| e.to_string())?;
    CodeQueryTool::new(FsWorkspace::new(workspace), service)
        .with_format(output_format(json))
        .invoke_json(&request)
        .map_err(|e| e.to_string())
}

fn handle_grammar(language: Option<&str>, kind: Option<&str>) -> Result<String, String> {
    let registry = GrammarRegistry::builtin().map_err(|e| e.to_string())?;
    let mut out = String::new();

    let Some(language) = language else {
        for grammar in registry.languages() {
            let mut tags: Vec<&str> = grammar.aliases().to_vec();
            tags.extend(grammar.extensions().iter().copied());
            tags.sort_unstable();
            tags.dedup();
            let _ = writeln!(out, "{}\t{}", grammar.name(), tags.join(" "));
        }
        return Ok(out);
    };

    let grammar = registry.grammar_for(language).map_err(|e| e.to_string())?;
    let types = grammar.node_types();

    let Some(kind) = kind else {
        for kind in types.named_kinds() {
            let marker = if types.is_supertype(kind) { " (supertype)" } else { "" };
            let _ = writeln!(out, "{}{}", kind, marker);
        }
        for token in types.tokens() {
            let _ = writeln!(out, "token: {:?}", token);
        }
        for (name, _) in grammar.presets() {
            let _ = writeln!(out, "preset: {}", name);
        }
        return Ok(out);
    };

    let info = types
        .kind(kind)
        .ok_or_else(|| format!("unknown node kind '{}' for {}", kind, grammar.name()))?;
    if info.is_supertype() {
        for subtype in types.expand(kind).iter().filter(|k| k.as_str() != kind) {
            let _ = writeln!(out, "subtype: {}", subtype);
        }
    }
    for field in &info.fields {
        let _ = writeln!(out, "field: {}", field);
    }
    Ok(out)
}
