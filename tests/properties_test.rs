use codequery::languages::javascript;
use codequery::parser::parse;
use codequery::{compile, execute, output, GrammarRegistry};
use proptest::prelude::*;
use std::path::Path;

/// One statement per entry: a call to `f{name}` wrapping `depth` nested
/// calls to `g`, so the program holds `1 + depth` call expressions.
fn program(statements: &[(u8, u8)]) -> (String, usize) {
    let mut source = String::new();
    let mut calls = 0;
    for (name, depth) in statements {
        let depth = usize::from(*depth);
        source.push_str(&format!("f{}(", name));
        source.push_str(&"g(".repeat(depth));
        source.push('x');
        source.push_str(&")".repeat(depth));
        source.push_str(");\n");
        calls += 1 + depth;
    }
    (source, calls)
}

fn statements() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..5, 0u8..4), 0..8)
}

proptest! {
    #[test]
    fn execute_is_deterministic(statements in statements()) {
        let grammar = javascript::grammar().unwrap();
        let (source, _) = program(&statements);
        let tree = parse(&source, &grammar).unwrap();
        let query = compile("(call_expression function: (identifier) @f) @call", &grammar).unwrap();
        prop_assert_eq!(execute(&tree, &query), execute(&tree, &query));
    }

    #[test]
    fn every_call_is_found_in_preorder(statements in statements()) {
        let grammar = javascript::grammar().unwrap();
        let (source, calls) = program(&statements);
        let tree = parse(&source, &grammar).unwrap();
        let query = compile("(call_expression) @call", &grammar).unwrap();
        let result = execute(&tree, &query);
        prop_assert_eq!(result.len(), calls);
        let anchors: Vec<_> = result.iter().map(|set| set.anchor).collect();
        prop_assert!(anchors.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn capture_sets_carry_every_declared_capture(statements in statements()) {
        let grammar = javascript::grammar().unwrap();
        let (source, _) = program(&statements);
        let tree = parse(&source, &grammar).unwrap();
        let query = compile(
            "(call_expression function: (identifier) @f arguments: (arguments (call_expression)? @inner)) @call",
            &grammar,
        )
        .unwrap();
        for set in execute(&tree, &query).iter() {
            prop_assert_eq!(set.captures.len(), 3);
            prop_assert!(set.get("f").is_some());
            prop_assert!(set.get("call").is_some());
        }
    }

    #[test]
    fn formatted_text_is_the_source_slice(statements in statements()) {
        let grammar = javascript::grammar().unwrap();
        let (source, _) = program(&statements);
        let tree = parse(&source, &grammar).unwrap();
        let query = compile("(call_expression function: (_) @f arguments: (_) @args)", &grammar).unwrap();
        let formatted = output::format(&execute(&tree, &query), &source);
        for fragment in formatted.iter().flat_map(|m| m.values()).flatten() {
            prop_assert_eq!(&fragment.text, &source[fragment.start_byte..fragment.end_byte]);
            prop_assert!(fragment.start.line >= 1 && fragment.start.column >= 1);
        }
    }

    #[test]
    fn child_spans_nest_inside_parents(source in "\\PC{0,200}") {
        let grammar = javascript::grammar().unwrap();
        let tree = parse(&source, &grammar).unwrap();
        for id in tree.preorder() {
            let node = tree.node(id);
            for child in tree.children(id) {
                let child = tree.node(child);
                prop_assert!(node.start_byte <= child.start_byte);
                prop_assert!(child.end_byte <= node.end_byte);
            }
        }
    }

    #[test]
    fn compile_never_panics(query in "\\PC{0,80}") {
        let grammar = javascript::grammar().unwrap();
        let _ = compile(&query, &grammar);
    }

    #[test]
    fn supported_files_resolve_to_a_grammar(path in "[a-z]{1,10}\\.[a-z]{1,4}") {
        let registry = GrammarRegistry::builtin().unwrap();
        let path = Path::new(&path);
        prop_assert_eq!(
            registry.is_supported_file(path),
            registry.grammar_for_path(path).is_ok()
        );
        if let Ok(grammar) = registry.grammar_for_path(path) {
            prop_assert_eq!(registry.detect_language(path), Some(grammar.name()));
        }
    }
}
