use pretty_assertions::assert_eq;
use stacklang::{MAX_NESTING_DEPTH, parse};

fn messages(code: &str) -> Vec<String> {
    parse(code)
        .expect_err("expected syntax errors")
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn empty_source_is_an_empty_program() {
    assert!(parse("").unwrap().body.is_empty());
    assert!(parse("  // only a comment\n").unwrap().body.is_empty());
}

#[test]
fn errors_in_separate_statements_are_all_reported() {
    assert_eq!(
        messages("int ;\nwrite 1\nread 5;"),
        [
            "Syntax error at line 1 mismatched input ';' expecting an identifier",
            "Syntax error at line 3 mismatched input 'read' expecting ';'",
        ]
    );
}

#[test]
fn recovery_inside_blocks() {
    assert_eq!(
        messages("{\n  write ;\n  write 1;\n}\nwrite )"),
        [
            "Syntax error at line 2 mismatched input ';' expecting an expression",
            "Syntax error at line 5 mismatched input ')' expecting an expression",
        ]
    );
}

#[test]
fn unterminated_string_is_reported() {
    let errors = messages("write \"open;\n");
    assert!(errors[0].starts_with("Syntax error at line 1"), "{errors:?}");
}

#[test]
fn deeply_nested_expressions_are_rejected() {
    let depth = usize::from(MAX_NESTING_DEPTH) + 10;
    let code = format!("write {}1{};", "(".repeat(depth), ")".repeat(depth));
    let errors = messages(&code);
    assert!(
        errors.iter().any(|e| e.contains("too many nested")),
        "{errors:?}"
    );
}

#[test]
fn long_operator_chains_are_rejected() {
    let code = format!("int a; a = 1{};", " + 1".repeat(3000));
    let errors = messages(&code);
    assert!(
        errors.iter().any(|e| e.contains("too many nested")),
        "{errors:?}"
    );
}

#[test]
fn operator_chains_within_the_limit_parse() {
    let terms = usize::from(MAX_NESTING_DEPTH) / 2;
    let code = format!("int a; a = 1{}; write a * 2 - 1 % 3;", " + 1".repeat(terms));
    assert_eq!(parse(&code).unwrap().body.len(), 3);
}
