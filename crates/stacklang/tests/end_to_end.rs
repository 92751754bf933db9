//! Compile-and-run tests through the public API.

use pretty_assertions::assert_eq;
use stacklang::{CollectStringPrint, Error, MAX_NESTING_DEPTH, Opcode, Program, Runner, StringInput, compile};

fn run(code: &str, input: &str) -> String {
    let runner = Runner::new(code).unwrap_or_else(|err| panic!("compile failed:\n{err}"));
    let mut print = CollectStringPrint::new();
    runner.run(&mut StringInput::new(input), &mut print).unwrap();
    print.into_output()
}

fn diagnostics(code: &str) -> Vec<String> {
    match compile(code) {
        Err(Error::Compile(err)) => err.diagnostics.iter().map(ToString::to_string).collect(),
        other => panic!("expected compile errors, got {other:?}"),
    }
}

#[test]
fn promoted_sum_prints_as_float() {
    let program = compile("float x; x = 3 + 2.0; write x;").unwrap();
    assert_eq!(program.count(Opcode::Itof), 1);
    let ins = program.to_string();
    assert!(ins.contains("push int 3\nitof\npush float 2.0\nadd\n"), "{ins}");
    assert_eq!(run("float x; x = 3 + 2.0; write x;", ""), "5.0\n");
}

#[test]
fn promoted_sum_cannot_be_stored_into_an_int() {
    assert_eq!(
        diagnostics("int x; x = 3 + 2.0; write x;"),
        ["Error at line 1 can't store float into int variable"]
    );
}

#[test]
fn long_operator_chain_is_a_syntax_error_not_a_crash() {
    let code = format!("int a; a = 1{}; write a;", " + 1".repeat(3000));
    assert!(matches!(compile(&code), Err(Error::Syntax(_))));
}

#[test]
fn operator_chain_below_the_nesting_limit_runs() {
    let terms = usize::from(MAX_NESTING_DEPTH) / 2;
    let code = format!("int a; a = 1{}; write a;", " + 1".repeat(terms));
    assert_eq!(run(&code, ""), format!("{}\n", terms + 1));
}

#[test]
fn programs_without_mixing_have_no_conversions() {
    let program = compile("int a; string s; a = 2 * (3 + 4) % 5; s = \"x\" . \"y\"; write a == 4, s;").unwrap();
    assert_eq!(program.count(Opcode::Itof), 0);
}

#[test]
fn each_mixed_operation_converts_exactly_once() {
    for code in ["write 1 + 2.0;", "write 1.0 + 2;", "write (1 + 2) * 3.0;", "write 1.5 > -(2 * 3);"] {
        let program = compile(code).unwrap();
        assert_eq!(program.count(Opcode::Itof), 1, "{code}");
    }
}

#[test]
fn write_prints_values_in_source_order() {
    assert_eq!(run("write 1, \" \", 2.5, \" \", true, \" \", \"s\";", ""), "1 2.5 true s\n");
}

#[test]
fn floor_division_and_float_rounding() {
    assert_eq!(run("write -7 / 2; write 1.0 / 3.0; write 5.0;", ""), "-4\n0.333333\n5.0\n");
}

#[test]
fn logical_operators() {
    assert_eq!(run("write true && false, \" \", false || true;", ""), "false true\n");
}

#[test]
fn loops_that_never_run() {
    assert_eq!(
        run("int i; while (false) write 1; for (i = 0; i > 0; i = i - 1) write i; write \"done\";", ""),
        "done\n"
    );
}

#[test]
fn read_then_compute() {
    assert_eq!(
        run("int n, i, acc; read n; for (i = 1; i < n + 1; i = i + 1) acc = acc + i; write acc;", "10\n"),
        "55\n"
    );
}

#[test]
fn redeclaration_produces_no_program() {
    assert_eq!(
        diagnostics("int a;\nint b;\nbool a;"),
        ["Error at line 3 Variable a was already declared"]
    );
}

#[test]
fn use_before_declaration_produces_no_program() {
    assert_eq!(
        diagnostics("write x;\nint x;"),
        ["Error at line 1 Variable x was not declared"]
    );
}

#[test]
fn every_independent_error_is_reported() {
    assert_eq!(
        diagnostics("int a;\na = \"s\";\nwrite a && true;\nwhile (a) ;"),
        [
            "Error at line 2 can't store string into int variable",
            "Error at line 3 && is not supported for int and bool",
            "Error at line 4 Condition must be bool, not int",
        ]
    );
}

#[test]
fn syntax_errors_stop_before_compilation() {
    // the undeclared variable would be a compile error, but parsing fails first
    match compile("write y\nwrite 1;") {
        Err(Error::Syntax(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].to_string(), "Syntax error at line 2 mismatched input 'write' expecting ';'");
        }
        other => panic!("expected syntax errors, got {other:?}"),
    }
}

#[test]
fn bytecode_text_round_trips_through_the_loader() {
    let program = compile("string s; int i; for (; i < 3; i = i + 1) s = s . \"ab\"; write s;").unwrap();
    let reloaded = Program::parse(&program.to_string()).unwrap();
    assert_eq!(reloaded, program);
    let mut print = CollectStringPrint::new();
    Runner::from_program(reloaded)
        .run(&mut StringInput::default(), &mut print)
        .unwrap();
    assert_eq!(print.output(), "ababab\n");
}
