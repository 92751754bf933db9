//! Tests for binary serialization and deserialization of `Runner` and `Program`.
//!
//! A compiled program can be cached with postcard to skip parsing and compilation.

use stacklang::{CollectStringPrint, Program, Runner, StringInput};

#[test]
fn runner_dump_load() {
    let runner = Runner::new("float f; f = 1 + 0.5; write f;").unwrap();
    let bytes = runner.dump().unwrap();
    let loaded = Runner::load(&bytes).unwrap();
    assert_eq!(loaded, runner);

    let mut print = CollectStringPrint::new();
    loaded.run(&mut StringInput::default(), &mut print).unwrap();
    assert_eq!(print.output(), "1.5\n");
}

#[test]
fn program_dump_load_preserves_instructions() {
    let runner = Runner::new("string s; s = \"with  spaces\"; if (s == \"\") write 1; else write s;").unwrap();
    let program = runner.program();
    let loaded = Program::load(&program.dump().unwrap()).unwrap();
    assert_eq!(loaded.to_string(), program.to_string());
    assert_eq!(loaded.max_stack_depth(), program.max_stack_depth());
}

#[test]
fn corrupt_bytes_are_rejected() {
    assert!(Program::load(&[0xff, 0xff, 0xff]).is_err());
}
