use stacklang::{CollectStringPrint, Runner, StringInput};

/// Test a runner can execute repeatedly, each run starting from fresh state.
#[test]
fn repeat_run() {
    let runner = Runner::new("int n; read n; n = n + 1; write n;").unwrap();

    for (input, expected) in [("1\n", "2\n"), ("41\n", "42\n")] {
        let mut print = CollectStringPrint::new();
        runner.run(&mut StringInput::new(input), &mut print).unwrap();
        assert_eq!(print.output(), expected);
    }
}

#[test]
fn input_is_consumed_line_by_line() {
    let runner = Runner::new("string a, b; read a; read b; write b, a;").unwrap();
    let mut input = StringInput::new("x\ny\nunused\n");
    let mut print = CollectStringPrint::new();
    runner.run(&mut input, &mut print).unwrap();
    assert_eq!(print.output(), "yx\n");
    assert_eq!(input.remaining(), 1);
}
