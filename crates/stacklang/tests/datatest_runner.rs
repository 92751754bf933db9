//! File-driven end-to-end tests.
//!
//! Every `tests/programs/<name>.pjl` is compiled and run. Its sibling `<name>.out`
//! holds the expected output: the program's stdout when it compiles, or the
//! compiler's diagnostics when it doesn't. An optional `<name>.in` is fed as input.

use std::{fs, path::Path};

use pretty_assertions::assert_eq;
use stacklang::{CollectStringPrint, Runner, StringInput};

fn run_program(path: &Path) -> datatest_stable::Result<()> {
    let code = fs::read_to_string(path)?;
    let expected = fs::read_to_string(path.with_extension("out"))?;
    let input = fs::read_to_string(path.with_extension("in")).unwrap_or_default();

    let actual = match Runner::new(&code) {
        Ok(runner) => {
            let mut print = CollectStringPrint::new();
            match runner.run(&mut StringInput::new(&input), &mut print) {
                Ok(()) => print.into_output(),
                Err(err) => format!("{}Error: {err}\n", print.output()),
            }
        }
        Err(err) => format!("{err}\n"),
    };
    assert_eq!(actual, expected, "output of {}", path.display());
    Ok(())
}

datatest_stable::harness!(run_program, "tests/programs", r"^.*\.pjl$");
