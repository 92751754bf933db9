//! Fuzz target: parse and compile arbitrary source (no execution).
//!
//! Parsing and compilation must never panic, only return errors. Every program
//! that compiles must also survive a trip through its textual bytecode form.
//! Execution is left out since generated programs may loop forever.

#![no_main]

use libfuzzer_sys::fuzz_target;

use stacklang::{Program, compile};

fuzz_target!(|data: &[u8]| {
    let Ok(code) = std::str::from_utf8(data) else {
        return;
    };

    // Skip excessively large inputs.
    if code.len() > 8192 {
        return;
    }

    let Ok(program) = compile(code) else {
        return;
    };
    let reloaded = Program::parse(&program.to_string()).expect("compiled bytecode must reload");
    assert_eq!(reloaded, program);
});
