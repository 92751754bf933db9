//! Fuzz target: load arbitrary bytecode text and binary.
//!
//! The loaders are the only defensive layer in front of the VM, so they must
//! reject garbage with an error instead of panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use stacklang::Program;

fuzz_target!(|data: &[u8]| {
    let _ = Program::load(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(program) = Program::parse(text) {
        // whatever loads must print back to text that loads the same; compared as
        // text since `push float nan` never equals itself
        let text = program.to_string();
        let reprinted = Program::parse(&text).expect("printed bytecode must reload");
        assert_eq!(reprinted.to_string(), text);
    }
});
