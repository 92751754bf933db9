//! Bytecode representation, compiler and virtual machine.
//!
//! # Module Structure
//!
//! - `op` - Opcode enum definitions
//! - `code` - Instructions and programs, with their text and binary forms
//! - `builder` - CodeBuilder for emitting bytecode and applying deferred conversions
//! - `compiler` - Syntax tree to bytecode compiler with type checking
//! - `vm` - Virtual machine for bytecode execution

pub use code::{Instruction, LabelId, LoadError, Program};
pub use compiler::{CompileError, Compiler, Diagnostic};
pub use op::Opcode;
pub use vm::{RunError, VM};

mod builder;
mod code;
mod compiler;
mod op;
mod vm;
