#![doc = include_str!("../../../README.md")]

mod bytecode;
mod expressions;
mod io;
mod parse;
mod run;
pub mod tracer;
mod types;
mod value;

pub use crate::{
    bytecode::{CompileError, Compiler, Diagnostic, Instruction, LabelId, LoadError, Opcode, Program, RunError, VM},
    expressions::{Expr, ExprLoc, ForClauses, Identifier, Literal, Node, Operator, SyntaxTree, UnaryOperator},
    io::{CollectStringPrint, InputReader, NoPrint, PrintWriter, StdInput, StdPrint, StringInput},
    parse::{CodeLoc, CodeRange, MAX_NESTING_DEPTH, ParseError, parse},
    run::{Error, Runner, compile, compile_reporting},
    tracer::{NoopTracer, ProfilingReport, ProfilingTracer, StderrTracer, VmTracer},
    types::Type,
    value::{FLOAT_PRINT_DECIMALS, InvalidLiteral, Value},
};
