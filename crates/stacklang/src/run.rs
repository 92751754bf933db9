//! Public interface for compiling and running programs.

use std::fmt;

use crate::{
    bytecode::{CompileError, Compiler, Diagnostic, LoadError, Program, RunError, VM},
    io::{InputReader, PrintWriter, StdInput, StdPrint},
    parse::{ParseError, parse},
    tracer::VmTracer,
};

/// Error turning source or bytecode text into a runnable program.
#[derive(Debug)]
pub enum Error {
    /// The source did not parse; every syntax error found, in source order.
    Syntax(Vec<ParseError>),
    /// The source parsed but failed type checking.
    Compile(CompileError),
    /// Bytecode text or binary that could not be loaded.
    Load(LoadError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Self::Compile(err) => write!(f, "{err}"),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Self::Syntax(errors)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

/// Parses and compiles source code into bytecode.
///
/// Compilation only starts if the whole source parsed.
pub fn compile(code: &str) -> Result<Program, Error> {
    let tree = parse(code)?;
    Ok(Compiler::compile(&tree)?)
}

/// Like [`compile`], but hands each type error to `on_error` as soon as the
/// compiler finds it instead of only in the returned [`Error::Compile`].
pub fn compile_reporting(code: &str, mut on_error: impl FnMut(&Diagnostic)) -> Result<Program, Error> {
    let tree = parse(code)?;
    Ok(Compiler::compile_reporting(&tree, &mut on_error)?)
}

/// Primary interface for running programs.
///
/// A `Runner` holds a compiled program and can execute it any number of times,
/// each run starting from an empty stack and variable store.
///
/// # Example
/// ```
/// use stacklang::{CollectStringPrint, Runner, StringInput};
///
/// let runner = Runner::new("int x; read x; write x * 2;").unwrap();
/// let mut print = CollectStringPrint::new();
/// runner.run(&mut StringInput::new("21\n"), &mut print).unwrap();
/// assert_eq!(print.output(), "42\n");
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Runner {
    program: Program,
}

impl Runner {
    /// Compiles source code into a runner.
    ///
    /// # Errors
    /// Returns [`Error::Syntax`] or [`Error::Compile`] with every problem found.
    pub fn new(code: &str) -> Result<Self, Error> {
        compile(code).map(Self::from_program)
    }

    /// Loads a runner from bytecode text, one instruction per line.
    pub fn from_bytecode(text: &str) -> Result<Self, Error> {
        Ok(Self::from_program(Program::parse(text)?))
    }

    #[must_use]
    pub fn from_program(program: Program) -> Self {
        Self { program }
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Executes the program with the given input source and output sink.
    pub fn run(&self, input: &mut impl InputReader, print: &mut impl PrintWriter) -> Result<(), RunError> {
        VM::new(&self.program, print, input).run()
    }

    /// Executes the program, reporting to `tracer`, and hands the tracer back.
    pub fn run_traced<Tr: VmTracer>(
        &self,
        input: &mut impl InputReader,
        print: &mut impl PrintWriter,
        tracer: Tr,
    ) -> Result<Tr, RunError> {
        let mut vm = VM::with_tracer(&self.program, print, input, tracer);
        vm.run()?;
        Ok(vm.into_tracer())
    }

    /// Executes the program against stdin and stdout.
    pub fn run_stdio(&self) -> Result<(), RunError> {
        self.run(&mut StdInput, &mut StdPrint::new())
    }

    /// Serializes the runner to a binary format.
    ///
    /// The serialized data can be stored and later restored with `load()`,
    /// skipping parsing and compilation on subsequent runs.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserializes a runner from binary format.
    ///
    /// # Errors
    /// Returns an error if deserialization fails.
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
