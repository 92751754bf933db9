//! Bytecode virtual machine.
//!
//! A single fetch-execute loop over a loaded [`Program`] with one operand stack and
//! one flat variable store. Labels are resolved to instruction indices before
//! execution starts; a jump sets the program counter to the label's own index and
//! the `label` instruction there is a no-op.
//!
//! The VM trusts its program: stack underflow, jumps to undefined labels and loads
//! of unset variables are invariant violations and panic.

mod binary;
mod compare;

use std::{fmt, io};

use ahash::AHashMap;

use crate::{
    bytecode::{
        code::{Instruction, Program},
        op::Opcode,
    },
    io::{InputReader, PrintWriter},
    tracer::{NoopTracer, VmTracer},
    types::Type,
    value::Value,
};

/// A runtime error that stops execution.
#[derive(Debug)]
pub enum RunError {
    /// `read` got a line that does not parse as the requested type, or no line at all.
    InvalidInput { ty: Type, input: Option<String> },
    /// Integer or float division or modulo by zero.
    ZeroDivision,
    /// Writing output or reading input failed.
    Io(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { .. } => f.write_str("Invalid type"),
            Self::ZeroDivision => f.write_str("Division by zero"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RunError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// The virtual machine executing one program.
///
/// Generic over where `print` writes, where `read` reads from and the tracer, all
/// chosen at construction so unused hooks compile away.
pub struct VM<'a, P: PrintWriter, I: InputReader, Tr: VmTracer = NoopTracer> {
    program: &'a Program,

    /// Instruction index of every label, indexed by label id.
    labels: Vec<Option<usize>>,

    /// Operand stack.
    stack: Vec<Value>,

    /// Global variables, keyed by the names borrowed from the program.
    variables: AHashMap<&'a str, Value>,

    print_writer: &'a mut P,

    input: &'a mut I,

    tracer: Tr,
}

impl<'a, P: PrintWriter, I: InputReader> VM<'a, P, I> {
    /// Creates a VM without tracing.
    pub fn new(program: &'a Program, print_writer: &'a mut P, input: &'a mut I) -> Self {
        Self::with_tracer(program, print_writer, input, NoopTracer)
    }
}

impl<'a, P: PrintWriter, I: InputReader, Tr: VmTracer> VM<'a, P, I, Tr> {
    /// Creates a VM reporting execution events to `tracer`.
    pub fn with_tracer(program: &'a Program, print_writer: &'a mut P, input: &'a mut I, tracer: Tr) -> Self {
        Self {
            program,
            labels: resolve_labels(program),
            stack: Vec::with_capacity(program.max_stack_depth()),
            variables: AHashMap::new(),
            print_writer,
            input,
            tracer,
        }
    }

    /// Returns a reference to the tracer.
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// Consumes the VM and returns the tracer, e.g. to read a profiling report.
    pub fn into_tracer(self) -> Tr {
        self.tracer
    }

    /// Current value of a variable, `None` if it was never saved.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Number of values currently on the operand stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Executes the program from the first instruction until the program counter
    /// passes the last one.
    pub fn run(&mut self) -> Result<(), RunError> {
        let program = self.program;
        let instructions = program.instructions();
        let mut pc = 0;
        while let Some(ins) = instructions.get(pc) {
            self.tracer.on_instruction(pc, ins.opcode(), self.stack.len());
            pc = self.step(pc, ins)?;
        }
        self.print_writer.flush()?;
        Ok(())
    }

    /// Executes one instruction and returns the next program counter.
    fn step(&mut self, pc: usize, ins: &'a Instruction) -> Result<usize, RunError> {
        match ins {
            Instruction::Push(value) => self.push(value.clone()),
            Instruction::Load(name) => {
                let value = self
                    .variables
                    .get(name.as_str())
                    .unwrap_or_else(|| panic!("load of unset variable '{name}'"))
                    .clone();
                self.push(value);
            }
            Instruction::Save(name) => {
                let value = self.pop();
                self.variables.insert(name.as_str(), value);
            }
            Instruction::Label(_) => {}
            Instruction::Jmp(label) => return Ok(self.jump(pc, label.index())),
            Instruction::Fjmp(label) => {
                if !self.pop().as_bool() {
                    return Ok(self.jump(pc, label.index()));
                }
            }
            Instruction::Print(count) => self.print(*count)?,
            Instruction::Read(ty) => {
                let value = self.read(*ty)?;
                self.push(value);
            }
            Instruction::Simple(op) => self.simple(*op)?,
        }
        Ok(pc + 1)
    }

    fn simple(&mut self, op: Opcode) -> Result<(), RunError> {
        match op {
            Opcode::Pop => {
                self.pop();
            }
            Opcode::Uminus => {
                let value = match self.pop() {
                    Value::Int(i) => Value::Int(i.wrapping_neg()),
                    Value::Float(f) => Value::Float(-f),
                    other => panic!("uminus on {}", other.ty()),
                };
                self.push(value);
            }
            Opcode::Not => {
                let value = self.pop().as_bool();
                self.push(Value::Bool(!value));
            }
            Opcode::Itof => {
                let value = match self.pop() {
                    Value::Int(i) => Value::Float(i as f64),
                    float @ Value::Float(_) => float,
                    other => panic!("itof on {}", other.ty()),
                };
                self.push(value);
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => self.binary_arithmetic(op)?,
            Opcode::Concat => self.binary_concat(),
            Opcode::And | Opcode::Or => self.binary_logical(op),
            Opcode::Lt | Opcode::Gt => self.compare_order(op),
            Opcode::Eq => self.compare_eq(),
            Opcode::Push
            | Opcode::Load
            | Opcode::Save
            | Opcode::Label
            | Opcode::Jmp
            | Opcode::Fjmp
            | Opcode::Print
            | Opcode::Read => unreachable!("{op} carries an operand"),
        }
        Ok(())
    }

    fn jump(&mut self, from: usize, label: usize) -> usize {
        let to = self
            .labels
            .get(label)
            .copied()
            .flatten()
            .unwrap_or_else(|| panic!("jump to undefined label {label}"));
        self.tracer.on_jump(from, to);
        to
    }

    /// Pops `count` values and writes them, most recently pushed first, then a newline.
    fn print(&mut self, count: usize) -> Result<(), RunError> {
        self.tracer.on_print(count);
        for _ in 0..count {
            let value = self.pop();
            self.print_writer.stdout_write(value.print_str())?;
        }
        self.print_writer.stdout_push('\n')?;
        Ok(())
    }

    fn read(&mut self, ty: Type) -> Result<Value, RunError> {
        // prompts are not supported, but anything printed so far must be visible
        self.print_writer.flush()?;
        let Some(line) = self.input.read_line()? else {
            return Err(RunError::InvalidInput { ty, input: None });
        };
        Value::from_input(ty, &line).map_err(|_| RunError::InvalidInput { ty, input: Some(line) })
    }

    #[inline]
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    #[inline]
    fn pop(&mut self) -> Value {
        self.stack.pop().expect("stack underflow")
    }

    /// Pops the two operands of a binary instruction as `(lhs, rhs)`.
    #[inline]
    fn pop_pair(&mut self) -> (Value, Value) {
        let rhs = self.pop();
        let lhs = self.pop();
        (lhs, rhs)
    }
}

impl<P: PrintWriter, I: InputReader, Tr: VmTracer> fmt::Debug for VM<'_, P, I, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VM")
            .field("labels", &self.labels)
            .field("stack", &self.stack)
            .field("variables", &self.variables)
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

/// Maps each label id to the index of its `label` instruction.
///
/// The table grows to fit the largest id seen, so ids need not be dense.
fn resolve_labels(program: &Program) -> Vec<Option<usize>> {
    let mut labels = Vec::new();
    for (index, ins) in program.instructions().iter().enumerate() {
        if let Instruction::Label(label) = ins {
            let id = label.index();
            if labels.len() <= id {
                labels.resize(id + 1, None);
            }
            labels[id] = Some(index);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        io::{CollectStringPrint, StringInput},
        tracer::ProfilingTracer,
    };

    fn run_with_input(code: &str, input: &str) -> Result<String, RunError> {
        let program = Program::parse(code).unwrap();
        let mut print = CollectStringPrint::new();
        let mut input = StringInput::new(input);
        VM::new(&program, &mut print, &mut input).run()?;
        Ok(print.into_output())
    }

    fn run(code: &str) -> String {
        run_with_input(code, "").unwrap()
    }

    #[test]
    fn print_pops_top_first_without_separator() {
        assert_eq!(
            run("push string \"c\"\npush int 2\npush bool true\nprint 3\n"),
            "true2c\n"
        );
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(run("push int -7\npush int 2\ndiv\nprint 1\n"), "-4\n");
        assert_eq!(run("push int 7\npush int -2\nmod\nprint 1\n"), "-1\n");
    }

    #[test]
    fn float_division_is_true_division() {
        assert_eq!(run("push float 1.0\npush float 3.0\ndiv\nprint 1\n"), "0.333333\n");
        assert_eq!(run("push float 7.5\npush float 2.0\nmod\nprint 1\n"), "1.5\n");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = run_with_input("push int 1\npush int 0\ndiv\n", "").unwrap_err();
        assert!(matches!(err, RunError::ZeroDivision));
        let err = run_with_input("push float 1.0\npush float 0.0\nmod\n", "").unwrap_err();
        assert!(matches!(err, RunError::ZeroDivision));
    }

    #[test]
    fn logical_and_comparison() {
        assert_eq!(
            run("push bool true\npush bool false\nand\npush bool false\npush bool true\nor\nprint 2\n"),
            "truefalse\n"
        );
        assert_eq!(
            run("push string \"abc\"\npush string \"abd\"\nlt\npush int 2\npush float 2.0\neq\nprint 2\n"),
            "truetrue\n"
        );
    }

    #[test]
    fn unary_operators() {
        assert_eq!(
            run("push int 5\numinus\npush bool true\nnot\npush int 3\nitof\nprint 3\n"),
            "3.0false-5\n"
        );
    }

    #[test]
    fn fjmp_pops_and_jumps_on_false() {
        let code = "push bool false\nfjmp 0\npush int 1\nprint 1\nlabel 0\npush int 2\nprint 1\n";
        assert_eq!(run(code), "2\n");
    }

    #[test]
    fn loop_with_zero_iterations() {
        let code = "push int 5\nsave i\nlabel 0\nload i\npush int 3\nlt\nfjmp 1\nload i\nprint 1\njmp 0\nlabel 1\n";
        assert_eq!(run(code), "");
    }

    #[test]
    fn counting_loop_and_variables() {
        let code = "push int 0\nsave i\nlabel 0\nload i\npush int 3\nlt\nfjmp 1\nload i\nprint 1\nload i\npush int 1\nadd\nsave i\njmp 0\nlabel 1\n";
        let program = Program::parse(code).unwrap();
        let mut print = CollectStringPrint::new();
        let mut input = StringInput::default();
        let mut vm = VM::new(&program, &mut print, &mut input);
        vm.run().unwrap();
        assert_eq!(vm.variable("i"), Some(&Value::Int(3)));
        assert_eq!(vm.stack_depth(), 0);
        drop(vm);
        assert_eq!(print.output(), "0\n1\n2\n");
    }

    #[test]
    fn read_parses_each_type() {
        let code = "read int\nread float\nread bool\nread string\nprint 4\n";
        assert_eq!(run_with_input(code, "4\n2.5\nfalse\nhello there\n").unwrap(), "hello therefalse2.54\n");
    }

    #[test]
    fn read_rejects_malformed_or_missing_input() {
        let err = run_with_input("read int\n", "abc\n").unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidInput { ty: Type::Int, input: Some(ref line) } if line == "abc"
        ));
        assert_eq!(err.to_string(), "Invalid type");

        let err = run_with_input("read bool\n", "").unwrap_err();
        assert!(matches!(err, RunError::InvalidInput { ty: Type::Bool, input: None }));
    }

    #[test]
    fn labels_need_not_be_dense() {
        assert_eq!(run("jmp 7\npush int 1\nprint 1\nlabel 7\n"), "");
    }

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(
            run("push int 9223372036854775807\npush int 1\nadd\nprint 1\n"),
            "-9223372036854775808\n"
        );
    }

    #[test]
    fn tracer_sees_every_instruction() {
        let program = Program::parse("push int 1\nfjmp 0\nlabel 0\npush int 2\nprint 1\n").unwrap();
        let mut print = CollectStringPrint::new();
        let mut input = StringInput::default();
        let mut vm = VM::with_tracer(&program, &mut print, &mut input, ProfilingTracer::new());
        vm.run().unwrap();
        let report = vm.into_tracer().report();
        assert_eq!(report.total_instructions, 5);
        assert_eq!(report.total_jumps, 0);
        assert_eq!(report.max_stack_depth, 1);
    }

    #[test]
    #[should_panic(expected = "stack underflow")]
    fn underflow_is_an_invariant_violation() {
        run("add\n");
    }
}
