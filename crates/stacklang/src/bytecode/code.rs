//! Instructions and programs: the wire format between the compiler and the VM.
//!
//! A program is a sequence of lines `<opcode> [args...]`. Operands are separated by
//! single spaces and a line has at most three fields, so the literal of
//! `push string "a b"` keeps its inner spaces.

use std::{borrow::Cow, fmt, str::FromStr};

use super::op::Opcode;
use crate::{
    types::Type,
    value::{InvalidLiteral, Value},
};

/// Dense identifier of a jump target, allocated by the compiler from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LabelId(u32);

impl LabelId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One bytecode instruction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Instruction {
    Push(Value),
    Load(String),
    Save(String),
    Label(LabelId),
    Jmp(LabelId),
    Fjmp(LabelId),
    Print(usize),
    Read(Type),
    /// Any operand-less opcode (`pop`, unary and binary operators).
    Simple(Opcode),
}

impl Instruction {
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Push(_) => Opcode::Push,
            Self::Load(_) => Opcode::Load,
            Self::Save(_) => Opcode::Save,
            Self::Label(_) => Opcode::Label,
            Self::Jmp(_) => Opcode::Jmp,
            Self::Fjmp(_) => Opcode::Fjmp,
            Self::Print(_) => Opcode::Print,
            Self::Read(_) => Opcode::Read,
            Self::Simple(op) => *op,
        }
    }

    /// Net change in stack depth caused by executing this instruction.
    #[must_use]
    pub fn stack_effect(&self) -> i32 {
        match self {
            Self::Print(count) => -i32::try_from(*count).unwrap_or(i32::MAX),
            other => other.opcode().stack_effect().unwrap_or(0),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        match self {
            Self::Push(value) => write!(f, "{op} {} {}", value.ty(), value.literal()),
            Self::Load(name) | Self::Save(name) => write!(f, "{op} {name}"),
            Self::Label(label) | Self::Jmp(label) | Self::Fjmp(label) => write!(f, "{op} {label}"),
            Self::Print(count) => write!(f, "{op} {count}"),
            Self::Read(ty) => write!(f, "{op} {ty}"),
            Self::Simple(_) => write!(f, "{op}"),
        }
    }
}

impl FromStr for Instruction {
    type Err = Cow<'static, str>;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.splitn(3, ' ');
        let head = fields.next().unwrap_or_default();
        let op = Opcode::from_str(head).map_err(|_| Cow::Owned(format!("unknown opcode '{head}'")))?;
        let first = fields.next();
        let rest = fields.next();

        if op.is_simple() {
            return match first {
                None => Ok(Self::Simple(op)),
                Some(_) => Err(format!("'{op}' takes no operands").into()),
            };
        }

        let Some(first) = first else {
            return Err(format!("'{op}' is missing its operand").into());
        };
        if op == Opcode::Push {
            let ty = parse_type(first)?;
            let literal = rest.ok_or("'push' is missing its literal")?;
            return Value::from_literal(ty, literal)
                .map(Self::Push)
                .map_err(|err: InvalidLiteral| err.to_string().into());
        }
        if rest.is_some() {
            return Err(format!("'{op}' takes a single operand").into());
        }
        match op {
            Opcode::Load => Ok(Self::Load(first.to_owned())),
            Opcode::Save => Ok(Self::Save(first.to_owned())),
            Opcode::Label => parse_label(first).map(Self::Label),
            Opcode::Jmp => parse_label(first).map(Self::Jmp),
            Opcode::Fjmp => parse_label(first).map(Self::Fjmp),
            Opcode::Print => first
                .parse()
                .map(Self::Print)
                .map_err(|_| format!("invalid print count '{first}'").into()),
            Opcode::Read => parse_type(first).map(Self::Read),
            _ => unreachable!("operand-less opcodes handled above"),
        }
    }
}

fn parse_type(text: &str) -> Result<Type, Cow<'static, str>> {
    Type::from_str(text).map_err(|_| format!("unknown type '{text}'").into())
}

fn parse_label(text: &str) -> Result<LabelId, Cow<'static, str>> {
    text.parse()
        .map(LabelId)
        .map_err(|_| format!("invalid label '{text}'").into())
}

/// Error loading a program from its textual or binary form.
#[derive(Debug)]
pub enum LoadError {
    /// A line that is not a well-formed instruction (1-indexed line number).
    Syntax {
        line: usize,
        text: String,
        reason: Cow<'static, str>,
    },
    /// Binary program that postcard could not decode.
    Binary(postcard::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, text, reason } => {
                write!(f, "invalid instruction at line {line} '{text}': {reason}")
            }
            Self::Binary(err) => write!(f, "invalid binary program: {err}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<postcard::Error> for LoadError {
    fn from(err: postcard::Error) -> Self {
        Self::Binary(err)
    }
}

/// A complete bytecode program.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    /// Deepest operand stack reached along the linear instruction stream.
    max_stack_depth: usize,
}

impl Program {
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let mut depth: i64 = 0;
        let mut max_depth: i64 = 0;
        for ins in &instructions {
            depth += i64::from(ins.stack_effect());
            max_depth = max_depth.max(depth);
        }
        Self {
            instructions,
            max_stack_depth: usize::try_from(max_depth).unwrap_or_default(),
        }
    }

    /// Parses the textual form, one instruction per line.
    ///
    /// Lines are trimmed and blank lines are skipped. Operands are not validated
    /// against each other (labels, variable names): the program is trusted to come
    /// from the compiler.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        text.lines()
            .enumerate()
            .map(|(idx, line)| (idx, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(idx, line)| {
                line.parse().map_err(|reason| LoadError::Syntax {
                    line: idx + 1,
                    text: line.to_owned(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    #[must_use]
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    /// Number of instructions with the given opcode.
    #[must_use]
    pub fn count(&self, opcode: Opcode) -> usize {
        self.instructions.iter().filter(|ins| ins.opcode() == opcode).count()
    }

    /// Serializes the program to postcard's binary format.
    ///
    /// The result can be cached and restored with [`Program::load`] to skip compilation.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserializes a program produced by [`Program::dump`].
    pub fn load(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ins in &self.instructions {
            writeln!(f, "{ins}")?;
        }
        Ok(())
    }
}
