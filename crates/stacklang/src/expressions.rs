//! Syntax tree produced by the parser and consumed by the compiler.

use strum::Display;

use crate::{parse::CodeRange, types::Type, value::Value};

/// A variable name with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub position: CodeRange,
}

impl Identifier {
    pub fn new(name: impl Into<String>, position: CodeRange) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// String contents without the surrounding quotes.
    Str(String),
}

impl Literal {
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Bool(_) => Type::Bool,
            Self::Str(_) => Type::Str,
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Binary operators, displayed with their source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    /// String concatenation `.`
    #[strum(serialize = ".")]
    Concat,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "!")]
    Not,
}

/// An expression in the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Name(Identifier),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<ExprLoc>,
    },
    Op {
        left: Box<ExprLoc>,
        op: Operator,
        right: Box<ExprLoc>,
    },
    /// `target = value`; the parser accepts any target, the compiler checks it is a name.
    Assign {
        target: Box<ExprLoc>,
        value: Box<ExprLoc>,
    },
    Paren(Box<ExprLoc>),
}

/// An expression together with the source range it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLoc {
    pub position: CodeRange,
    pub expr: Expr,
}

impl ExprLoc {
    #[must_use]
    pub fn new(position: CodeRange, expr: Expr) -> Self {
        Self { position, expr }
    }

    /// Source line (1-indexed) used in diagnostics.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.position.start().line
    }
}

/// Header of a `for` statement as the grammar produces it.
///
/// The three optional clauses share one slot: only the expressions actually
/// present are kept, in textual order, plus whether the first header position
/// (right after `(`) holds an expression. The compiler recovers which clause is
/// which from these two facts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForClauses {
    pub exprs: Vec<ExprLoc>,
    pub first_slot_is_expr: bool,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A lone `;`.
    Empty,
    Declare {
        ty: Type,
        names: Vec<Identifier>,
    },
    Read {
        targets: Vec<Identifier>,
    },
    Write {
        values: Vec<ExprLoc>,
    },
    Block(Vec<Node>),
    If {
        test: ExprLoc,
        body: Box<Node>,
        or_else: Option<Box<Node>>,
    },
    While {
        test: ExprLoc,
        body: Box<Node>,
    },
    For {
        clauses: ForClauses,
        body: Box<Node>,
    },
    /// Expression evaluated for its side effects; the value is discarded.
    Expr(ExprLoc),
}

/// A whole source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxTree {
    pub body: Vec<Node>,
}
