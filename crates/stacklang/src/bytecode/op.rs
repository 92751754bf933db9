//! Opcode definitions for the textual stack-machine bytecode.

use strum::{Display, EnumString, IntoStaticStr};

/// Bytecode opcode, spelled in lowercase in the textual program format.
///
/// Stack effects are given as `[before] -> [after]`, top of stack on the right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    // === Stack & variables ===
    /// `push <type> <literal>`: `[] -> [value]`
    Push,
    /// `[value] -> []`
    Pop,
    /// `load <id>`: `[] -> [value]`
    Load,
    /// `save <id>`: `[value] -> []`
    Save,

    // === Control flow ===
    /// `label <n>`: jump target, resolved at load time.
    Label,
    /// `jmp <n>`: unconditional jump.
    Jmp,
    /// `fjmp <n>`: `[bool] -> []`, jumps when false.
    Fjmp,

    // === I/O ===
    /// `print <n>`: `[v_n .. v_1] -> []`, prints `v_1 .. v_n` then a newline.
    Print,
    /// `read <type>`: `[] -> [value]`
    Read,

    // === Unary: `[a] -> [op a]` ===
    Uminus,
    Not,
    Itof,

    // === Binary: `[a, b] -> [a op b]` ===
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    And,
    Or,
    Gt,
    Lt,
    Eq,
}

impl Opcode {
    /// Returns the mnemonic used in the textual program format.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether the opcode takes no operands.
    #[must_use]
    pub fn is_simple(self) -> bool {
        !matches!(
            self,
            Self::Push | Self::Load | Self::Save | Self::Label | Self::Jmp | Self::Fjmp | Self::Print | Self::Read
        )
    }

    /// Net change in operand stack depth, `None` when it depends on the operand.
    #[must_use]
    pub fn stack_effect(self) -> Option<i32> {
        match self {
            Self::Push | Self::Load | Self::Read => Some(1),
            Self::Pop | Self::Save | Self::Fjmp => Some(-1),
            Self::Label | Self::Jmp | Self::Uminus | Self::Not | Self::Itof => Some(0),
            Self::Print => None,
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Mod
            | Self::Concat
            | Self::And
            | Self::Or
            | Self::Gt
            | Self::Lt
            | Self::Eq => Some(-1),
        }
    }
}
