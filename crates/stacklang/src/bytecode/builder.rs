//! Builder for emitting bytecode during compilation.
//!
//! `CodeBuilder` is an append-only instruction log. Implicit int→float conversions
//! whose operand is already buried under later instructions are not spliced in
//! during compilation: their positions are collected as patch points and applied
//! in a single pass by [`CodeBuilder::build`].

use std::collections::BTreeSet;

use smallvec::SmallVec;

use super::{
    code::{Instruction, LabelId, Program},
    op::Opcode,
};
use crate::value::Value;

/// Positions in the instruction log after which an `itof` may have to be inserted.
///
/// Nearly every expression carries exactly one.
pub type PatchPoints = SmallVec<[usize; 2]>;

/// Builder for emitting bytecode during compilation.
///
/// # Usage
///
/// ```ignore
/// let mut builder = CodeBuilder::new();
/// let end = builder.new_label();
/// builder.emit(Instruction::Push(Value::Bool(true)));
/// builder.emit(Instruction::Fjmp(end));
/// builder.emit_label(end);
/// let program = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct CodeBuilder {
    /// Instructions in emission order, without deferred conversions.
    instructions: Vec<Instruction>,

    /// Positions in `instructions` where an `itof` must be inserted.
    ///
    /// Ordered so the patch pass can apply them front to back with a running offset.
    deferred_itof: BTreeSet<usize>,

    /// Next label id to hand out.
    next_label: u32,

    /// Set once the program is known to be invalid; all further emission is discarded.
    suppressed: bool,
}

impl CodeBuilder {
    /// Creates a new empty CodeBuilder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction, unless emission has been suppressed.
    pub fn emit(&mut self, ins: Instruction) {
        if !self.suppressed {
            self.instructions.push(ins);
        }
    }

    /// Appends an operand-less instruction.
    pub fn emit_op(&mut self, op: Opcode) {
        debug_assert!(op.is_simple(), "{op} requires an operand");
        self.emit(Instruction::Simple(op));
    }

    /// Appends `push <type> <literal>`.
    pub fn emit_push(&mut self, value: Value) {
        self.emit(Instruction::Push(value));
    }

    /// Allocates a fresh label id; labels are numbered densely from zero.
    pub fn new_label(&mut self) -> LabelId {
        let label = LabelId::new(self.next_label);
        self.next_label += 1;
        label
    }

    /// Places a previously allocated label at the current position.
    pub fn emit_label(&mut self, label: LabelId) {
        self.emit(Instruction::Label(label));
    }

    /// Current end of the instruction log, recorded as an expression's patch point.
    #[must_use]
    pub fn position(&self) -> usize {
        self.instructions.len()
    }

    /// Records patch points whose `itof` must be spliced in by [`build`](Self::build).
    pub fn defer_itof(&mut self, points: impl IntoIterator<Item = usize>) {
        self.deferred_itof.extend(points);
    }

    /// Discards all subsequent emission; used after the first semantic error.
    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Number of conversions waiting for the patch pass.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.deferred_itof.len()
    }

    /// Applies the deferred conversions and returns the finished program.
    ///
    /// Patch point `p`, the `i`-th in ascending order, lands at `p + i` in the output
    /// since `i` insertions precede it, which yields the same program as inserting one
    /// at a time regardless of the order the points were discovered in.
    #[must_use]
    pub fn build(self) -> Program {
        let mut out = Vec::with_capacity(self.instructions.len() + self.deferred_count());
        let mut pending = self.deferred_itof.into_iter().peekable();
        for (pos, ins) in self.instructions.into_iter().enumerate() {
            while pending.next_if(|&p| p <= pos).is_some() {
                out.push(Instruction::Simple(Opcode::Itof));
            }
            out.push(ins);
        }
        // points at the very end of the log
        out.extend(pending.map(|_| Instruction::Simple(Opcode::Itof)));
        Program::new(out)
    }
}
