//! Comparison operation helpers for the VM.

use std::cmp::Ordering;

use super::VM;
use crate::{bytecode::op::Opcode, io::InputReader, io::PrintWriter, tracer::VmTracer, value::Value};

impl<P: PrintWriter, I: InputReader, Tr: VmTracer> VM<'_, P, I, Tr> {
    /// `eq`: same-type equality, with ints and floats compared numerically.
    pub(super) fn compare_eq(&mut self) {
        let (lhs, rhs) = self.pop_pair();
        self.push(Value::Bool(values_equal(&lhs, &rhs)));
    }

    /// `lt` and `gt` on numbers or strings.
    pub(super) fn compare_order(&mut self, op: Opcode) {
        let (lhs, rhs) = self.pop_pair();
        let ordering = partial_cmp(&lhs, &rhs);
        let result = match op {
            Opcode::Lt => ordering == Some(Ordering::Less),
            Opcode::Gt => ordering == Some(Ordering::Greater),
            _ => unreachable!("{op} is not an ordering opcode"),
        };
        self.push(Value::Bool(result));
    }
}

#[expect(clippy::float_cmp, reason = "int/float equality is exact by definition")]
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Float(b)) => *a as f64 == *b,
        (Value::Float(a), Value::Int(b)) => *a == *b as f64,
        _ => lhs == rhs,
    }
}

/// Ordering of two values; `None` for NaN or operands of unrelated types.
fn partial_cmp(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
