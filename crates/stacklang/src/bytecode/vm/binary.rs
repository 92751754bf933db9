//! Arithmetic, concatenation and logical operation helpers for the VM.
//!
//! Operands arrive already converted by the compiler, so both sides of an
//! arithmetic instruction share a type. Integer arithmetic wraps on overflow;
//! `div` and `mod` on integers round toward negative infinity.

use num_integer::Integer;
use num_traits::Zero;

use super::{RunError, VM};
use crate::{bytecode::op::Opcode, io::InputReader, io::PrintWriter, tracer::VmTracer, value::Value};

impl<P: PrintWriter, I: InputReader, Tr: VmTracer> VM<'_, P, I, Tr> {
    /// `add`, `sub`, `mul`, `div` and `mod`.
    pub(super) fn binary_arithmetic(&mut self, op: Opcode) -> Result<(), RunError> {
        let (lhs, rhs) = self.pop_pair();
        let result = match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Value::Int(int_arithmetic(op, a, b)?),
            (Value::Float(a), Value::Float(b)) => Value::Float(float_arithmetic(op, a, b)?),
            (lhs, rhs) => panic!("{op} on {} and {}", lhs.ty(), rhs.ty()),
        };
        self.push(result);
        Ok(())
    }

    pub(super) fn binary_concat(&mut self) {
        let (lhs, rhs) = self.pop_pair();
        let result = match (lhs, rhs) {
            (Value::Str(mut a), Value::Str(b)) => {
                a.push_str(&b);
                a
            }
            (lhs, rhs) => panic!("concat on {} and {}", lhs.ty(), rhs.ty()),
        };
        self.push(Value::Str(result));
    }

    /// `and` and `or`; both operands are already evaluated, there is no short-circuit.
    pub(super) fn binary_logical(&mut self, op: Opcode) {
        let (lhs, rhs) = self.pop_pair();
        let (a, b) = (lhs.as_bool(), rhs.as_bool());
        let result = match op {
            Opcode::And => a && b,
            Opcode::Or => a || b,
            _ => unreachable!("{op} is not a logical opcode"),
        };
        self.push(Value::Bool(result));
    }
}

fn int_arithmetic(op: Opcode, a: i64, b: i64) -> Result<i64, RunError> {
    Ok(match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Div | Opcode::Mod if b.is_zero() => return Err(RunError::ZeroDivision),
        // i64::MIN / -1 is the only overflowing case
        Opcode::Div if b == -1 => a.wrapping_neg(),
        Opcode::Mod if b == -1 => 0,
        Opcode::Div => Integer::div_floor(&a, &b),
        Opcode::Mod => Integer::mod_floor(&a, &b),
        _ => unreachable!("{op} is not an arithmetic opcode"),
    })
}

fn float_arithmetic(op: Opcode, a: f64, b: f64) -> Result<f64, RunError> {
    Ok(match op {
        Opcode::Add => a + b,
        Opcode::Sub => a - b,
        Opcode::Mul => a * b,
        Opcode::Div | Opcode::Mod if b.is_zero() => return Err(RunError::ZeroDivision),
        Opcode::Div => a / b,
        Opcode::Mod => {
            let rem = a % b;
            // floored: the result takes the sign of the divisor
            if rem != 0.0 && (rem < 0.0) != (b < 0.0) { rem + b } else { rem }
        }
        _ => unreachable!("{op} is not an arithmetic opcode"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_division_rounds_toward_negative_infinity() {
        assert_eq!(int_arithmetic(Opcode::Div, -7, 2).unwrap(), -4);
        assert_eq!(int_arithmetic(Opcode::Div, 7, 2).unwrap(), 3);
        assert_eq!(int_arithmetic(Opcode::Mod, -7, 2).unwrap(), 1);
        assert_eq!(int_arithmetic(Opcode::Div, i64::MIN, -1).unwrap(), i64::MIN);
        assert_eq!(int_arithmetic(Opcode::Mod, i64::MIN, -1).unwrap(), 0);
    }

    #[test]
    fn float_modulo_follows_divisor_sign() {
        assert!((float_arithmetic(Opcode::Mod, -7.5, 2.0).unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((float_arithmetic(Opcode::Mod, 7.5, -2.0).unwrap() + 0.5).abs() < f64::EPSILON);
    }
}
