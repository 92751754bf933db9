use std::{borrow::Cow, fmt};

use crate::types::Type;

/// Number of decimal places floats are rounded to when printed.
pub const FLOAT_PRINT_DECIMALS: i32 = 6;

/// A runtime value on the VM operand stack or in the variable store.
///
/// Also used as the payload of `push` instructions, where it is rendered as a
/// bytecode literal (see [`Value::literal`]).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Error decoding a literal or an input line for a given type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLiteral {
    pub ty: Type,
    pub text: String,
}

impl fmt::Display for InvalidLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} literal {:?}", self.ty, self.text)
    }
}

impl std::error::Error for InvalidLiteral {}

impl Value {
    /// Returns the static type tag of this value.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Bool(_) => Type::Bool,
            Self::Str(_) => Type::Str,
        }
    }

    /// Decodes the literal operand of a `push` instruction.
    ///
    /// String literals carry their surrounding quotes in bytecode, which are stripped here.
    pub fn from_literal(ty: Type, text: &str) -> Result<Self, InvalidLiteral> {
        if ty == Type::Str {
            return text
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .map(|s| Self::Str(s.to_owned()))
                .ok_or_else(|| InvalidLiteral {
                    ty,
                    text: text.to_owned(),
                });
        }
        Self::from_input(ty, text)
    }

    /// Decodes one line of user input for a `read` instruction.
    ///
    /// Strings are taken verbatim, booleans must be exactly `true` or `false`.
    pub fn from_input(ty: Type, text: &str) -> Result<Self, InvalidLiteral> {
        let invalid = || InvalidLiteral {
            ty,
            text: text.to_owned(),
        };
        match ty {
            Type::Int => text.trim().parse().map(Self::Int).map_err(|_| invalid()),
            Type::Float => text.trim().parse().map(Self::Float).map_err(|_| invalid()),
            Type::Bool => match text.trim() {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            Type::Str => Ok(Self::Str(text.to_owned())),
        }
    }

    /// Renders the value as a `push` operand: quoted strings, round-tripping floats.
    #[must_use]
    pub fn literal(&self) -> Cow<'_, str> {
        match self {
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(float_repr(*f)),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Str(s) => Cow::Owned(format!("\"{s}\"")),
        }
    }

    /// Renders the value the way the `print` instruction outputs it.
    #[must_use]
    pub fn print_str(&self) -> Cow<'_, str> {
        match self {
            Self::Float(f) => Cow::Owned(float_repr(round_float(*f))),
            Self::Str(s) => Cow::Borrowed(s),
            other => other.literal(),
        }
    }

    /// Truthiness used by `fjmp`; only booleans are expected here.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print_str())
    }
}

/// Rounds to [`FLOAT_PRINT_DECIMALS`] places, leaving values too large to scale untouched.
fn round_float(f: f64) -> f64 {
    let scale = 10f64.powi(FLOAT_PRINT_DECIMALS);
    let scaled = f * scale;
    if !scaled.is_finite() {
        return f;
    }
    let rounded = scaled.round() / scale;
    // avoid printing "-0.0" for tiny negatives
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Shortest round-tripping representation, always containing a `.` or an exponent.
///
/// Fixed notation is used for decimal exponents from -4 to 15, scientific otherwise,
/// with a signed exponent of at least two digits (`1e-05`, `1e+16`).
fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }

    let mut buffer = ryu::Buffer::new();
    reformat_shortest(buffer.format_finite(f))
}

/// Re-renders ryu output, which picks its own fixed/scientific switch points.
fn reformat_shortest(s: &str) -> String {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (mantissa, exp) = match unsigned.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // value = 0.DIGITS * 10^point
    let mut digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let mut point = i32::try_from(int_part.len()).unwrap_or(i32::MAX) + exp;
    let leading_zeros = digits.len() - digits.trim_start_matches('0').len();
    digits.replace_range(..leading_zeros, "");
    point -= i32::try_from(leading_zeros).unwrap_or(0);
    digits.truncate(digits.trim_end_matches('0').len());

    if digits.is_empty() {
        return format!("{sign}0.0");
    }

    let exponent = point - 1;
    if (-4..16).contains(&exponent) {
        let len = i32::try_from(digits.len()).unwrap_or(i32::MAX);
        if point <= 0 {
            let zeros = "0".repeat(point.unsigned_abs() as usize);
            format!("{sign}0.{zeros}{digits}")
        } else if point >= len {
            let zeros = "0".repeat((point - len).unsigned_abs() as usize);
            format!("{sign}{digits}{zeros}.0")
        } else {
            let (whole, frac) = digits.split_at(point.unsigned_abs() as usize);
            format!("{sign}{whole}.{frac}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let dot = if rest.is_empty() { "" } else { "." };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{first}{dot}{rest}e{exp_sign}{:02}", exponent.unsigned_abs())
    }
}
