use std::fmt;

use strum::{EnumString, IntoStaticStr};

use crate::value::Value;

/// Static type of a declared variable or of a well-typed expression.
///
/// The textual names (`int`, `float`, `bool`, `string`) are shared by the source
/// language keywords, the `push`/`read` bytecode operands and diagnostics, so a
/// single strum-derived mapping serves all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    Bool,
    #[strum(serialize = "string")]
    Str,
}

impl Type {
    /// Returns the name used in source, bytecode and diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Value a freshly declared variable of this type starts with.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
            Self::Str => Value::Str(String::new()),
        }
    }

    /// Whether arithmetic and ordering operators accept this type.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn names_round_trip() {
        for ty in [Type::Int, Type::Float, Type::Bool, Type::Str] {
            assert_eq!(Type::from_str(ty.name()), Ok(ty));
        }
        assert_eq!(Type::Str.to_string(), "string");
        assert!(Type::from_str("str").is_err());
    }
}
