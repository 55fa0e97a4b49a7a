#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int64,
    Float64,
    Utf8,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Utf8 => "utf8",
        };
        f.write_str(name)
    }
}

/// A literal value as written in expression source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Scalar {
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Int64(_) => DType::Int64,
            Self::Float64(_) => DType::Float64,
            Self::Utf8(_) => DType::Utf8,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64(_) | Self::Float64(_))
    }

    /// Numeric view of the literal; `None` for strings.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            Self::Utf8(_) => None,
        }
    }
}

/// Renders the literal the way it would be written in source: integers
/// bare, floats always with a fractional part or exponent, strings in
/// single quotes.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::Utf8(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{DType, Scalar};

    #[test]
    fn dtype_follows_variant() {
        assert_eq!(Scalar::Int64(3).dtype(), DType::Int64);
        assert_eq!(Scalar::Float64(3.0).dtype(), DType::Float64);
        assert_eq!(Scalar::from("x").dtype(), DType::Utf8);
    }

    #[test]
    fn float_display_keeps_fractional_marker() {
        assert_eq!(Scalar::Float64(3.0).to_string(), "3.0");
        assert_eq!(Scalar::Float64(2.1).to_string(), "2.1");
        assert_eq!(Scalar::Int64(3).to_string(), "3");
        assert_eq!(Scalar::from("abc").to_string(), "'abc'");
    }

    #[test]
    fn numeric_view_excludes_strings() {
        assert_eq!(Scalar::Int64(2).as_f64(), Some(2.0));
        assert!(Scalar::Float64(0.5).is_numeric());
        assert_eq!(Scalar::from("2").as_f64(), None);
    }

    #[test]
    fn serde_shape_is_tagged() {
        let json = serde_json::to_string(&Scalar::Int64(7)).expect("serialize");
        assert_eq!(json, r#"{"kind":"int64","value":7}"#);
        let back: Scalar = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Scalar::Int64(7));
    }
}
