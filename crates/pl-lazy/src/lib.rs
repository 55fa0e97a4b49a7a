#![forbid(unsafe_code)]
//! Symbolic column expressions: the reference backend for `pl-expr`.
//!
//! Building a [`LazyExpr`] never touches data; it only records the
//! operations to apply, the way a lazy dataframe expression does.

mod registry;

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use pl_expr::{Backend, BackendError, ColumnSource};
use pl_types::Scalar;
use serde::{Deserialize, Serialize};

pub use registry::{Arity, FunctionRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LazyExpr {
    Column {
        name: String,
    },
    Literal {
        value: Scalar,
    },
    Binary {
        op: ArithmeticOp,
        left: Box<LazyExpr>,
        right: Box<LazyExpr>,
    },
    Negate {
        expr: Box<LazyExpr>,
    },
    Method {
        name: String,
        receiver: Box<LazyExpr>,
        args: Vec<LazyExpr>,
    },
}

#[must_use]
pub fn col(name: impl Into<String>) -> LazyExpr {
    LazyExpr::Column { name: name.into() }
}

#[must_use]
pub fn lit(value: impl Into<Scalar>) -> LazyExpr {
    LazyExpr::Literal {
        value: value.into(),
    }
}

impl LazyExpr {
    /// Record a method call on `self`. No allow-list check happens here;
    /// that is [`LazyBackend`]'s job.
    #[must_use]
    pub fn method(self, name: impl Into<String>, args: Vec<LazyExpr>) -> Self {
        Self::Method {
            name: name.into(),
            receiver: Box::new(self),
            args,
        }
    }

    fn binary(self, op: ArithmeticOp, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }
}

impl Add for LazyExpr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.binary(ArithmeticOp::Add, rhs)
    }
}

impl Sub for LazyExpr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.binary(ArithmeticOp::Sub, rhs)
    }
}

impl Mul for LazyExpr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.binary(ArithmeticOp::Mul, rhs)
    }
}

/// True division: integer operands are not truncated.
impl Div for LazyExpr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.binary(ArithmeticOp::Div, rhs)
    }
}

impl Neg for LazyExpr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Negate {
            expr: Box::new(self),
        }
    }
}

impl fmt::Display for LazyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { name } => write!(f, "col(\"{name}\")"),
            Self::Literal {
                value: Scalar::Utf8(s),
            } => write!(f, "lit(\"{s}\")"),
            Self::Literal { value } => write!(f, "lit({value})"),
            Self::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Self::Negate { expr } => write!(f, "-({expr})"),
            Self::Method {
                name,
                receiver,
                args,
            } => {
                write!(f, "{receiver}.{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Builds [`LazyExpr`] values, accepting only methods in its registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyBackend {
    registry: FunctionRegistry,
}

impl Default for LazyBackend {
    fn default() -> Self {
        Self::new(FunctionRegistry::standard())
    }
}

impl LazyBackend {
    #[must_use]
    pub fn new(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }
}

impl Backend for LazyBackend {
    type Value = LazyExpr;

    fn column(&self, name: &str) -> Result<LazyExpr, BackendError> {
        Ok(col(name))
    }

    fn literal(&self, value: Scalar) -> Result<LazyExpr, BackendError> {
        Ok(lit(value))
    }

    fn invoke(
        &self,
        receiver: LazyExpr,
        name: &str,
        args: Vec<LazyExpr>,
    ) -> Result<LazyExpr, BackendError> {
        self.registry.check(name, args.len())?;
        Ok(receiver.method(name, args))
    }
}

/// Column names of a dataset, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Duplicate names keep their first position.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in columns {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { columns: out }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl ColumnSource for Schema {
    fn column_names(&self) -> std::collections::BTreeSet<String> {
        self.columns.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use pl_expr::{Backend, BackendError, ColumnSource};
    use pl_types::Scalar;

    use super::{LazyBackend, LazyExpr, Schema, col, lit};

    #[test]
    fn operators_build_binary_nodes() {
        let expr = lit(2.1) * col("a") - lit(3_i64);
        assert_eq!(expr.to_string(), "((lit(2.1) * col(\"a\")) - lit(3))");
        assert!(matches!(expr, LazyExpr::Binary { .. }));
    }

    #[test]
    fn negation_and_methods_render() {
        let expr = (-col("a")).method("sum", Vec::new());
        assert_eq!(expr.to_string(), "-(col(\"a\")).sum()");
        let expr = col("x").method("clip", vec![lit(0_i64), lit(1.5)]);
        assert_eq!(expr.to_string(), "col(\"x\").clip(lit(0), lit(1.5))");
        assert_eq!(lit("hi").to_string(), "lit(\"hi\")");
    }

    #[test]
    fn backend_checks_registry_before_building() {
        let backend = LazyBackend::default();
        let built = backend
            .invoke(col("a"), "sin", Vec::new())
            .expect("sin is registered");
        assert_eq!(built, col("a").method("sin", Vec::new()));

        let err = backend
            .invoke(col("a"), "to_pandas", Vec::new())
            .expect_err("must fail");
        assert_eq!(
            err,
            BackendError::UnknownOperation {
                name: "to_pandas".into()
            }
        );
    }

    #[test]
    fn backend_literals_keep_their_type() {
        let backend = LazyBackend::default();
        assert_eq!(
            backend.literal(Scalar::Int64(3)).expect("literal"),
            LazyExpr::Literal {
                value: Scalar::Int64(3)
            }
        );
    }

    #[test]
    fn schema_deduplicates_and_enumerates() {
        let schema = Schema::new(["a", "b", "a", "c"]);
        assert_eq!(schema.names(), &["a", "b", "c"]);
        assert!(schema.contains("b"));
        assert!(!schema.contains("z"));
        assert_eq!(schema.column_names().len(), 3);
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn lazy_expr_serializes_with_kind_tag() {
        let expr = col("a") + lit(1_i64);
        let json = serde_json::to_value(&expr).expect("serialize");
        assert_eq!(json["kind"], "binary");
        assert_eq!(json["op"], "add");
        let back: LazyExpr = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, expr);
    }
}
