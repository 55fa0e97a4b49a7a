use std::fmt;

use pl_types::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Leaf of an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operand {
    Column { name: String },
    Integer { value: i64 },
    Float { value: f64 },
    String { value: String },
}

impl Operand {
    /// The literal value handed to a backend; `None` for column references.
    #[must_use]
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Column { .. } => None,
            Self::Integer { value } => Some(Scalar::Int64(*value)),
            Self::Float { value } => Some(Scalar::Float64(*value)),
            Self::String { value } => Some(Scalar::Utf8(value.clone())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixOp {
    Neg,
    Identity,
}

impl PrefixOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Identity => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl InfixOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    fn binding(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("call to `{name}` requires at least one argument")]
pub struct EmptyCallError {
    pub name: String,
}

/// A named operation applied to its first argument, with the remaining
/// arguments as parameters. Always holds at least one argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCall")]
pub struct Call {
    name: String,
    args: Vec<Node>,
}

#[derive(Deserialize)]
struct RawCall {
    name: String,
    args: Vec<Node>,
}

impl TryFrom<RawCall> for Call {
    type Error = EmptyCallError;

    fn try_from(raw: RawCall) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.args)
    }
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Node>) -> Result<Self, EmptyCallError> {
        let name = name.into();
        if args.is_empty() {
            return Err(EmptyCallError { name });
        }
        Ok(Self { name, args })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn args(&self) -> &[Node] {
        &self.args
    }

    /// The node the operation is invoked on.
    #[must_use]
    pub fn receiver(&self) -> &Node {
        &self.args[0]
    }

    /// Arguments after the receiver.
    #[must_use]
    pub fn params(&self) -> &[Node] {
        &self.args[1..]
    }
}

/// Interior node of an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operator {
    Prefix {
        op: PrefixOp,
        operand: Box<Node>,
    },
    Infix {
        op: InfixOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call(Call),
}

/// A parsed expression. Each operator exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Operand(Operand),
    Operator(Operator),
}

impl Node {
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Operand(Operand::Column { name: name.into() })
    }

    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Operand(Operand::Integer { value })
    }

    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Operand(Operand::Float { value })
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Operand(Operand::String {
            value: value.into(),
        })
    }

    #[must_use]
    pub fn prefix(op: PrefixOp, operand: Node) -> Self {
        Self::Operator(Operator::Prefix {
            op,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn infix(op: InfixOp, left: Node, right: Node) -> Self {
        Self::Operator(Operator::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Result<Self, EmptyCallError> {
        Call::new(name, args).map(|call| Self::Operator(Operator::Call(call)))
    }

    /// Direct children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Operand(_) => Vec::new(),
            Self::Operator(Operator::Prefix { operand, .. }) => vec![operand.as_ref()],
            Self::Operator(Operator::Infix { left, right, .. }) => {
                vec![left.as_ref(), right.as_ref()]
            }
            Self::Operator(Operator::Call(call)) => call.args.iter().collect(),
        }
    }

    /// Visits every node depth-first, parents before children. Uses an
    /// explicit stack so arbitrarily deep trees cannot exhaust the call stack.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a Node)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children().into_iter().rev());
        }
    }

    fn infix_binding(&self) -> Option<u8> {
        match self {
            Self::Operator(Operator::Infix { op, .. }) => Some(op.binding()),
            _ => None,
        }
    }
}

/// Writes `node`, parenthesized when its own binary operator binds looser
/// than `min` allows.
fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node, min: u8) -> fmt::Result {
    match node.infix_binding() {
        Some(binding) if binding < min => write!(f, "({node})"),
        _ => write!(f, "{node}"),
    }
}

/// Canonical form with only the parentheses the grammar requires. For
/// trees produced by the parser, parsing the rendered text yields an
/// identical tree and never nests deeper than the source did.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand(Operand::Column { name }) => f.write_str(name),
            Self::Operand(Operand::Integer { value }) => write!(f, "{value}"),
            Self::Operand(Operand::Float { value }) => write!(f, "{value:?}"),
            Self::Operand(Operand::String { value }) => write!(f, "'{value}'"),
            Self::Operator(Operator::Prefix { op, operand }) => {
                f.write_str(op.symbol())?;
                write_operand(f, operand, u8::MAX)
            }
            Self::Operator(Operator::Infix { op, left, right }) => {
                let binding = op.binding();
                write_operand(f, left, binding)?;
                write!(f, " {} ", op.symbol())?;
                // Same-level operators on the right came from parentheses.
                write_operand(f, right, binding + 1)
            }
            Self::Operator(Operator::Call(call)) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
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
