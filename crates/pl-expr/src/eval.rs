use std::collections::{BTreeSet, HashSet};
use std::ops::{Add, Div, Mul, Neg, Sub};

use pl_runtime::RuntimePolicy;
use pl_types::Scalar;

use crate::ast::{Call, InfixOp, Node, Operand, Operator, PrefixOp};
use crate::error::{BackendError, ExprError};

/// The expression library a tree is compiled toward.
///
/// Arithmetic goes through the value type's operator overloads; `/` must
/// have true-division semantics. Named calls go through [`Backend::invoke`],
/// which decides on its own which operation names it accepts.
pub trait Backend {
    type Value: Add<Output = Self::Value>
        + Sub<Output = Self::Value>
        + Mul<Output = Self::Value>
        + Div<Output = Self::Value>
        + Neg<Output = Self::Value>;

    fn column(&self, name: &str) -> Result<Self::Value, BackendError>;

    fn literal(&self, value: Scalar) -> Result<Self::Value, BackendError>;

    /// Applies operation `name` to `receiver` with `args` as parameters.
    /// Unknown names must fail with [`BackendError::UnknownOperation`].
    fn invoke(
        &self,
        receiver: Self::Value,
        name: &str,
        args: Vec<Self::Value>,
    ) -> Result<Self::Value, BackendError>;
}

/// Anything that can list the columns available for selection.
pub trait ColumnSource {
    fn column_names(&self) -> BTreeSet<String>;
}

impl ColumnSource for BTreeSet<String> {
    fn column_names(&self) -> BTreeSet<String> {
        self.clone()
    }
}

impl ColumnSource for HashSet<String> {
    fn column_names(&self) -> BTreeSet<String> {
        self.iter().cloned().collect()
    }
}

impl ColumnSource for [&str] {
    fn column_names(&self) -> BTreeSet<String> {
        self.iter().map(|name| (*name).to_owned()).collect()
    }
}

/// Post-order tree walker bound to one backend.
///
/// Runs on an explicit stack, so long binary chains cost heap rather than
/// call stack. Prefix operators and calls each count as one nesting level
/// against the policy limit, matching what the parser charges for them.
#[derive(Debug)]
pub struct Evaluator<'b, B> {
    backend: &'b B,
    max_depth: usize,
}

/// Work left to do once the value of a child is known.
enum Pending<'n, V> {
    Prefix(PrefixOp),
    Left { op: InfixOp, right: &'n Node },
    Right { op: InfixOp, lhs: V },
    Receiver(&'n Call),
    Params {
        call: &'n Call,
        receiver: V,
        done: Vec<V>,
    },
}

impl<'b, B: Backend> Evaluator<'b, B> {
    #[must_use]
    pub fn new(backend: &'b B) -> Self {
        Self::with_policy(backend, &RuntimePolicy::default())
    }

    #[must_use]
    pub fn with_policy(backend: &'b B, policy: &RuntimePolicy) -> Self {
        Self {
            backend,
            max_depth: policy.max_nesting_depth,
        }
    }

    pub fn evaluate(&self, node: &Node) -> Result<B::Value, ExprError> {
        let result = self.run(node);
        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::debug!(error = %err, "expression evaluation failed");
        }
        result
    }

    fn run<'n>(&self, root: &'n Node) -> Result<B::Value, ExprError> {
        let mut pending: Vec<Pending<'n, B::Value>> = Vec::new();
        let mut depth = 0;
        let mut next = root;
        loop {
            let mut value = match next {
                Node::Operand(operand) => self.operand(operand)?,
                Node::Operator(Operator::Prefix { op, operand }) => {
                    depth = self.nest(depth)?;
                    pending.push(Pending::Prefix(*op));
                    next = operand.as_ref();
                    continue;
                }
                Node::Operator(Operator::Infix { op, left, right }) => {
                    pending.push(Pending::Left {
                        op: *op,
                        right: right.as_ref(),
                    });
                    next = left.as_ref();
                    continue;
                }
                Node::Operator(Operator::Call(call)) => {
                    depth = self.nest(depth)?;
                    pending.push(Pending::Receiver(call));
                    next = call.receiver();
                    continue;
                }
            };

            // Hand the value up until some frame needs another child.
            loop {
                match pending.pop() {
                    None => return Ok(value),
                    Some(Pending::Prefix(op)) => {
                        depth -= 1;
                        value = match op {
                            PrefixOp::Neg => -value,
                            PrefixOp::Identity => value,
                        };
                    }
                    Some(Pending::Left { op, right }) => {
                        pending.push(Pending::Right { op, lhs: value });
                        next = right;
                        break;
                    }
                    Some(Pending::Right { op, lhs }) => {
                        value = match op {
                            InfixOp::Add => lhs + value,
                            InfixOp::Sub => lhs - value,
                            InfixOp::Mul => lhs * value,
                            InfixOp::Div => lhs / value,
                        };
                    }
                    Some(Pending::Receiver(call)) => {
                        if let Some(first) = call.params().first() {
                            pending.push(Pending::Params {
                                call,
                                receiver: value,
                                done: Vec::with_capacity(call.params().len()),
                            });
                            next = first;
                            break;
                        }
                        depth -= 1;
                        value = self.backend.invoke(value, call.name(), Vec::new())?;
                    }
                    Some(Pending::Params {
                        call,
                        receiver,
                        mut done,
                    }) => {
                        done.push(value);
                        if let Some(param) = call.params().get(done.len()) {
                            pending.push(Pending::Params {
                                call,
                                receiver,
                                done,
                            });
                            next = param;
                            break;
                        }
                        depth -= 1;
                        value = self.backend.invoke(receiver, call.name(), done)?;
                    }
                }
            }
        }
    }

    fn operand(&self, operand: &Operand) -> Result<B::Value, ExprError> {
        let value = match operand {
            Operand::Column { name } => self.backend.column(name)?,
            Operand::Integer { value } => self.backend.literal(Scalar::Int64(*value))?,
            Operand::Float { value } => self.backend.literal(Scalar::Float64(*value))?,
            Operand::String { value } => self.backend.literal(Scalar::Utf8(value.clone()))?,
        };
        Ok(value)
    }

    fn nest(&self, depth: usize) -> Result<usize, ExprError> {
        if depth >= self.max_depth {
            return Err(ExprError::NestingTooDeep {
                position: None,
                limit: self.max_depth,
            });
        }
        Ok(depth + 1)
    }
}
