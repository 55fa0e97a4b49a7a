use std::collections::BTreeMap;

use pl_expr::BackendError;
use serde::{Deserialize, Serialize};

/// Accepted parameter count for a method, not counting the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    #[must_use]
    pub const fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn admits(self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

const AGGREGATIONS: &[&str] = &[
    "sum", "mean", "min", "max", "count", "first", "last", "std", "var", "median",
];

const ELEMENTWISE: &[&str] = &[
    "abs", "sqrt", "exp", "log", "log10", "sin", "cos", "tan", "arcsin", "arccos", "arctan",
    "floor", "ceil", "sign",
];

/// Allow-list of method names the lazy backend will build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRegistry {
    methods: BTreeMap<String, Arity>,
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Aggregations, elementwise math, and a few parameterised methods.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for name in AGGREGATIONS.iter().chain(ELEMENTWISE) {
            registry.register(*name, Arity::exactly(0));
        }
        registry.register("round", Arity::between(0, 1));
        registry.register("pow", Arity::exactly(1));
        registry.register("clip", Arity::exactly(2));
        registry.register("fill_null", Arity::exactly(1));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, arity: Arity) -> &mut Self {
        self.methods.insert(name.into(), arity);
        self
    }

    #[must_use]
    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.methods.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn check(&self, name: &str, param_count: usize) -> Result<(), BackendError> {
        let arity = self
            .arity(name)
            .ok_or_else(|| BackendError::UnknownOperation {
                name: name.to_owned(),
            })?;
        if arity.admits(param_count) {
            return Ok(());
        }
        let expected = if arity.min == arity.max {
            arity.min.to_string()
        } else {
            format!("{} to {}", arity.min, arity.max)
        };
        Err(BackendError::InvalidArguments {
            operation: name.to_owned(),
            detail: format!("expected {expected} parameter(s), got {param_count}"),
        })
    }
}
