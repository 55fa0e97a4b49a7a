#![forbid(unsafe_code)]
//! Compiles infix column expressions such as `sum(a - b) * c` into values of
//! a pluggable [`Backend`].
//!
//! ```text
//! source ──parse──▶ Node ──evaluate──▶ Backend::Value
//!                     └──collect_column_names──▶ BTreeSet<String>
//! ```
//!
//! Precedence, tightest first: unary `+`/`-` (right-associative), then
//! `*`/`/`, then binary `+`/`-` (both left-associative). A call
//! `name(x, y, ...)` invokes `name` on the value of `x` with the remaining
//! arguments as parameters.

mod analyze;
mod ast;
mod error;
mod eval;
mod lexer;
mod parser;

use std::collections::BTreeSet;
use std::str::FromStr;

pub use analyze::{
    collect_column_names, collect_function_names, missing_columns, node_is_selectable,
};
pub use ast::{Call, EmptyCallError, InfixOp, Node, Operand, Operator, PrefixOp};
pub use error::{BackendError, ExprError};
pub use eval::{Backend, ColumnSource, Evaluator};
pub use pl_runtime::RuntimePolicy;
pub use pl_types::{DType, Scalar};

/// Parse `source` under the default [`RuntimePolicy`].
pub fn parse(source: &str) -> Result<Node, ExprError> {
    parse_with_policy(source, &RuntimePolicy::default())
}

pub fn parse_with_policy(source: &str, policy: &RuntimePolicy) -> Result<Node, ExprError> {
    let result = parser::parse_source(source, policy);
    #[cfg(feature = "tracing")]
    match &result {
        Ok(_) => tracing::debug!(source_len = source.len(), "parsed expression"),
        Err(err) => tracing::debug!(
            source_len = source.len(),
            position = err.position(),
            error = %err,
            "expression parse failed"
        ),
    }
    result
}

impl FromStr for Node {
    type Err = ExprError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        parse(source)
    }
}

pub fn evaluate<B: Backend>(tree: &Node, backend: &B) -> Result<B::Value, ExprError> {
    Evaluator::new(backend).evaluate(tree)
}

/// Parse and evaluate in one step.
pub fn compile_and_evaluate<B: Backend>(source: &str, backend: &B) -> Result<B::Value, ExprError> {
    let tree = parse(source)?;
    evaluate(&tree, backend)
}

/// Parse `source` and check that every column it references is available.
/// Never touches a backend.
pub fn is_selectable(source: &str, available: &BTreeSet<String>) -> Result<bool, ExprError> {
    let tree = parse(source)?;
    Ok(node_is_selectable(&tree, available))
}

/// Like [`is_selectable`], against the columns a source enumerates.
pub fn can_select<S: ColumnSource + ?Sized>(source: &S, expr: &str) -> Result<bool, ExprError> {
    is_selectable(expr, &source.column_names())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{
        ExprError, Node, RuntimePolicy, can_select, compile_and_evaluate, is_selectable, parse,
    };
    use crate::eval::tests::NumericBackend;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn collects_every_column_of_the_mixed_expression() {
        let tree = parse("a - b + c*-d*e").expect("parse");
        assert_eq!(
            super::collect_column_names(&tree),
            set(&["a", "b", "c", "d", "e"])
        );
    }

    #[test]
    fn is_selectable_checks_against_available_columns() {
        let available = set(&["a", "b"]);
        assert!(is_selectable("a - b", &available).expect("parse"));
        assert!(!is_selectable("a - z", &available).expect("parse"));
        assert!(is_selectable("3 * 'x'", &available).expect("parse"));
        assert!(is_selectable("f(", &available).is_err());
    }

    #[test]
    fn can_select_uses_enumerated_columns() {
        let columns: &[&str] = &["a", "b"];
        assert!(can_select(columns, "sum(a - b)").expect("parse"));
        assert!(!can_select(columns, "sum(a - c)").expect("parse"));
    }

    #[test]
    fn from_str_parses() {
        let node: Node = "a - b".parse().expect("parse");
        assert_eq!(node.to_string(), "a - b");
    }

    #[test]
    fn compile_and_evaluate_rejects_before_evaluating() {
        let backend = NumericBackend::default();
        let err = compile_and_evaluate("f()", &backend).expect_err("must fail");
        assert!(matches!(err, ExprError::Parse { .. }));
    }

    #[test]
    fn pathological_nesting_fails_cleanly() {
        let source = format!("{}a{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&source).expect_err("must fail");
        assert!(matches!(err, ExprError::NestingTooDeep { limit: 128, .. }));

        let source = format!("{}a", "-".repeat(100_000));
        assert!(matches!(
            parse(&source),
            Err(ExprError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn default_policy_admits_moderate_nesting() {
        let source = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&source).expect("parse"), Node::column("a"));
        let policy = RuntimePolicy::hardened(None);
        assert!(super::parse_with_policy(&source, &policy).is_err());
    }

    #[test]
    fn thousand_term_sum_parses_and_evaluates() {
        let source = vec!["a"; 1000].join(" + ");
        let tree = parse(&source).expect("parse");
        let backend = NumericBackend::with(&[("a", 1.5)]);
        assert_eq!(super::evaluate(&tree, &backend).expect("eval"), 1500.0);
        assert_eq!(parse(&tree.to_string()).expect("reparse"), tree);
    }

    #[test]
    fn rendered_form_reparses_near_the_nesting_limit() {
        let source = format!("{}a", "-".repeat(90));
        let tree = parse(&source).expect("parse");
        assert_eq!(tree.to_string(), source);
        assert_eq!(parse(&tree.to_string()).expect("reparse"), tree);

        let mut source = "c".to_owned();
        for _ in 0..60 {
            source = format!("-(a - {source}) * b");
        }
        let tree = parse(&source).expect("parse");
        assert_eq!(parse(&tree.to_string()).expect("reparse"), tree);

        let source = format!("{}a{}", "f(".repeat(120), ")".repeat(120));
        let tree = parse(&source).expect("parse");
        assert_eq!(parse(&tree.to_string()).expect("reparse"), tree);
    }

    fn eval(source: &str, a: f64, b: f64, c: f64) -> f64 {
        let backend = NumericBackend::with(&[("a", a), ("b", b), ("c", c)]);
        compile_and_evaluate(source, &backend).expect("eval")
    }

    /// Renders source text for a random arithmetic expression over a, b, c.
    fn arb_source() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![
            Just("a".to_owned()),
            Just("b".to_owned()),
            Just("c".to_owned()),
            (0_i64..100).prop_map(|v| v.to_string()),
            (0_u32..1000).prop_map(|v| format!("{}.{}", v / 10, v % 10)),
        ];
        leaf.prop_recursive(6, 48, 3, |inner| {
            prop_oneof![
                (inner.clone(), prop::sample::select(vec!["+", "-", "*", "/"]), inner.clone())
                    .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
                (prop::sample::select(vec!["-", "+"]), inner.clone())
                    .prop_map(|(op, e)| format!("{op}{e}")),
                inner.clone().prop_map(|e| format!("({e})")),
                inner.prop_map(|e| format!("abs({e})")),
            ]
        })
    }

    fn close(x: f64, y: f64) -> bool {
        (x.is_nan() && y.is_nan()) || x == y
    }

    proptest! {
        #[test]
        fn multiplication_binds_tighter(
            a in -1e3..1e3_f64,
            b in -1e3..1e3_f64,
            c in -1e3..1e3_f64,
        ) {
            prop_assert!(close(eval("a - b * c", a, b, c), a - (b * c)));
            prop_assert!(close(eval("a + b / c", a, b, c), a + (b / c)));
        }

        #[test]
        fn binary_operators_associate_left(
            a in -1e3..1e3_f64,
            b in -1e3..1e3_f64,
            c in -1e3..1e3_f64,
        ) {
            prop_assert!(close(eval("a - b - c", a, b, c), (a - b) - c));
            prop_assert!(close(eval("a / b / c", a, b, c), (a / b) / c));
        }

        #[test]
        fn double_minus_adds(a in -1e3..1e3_f64, b in -1e3..1e3_f64) {
            prop_assert!(close(eval("a--b", a, b, 0.0), a - (-b)));
            prop_assert!(close(eval("a--b", a, b, 0.0), a + b));
        }

        #[test]
        fn parentheses_override(a in -1e3..1e3_f64, b in -1e3..1e3_f64, c in -1e3..1e3_f64) {
            prop_assert!(close(eval("(a - b) * c", a, b, c), (a - b) * c));
            prop_assert!(close(eval("-a * -b", a, b, c), (-a) * (-b)));
        }

        #[test]
        fn display_round_trips_through_parse(source in arb_source()) {
            let tree = parse(&source).expect("generated source parses");
            let rendered = tree.to_string();
            prop_assert_eq!(parse(&rendered).expect("rendered source parses"), tree);
        }

        #[test]
        fn parser_never_panics(source in "[a-c0-9+\\-*/(),.' eE]{0,40}") {
            let _ = parse(&source);
        }
    }
}
