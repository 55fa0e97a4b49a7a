#![forbid(unsafe_code)]
//! Infix column expressions compiled to lazy dataframe expressions.
//!
//! ```
//! use polang::{LazyBackend, col, compile_and_evaluate, lit};
//!
//! let expr = compile_and_evaluate("2.1 * a - 3", &LazyBackend::default()).unwrap();
//! assert_eq!(expr, lit(2.1) * col("a") - lit(3_i64));
//! ```

pub use pl_expr::{
    Backend, BackendError, Call, ColumnSource, EmptyCallError, Evaluator, ExprError, InfixOp,
    Node, Operand, Operator, PrefixOp, can_select, collect_column_names, collect_function_names,
    compile_and_evaluate, evaluate, is_selectable, missing_columns, node_is_selectable, parse,
    parse_with_policy,
};
pub use pl_lazy::{Arity, ArithmeticOp, FunctionRegistry, LazyBackend, LazyExpr, Schema, col, lit};
pub use pl_runtime::{PolicyError, RuntimePolicy};
pub use pl_types::{DType, Scalar};

/// Compile `source` with the standard lazy backend.
pub fn polang(source: &str) -> Result<LazyExpr, ExprError> {
    compile_and_evaluate(source, &LazyBackend::default())
}

/// Compile `source` under `policy`, checking columns against `schema`
/// before building anything.
pub fn compile_for_schema(
    source: &str,
    schema: &Schema,
    backend: &LazyBackend,
    policy: &RuntimePolicy,
) -> Result<LazyExpr, ExprError> {
    let tree = parse_with_policy(source, policy)?;
    let missing = missing_columns(&tree, &schema.column_names());
    if let Some(name) = missing.into_iter().next() {
        return Err(BackendError::UnknownColumn { name }.into());
    }
    Evaluator::with_policy(backend, policy).evaluate(&tree)
}
