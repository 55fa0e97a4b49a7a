#![no_main]

use libfuzzer_sys::fuzz_target;
use polang::{Evaluator, LazyBackend, RuntimePolicy, Schema, can_select, parse_with_policy};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let policy = RuntimePolicy::hardened(Some(4096));
    let Ok(tree) = parse_with_policy(source, &policy) else {
        return;
    };
    // Anything the parser accepts must stay within the evaluator's limits.
    let backend = LazyBackend::default();
    if let Err(err) = Evaluator::with_policy(&backend, &policy).evaluate(&tree) {
        assert!(!matches!(err, polang::ExprError::NestingTooDeep { .. }));
    }
    let schema = Schema::new(["a", "b", "c"]);
    let _ = can_select(&schema, source);
});
