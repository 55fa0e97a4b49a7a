#![no_main]

use libfuzzer_sys::fuzz_target;
use polang::{Node, RuntimePolicy, parse_with_policy};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let policy = RuntimePolicy::hardened(Some(4096));
    if let Ok(tree) = parse_with_policy(source, &policy) {
        let rendered = tree.to_string();
        let reparsed: Node = rendered.parse().expect("canonical form must parse");
        assert_eq!(reparsed, tree);
    }
});
