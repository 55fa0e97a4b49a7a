use std::collections::BTreeSet;

use crate::ast::{Node, Operand, Operator};

/// Every column name referenced anywhere in the tree.
#[must_use]
pub fn collect_column_names(node: &Node) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    node.walk(|node| {
        if let Node::Operand(Operand::Column { name }) = node {
            names.insert(name.clone());
        }
    });
    names
}

/// Every operation name called anywhere in the tree.
#[must_use]
pub fn collect_function_names(node: &Node) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    node.walk(|node| {
        if let Node::Operator(Operator::Call(call)) = node {
            names.insert(call.name().to_owned());
        }
    });
    names
}

/// Referenced columns that are absent from `available`.
#[must_use]
pub fn missing_columns(node: &Node, available: &BTreeSet<String>) -> BTreeSet<String> {
    collect_column_names(node)
        .into_iter()
        .filter(|name| !available.contains(name))
        .collect()
}

/// `true` iff every referenced column is in `available`.
#[must_use]
pub fn node_is_selectable(node: &Node, available: &BTreeSet<String>) -> bool {
    collect_column_names(node).is_subset(available)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{collect_column_names, collect_function_names, missing_columns, node_is_selectable};
    use crate::ast::{InfixOp, Node, PrefixOp};

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn sample() -> Node {
        // sum(a - b) * -a + 'a'
        Node::infix(
            InfixOp::Add,
            Node::infix(
                InfixOp::Mul,
                Node::call(
                    "sum",
                    vec![Node::infix(InfixOp::Sub, Node::column("a"), Node::column("b"))],
                )
                .expect("call"),
                Node::prefix(PrefixOp::Neg, Node::column("a")),
            ),
            Node::string("a"),
        )
    }

    #[test]
    fn column_names_are_deduplicated_and_skip_string_literals() {
        assert_eq!(collect_column_names(&sample()), set(&["a", "b"]));
    }

    #[test]
    fn literal_only_tree_references_no_columns() {
        let tree = Node::infix(InfixOp::Add, Node::integer(1), Node::float(2.0));
        assert!(collect_column_names(&tree).is_empty());
        assert!(node_is_selectable(&tree, &BTreeSet::new()));
    }

    #[test]
    fn function_names_are_collected_separately() {
        assert_eq!(collect_function_names(&sample()), set(&["sum"]));
        assert!(!collect_column_names(&sample()).contains("sum"));
    }

    #[test]
    fn selectability_is_a_subset_check() {
        assert!(node_is_selectable(&sample(), &set(&["a", "b"])));
        assert!(node_is_selectable(&sample(), &set(&["a", "b", "z"])));
        assert!(!node_is_selectable(&sample(), &set(&["a"])));
        assert_eq!(missing_columns(&sample(), &set(&["a"])), set(&["b"]));
    }

    #[test]
    fn deep_trees_do_not_recurse() {
        let mut tree = Node::column("x");
        for _ in 0..100_000 {
            tree = Node::prefix(PrefixOp::Neg, tree);
        }
        assert_eq!(collect_column_names(&tree), set(&["x"]));
        // Dropping a tree this deep would recurse; leak it instead.
        std::mem::forget(tree);
    }
}
