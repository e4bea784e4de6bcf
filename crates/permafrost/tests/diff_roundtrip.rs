//! Property tests for the differ and diff application.

use permafrost::{Engine, Node, Path};
use proptest::prelude::*;

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        Just(Node::Null),
        any::<bool>().prop_map(Node::from),
        (-1000i64..1000).prop_map(|n| Node::from(n as f64)),
        "[a-z]{0,5}".prop_map(Node::from),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Node::array),
            proptest::collection::vec(("[a-d]{1,2}", inner), 0..4)
                .prop_map(|entries| Node::from_entries(entries)),
        ]
    })
}

proptest! {
    /// diff(b, a) applied to a rebuilds b, for arbitrary tree pairs.
    #[test]
    fn apply_diff_of_diff_rebuilds_the_target(a in arb_node(), b in arb_node()) {
        let engine = Engine::new();
        match engine.diff(&b, &a) {
            None => prop_assert_eq!(&a, &b),
            Some(patch) => {
                let rebuilt = engine.apply_diff(&a, &Path::root(), patch);
                prop_assert_eq!(rebuilt, b);
            }
        }
    }

    /// Replacing a tree with an equal-content copy returns the original
    /// reference, whatever the tree.
    #[test]
    fn replacing_with_equal_content_is_identity(a in arb_node()) {
        let engine = Engine::new();
        let copy = engine.clone_tree(&a);
        let out = engine.replace(&a, &Path::root(), copy);
        prop_assert!(Node::same(&out, &a));
    }

    /// A diff applied to the tree it was computed against touches nothing
    /// it does not mention: applying it to the *source* tree returns the
    /// source itself when old and new agree.
    #[test]
    fn self_diff_applies_as_a_no_op(a in arb_node()) {
        let engine = Engine::new();
        let copy = engine.clone_tree(&a);
        match engine.diff(&copy, &a) {
            None => {}
            Some(patch) => {
                let out = engine.apply_diff(&a, &Path::root(), patch);
                prop_assert!(Node::same(&out, &a));
            }
        }
    }
}
