use bytes::BufMut;
use proptest::prelude::*;

use crate::{
    error::{Error, Result},
    key::NodeKey,
};

/// Tree-shape links of a node: the four sibling/child key fields plus the
/// two subtree counters.
///
/// This is a passive holder. Structural mutation (inserting or removing
/// children, relinking siblings) belongs to the external page/tree layer,
/// which is obligated to keep `descendant_count` equal to the sum over
/// children of `1 + child.descendant_count` after every change. The `has_*`
/// predicates are O(1) sentinel comparisons and never look anything up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralDelegate {
    first_child_key: NodeKey,
    left_sibling_key: NodeKey,
    right_sibling_key: NodeKey,
    child_count: u64,
    descendant_count: u64,
}

impl StructuralDelegate {
    /// Builds the structural aggregate. Rejects a descendant count smaller
    /// than the child count; each key field is either a real key or
    /// [`NodeKey::NULL`].
    pub fn new(
        first_child_key: NodeKey,
        right_sibling_key: NodeKey,
        left_sibling_key: NodeKey,
        child_count: u64,
        descendant_count: u64,
    ) -> Result<Self> {
        if descendant_count < child_count {
            return Err(Error::Contract(format!(
                "descendant count {descendant_count} is smaller than child count {child_count}"
            )));
        }

        Ok(StructuralDelegate {
            first_child_key,
            left_sibling_key,
            right_sibling_key,
            child_count,
            descendant_count,
        })
    }

    /// Links of a node with no children and no siblings.
    pub fn leaf() -> Self {
        StructuralDelegate {
            first_child_key: NodeKey::NULL,
            left_sibling_key: NodeKey::NULL,
            right_sibling_key: NodeKey::NULL,
            child_count: 0,
            descendant_count: 0,
        }
    }

    pub fn first_child_key(&self) -> NodeKey {
        self.first_child_key
    }

    pub fn left_sibling_key(&self) -> NodeKey {
        self.left_sibling_key
    }

    pub fn right_sibling_key(&self) -> NodeKey {
        self.right_sibling_key
    }

    pub fn has_first_child(&self) -> bool {
        !self.first_child_key.is_null()
    }

    pub fn has_left_sibling(&self) -> bool {
        !self.left_sibling_key.is_null()
    }

    pub fn has_right_sibling(&self) -> bool {
        !self.right_sibling_key.is_null()
    }

    pub fn child_count(&self) -> u64 {
        self.child_count
    }

    pub fn descendant_count(&self) -> u64 {
        self.descendant_count
    }

    /// Appends the structural fields to the hash scratch buffer in the same
    /// fixed order the wire format uses.
    pub(crate) fn hash_into(&self, scratch: &mut impl BufMut) {
        scratch.put_u64(self.first_child_key.to_raw());
        scratch.put_u64(self.left_sibling_key.to_raw());
        scratch.put_u64(self.right_sibling_key.to_raw());
        scratch.put_u64(self.child_count);
        scratch.put_u64(self.descendant_count);
    }
}

impl Arbitrary for StructuralDelegate {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        let key_or_null = || prop_oneof![Just(NodeKey::NULL), any::<NodeKey>()];

        (
            key_or_null(),
            key_or_null(),
            key_or_null(),
            0u64..1024,
            0u64..4096,
        )
            .prop_map(|(first, right, left, children, extra_descendants)| {
                StructuralDelegate::new(first, right, left, children, children + extra_descendants)
                    .expect("generated counts satisfy the invariant")
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use crate::testing::{TreeBuilder, TreeOp};

    use super::*;

    #[test]
    fn test_descendant_count_below_child_count_is_rejected() {
        let result = StructuralDelegate::new(NodeKey::NULL, NodeKey::NULL, NodeKey::NULL, 3, 2);
        assert!(matches!(result, Err(Error::Contract(_))));
    }

    #[test]
    fn test_leaf_has_no_links() {
        let leaf = StructuralDelegate::leaf();
        assert!(!leaf.has_first_child());
        assert!(!leaf.has_left_sibling());
        assert!(!leaf.has_right_sibling());
        assert_eq!(leaf.child_count(), 0);
        assert_eq!(leaf.descendant_count(), 0);
    }

    #[proptest(fork = false)]
    fn test_predicates_are_sentinel_comparisons(links: StructuralDelegate) {
        prop_assert_eq!(links.has_first_child(), !links.first_child_key().is_null());
        prop_assert_eq!(links.has_left_sibling(), !links.left_sibling_key().is_null());
        prop_assert_eq!(links.has_right_sibling(), !links.right_sibling_key().is_null());
    }

    #[proptest(fork = false)]
    fn test_counts_satisfy_invariant(links: StructuralDelegate) {
        prop_assert!(links.descendant_count() >= links.child_count());
    }

    /// Drives the reference mutation layer through an arbitrary sequence of
    /// child insertions and leaf removals, then checks that every node's
    /// descendant count equals the sum over its children of
    /// `1 + child.descendant_count`, and that sibling links stay consistent.
    #[proptest(fork = false)]
    fn test_descendant_counts_survive_arbitrary_mutations(
        #[strategy(proptest::collection::vec(any::<TreeOp>(), 0..60))] ops: Vec<TreeOp>,
    ) {
        let mut tree = TreeBuilder::new();
        for op in ops {
            tree.apply(op);
        }

        let result = tree.check_invariants();
        prop_assert!(result.is_ok(), "{}", result.unwrap_err());
    }
}
