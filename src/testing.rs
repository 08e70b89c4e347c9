//! Strategies, test doubles and a reference tree-mutation layer.
//!
//! Node strategies generate "wire-clean" nodes: unsealed, uncommitted
//! (`Revision::NULL` everywhere) and unlabeled, so a serialize/deserialize
//! round trip through a default [`MemoryPageTrx`] reproduces them
//! field-for-field. Keys are bounded well below the sentinel so tests can
//! perturb them freely.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use digest::Digest;
use proptest::{collection::vec, prelude::*};

use crate::{
    delegate::{IdentityDelegate, StructuralDelegate, ValueDelegate},
    key::{NodeKey, Revision},
    node::{AttributeNode, BranchNode, Node, NodeKind, RootNode, TextNode, TombstoneNode},
    page::PageReadTrx,
};

/// In-memory stand-in for the copy-on-write page layer's read handle.
#[derive(Debug, Clone)]
pub struct MemoryPageTrx {
    revision: Revision,
    aux: HashMap<NodeKey, Bytes>,
}

impl MemoryPageTrx {
    pub fn at_revision(revision: Revision) -> Self {
        MemoryPageTrx {
            revision,
            aux: HashMap::new(),
        }
    }

    pub fn insert_aux(&mut self, key: NodeKey, payload: impl Into<Bytes>) {
        self.aux.insert(key, payload.into());
    }
}

impl Default for MemoryPageTrx {
    fn default() -> Self {
        Self::at_revision(Revision::NULL)
    }
}

impl PageReadTrx for MemoryPageTrx {
    fn revision(&self) -> Revision {
        self.revision
    }

    fn resolve_aux(&self, key: NodeKey) -> Option<Bytes> {
        self.aux.get(&key).cloned()
    }
}

/// Real (non-sentinel) node keys, bounded so tests can flip low bits
/// without colliding with [`NodeKey::NULL`].
pub fn node_keys() -> impl Strategy<Value = NodeKey> {
    (0u64..1 << 48).prop_map(NodeKey::new)
}

/// A link field: a real key or the NULL sentinel.
pub fn link_keys() -> impl Strategy<Value = NodeKey> {
    prop_oneof![Just(NodeKey::NULL), node_keys()]
}

pub fn identities<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = IdentityDelegate<D>> {
    (node_keys(), link_keys()).prop_map(|(node_key, parent_key)| {
        IdentityDelegate::new(node_key, parent_key, Revision::NULL, Revision::NULL, None)
            .expect("bounded keys are never NULL")
    })
}

pub fn structures() -> impl Strategy<Value = StructuralDelegate> {
    (link_keys(), link_keys(), link_keys(), 0u64..512, 0u64..2048).prop_map(
        |(first, right, left, children, extra)| {
            StructuralDelegate::new(first, right, left, children, children + extra)
                .expect("generated counts satisfy the invariant")
        },
    )
}

pub fn values() -> impl Strategy<Value = ValueDelegate> {
    (vec(any::<u8>(), 0..256), any::<bool>())
        .prop_map(|(raw, compressed)| ValueDelegate::new(raw, compressed))
}

pub fn root_nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = RootNode<D>> {
    (identities(), structures()).prop_map(|(identity, structure)| RootNode::new(identity, structure))
}

pub fn branch_nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = BranchNode<D>> {
    (identities(), structures())
        .prop_map(|(identity, structure)| BranchNode::new(identity, structure))
}

pub fn text_nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = TextNode<D>> {
    (identities(), structures(), values())
        .prop_map(|(identity, structure, value)| TextNode::new(identity, structure, value))
}

pub fn attribute_nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = AttributeNode<D>> {
    (identities(), values()).prop_map(|(identity, value)| AttributeNode::new(identity, value))
}

pub fn tombstone_nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = TombstoneNode<D>> {
    identities().prop_map(TombstoneNode::new)
}

/// Nodes of one specific kind, erased.
pub fn kind_nodes<D: Digest + 'static + std::fmt::Debug>(kind: NodeKind) -> BoxedStrategy<Node<D>> {
    match kind {
        NodeKind::Root => root_nodes().prop_map(Node::from).boxed(),
        NodeKind::Branch => branch_nodes().prop_map(Node::from).boxed(),
        NodeKind::Text => text_nodes().prop_map(Node::from).boxed(),
        NodeKind::Attribute => attribute_nodes().prop_map(Node::from).boxed(),
        NodeKind::Tombstone => tombstone_nodes().prop_map(Node::from).boxed(),
    }
}

/// Nodes of every registered kind.
pub fn nodes<D: Digest + 'static + std::fmt::Debug>() -> impl Strategy<Value = Node<D>> {
    prop_oneof![
        root_nodes().prop_map(Node::from),
        branch_nodes().prop_map(Node::from),
        text_nodes().prop_map(Node::from),
        attribute_nodes().prop_map(Node::from),
        tombstone_nodes().prop_map(Node::from),
    ]
}

/// One structural mutation against a [`TreeBuilder`].
///
/// Indices are resolved against whatever nodes exist when the operation is
/// applied, so any generated sequence is valid.
#[derive(Debug, Clone)]
pub enum TreeOp {
    InsertChild { parent: prop::sample::Index },
    RemoveLeaf { leaf: prop::sample::Index },
}

impl Arbitrary for TreeOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            any::<prop::sample::Index>().prop_map(|parent| TreeOp::InsertChild { parent }),
            any::<prop::sample::Index>().prop_map(|leaf| TreeOp::RemoveLeaf { leaf }),
        ]
        .boxed()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<u64>,
    children: Vec<u64>,
    descendant_count: u64,
}

/// Reference implementation of the external tree-mutation layer.
///
/// Maintains parent/child/sibling links and keeps `descendant_count`
/// incrementally up to date along the ancestor chain after every change,
/// the way the page layer is obligated to. [`TreeBuilder::check_invariants`]
/// then verifies the stored counters against a from-scratch recomputation
/// and re-derives every node's [`StructuralDelegate`] through the public
/// constructor.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    slots: BTreeMap<u64, Slot>,
    next_key: u64,
}

impl TreeBuilder {
    const ROOT: u64 = 0;

    pub fn new() -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(
            Self::ROOT,
            Slot {
                parent: None,
                children: Vec::new(),
                descendant_count: 0,
            },
        );

        TreeBuilder { slots, next_key: 1 }
    }

    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn apply(&mut self, op: TreeOp) {
        match op {
            TreeOp::InsertChild { parent } => {
                let keys: Vec<u64> = self.slots.keys().copied().collect();
                let parent_key = keys[parent.index(keys.len())];
                self.insert_child(parent_key);
            }
            TreeOp::RemoveLeaf { leaf } => {
                let leaves: Vec<u64> = self
                    .slots
                    .iter()
                    .filter(|(key, slot)| **key != Self::ROOT && slot.children.is_empty())
                    .map(|(key, _)| *key)
                    .collect();

                if leaves.is_empty() {
                    return;
                }
                self.remove_leaf(leaves[leaf.index(leaves.len())]);
            }
        }
    }

    /// Appends a child under `parent_key` and returns the new node's key.
    pub fn insert_child(&mut self, parent_key: u64) -> u64 {
        let key = self.next_key;
        self.next_key += 1;

        self.slots.insert(
            key,
            Slot {
                parent: Some(parent_key),
                children: Vec::new(),
                descendant_count: 0,
            },
        );
        self.slots
            .get_mut(&parent_key)
            .expect("children are only inserted under live nodes")
            .children
            .push(key);
        self.bump_ancestors(parent_key, 1);
        key
    }

    /// Unlinks a childless non-root node.
    pub fn remove_leaf(&mut self, key: u64) {
        debug_assert_ne!(key, Self::ROOT);
        debug_assert!(self.slots[&key].children.is_empty());

        let parent = self
            .slots
            .remove(&key)
            .and_then(|slot| slot.parent)
            .expect("a non-root leaf has a parent");

        let parent_slot = self
            .slots
            .get_mut(&parent)
            .expect("the removed leaf's parent exists");
        parent_slot.children.retain(|child| *child != key);
        self.bump_ancestors(parent, -1);
    }

    fn bump_ancestors(&mut self, from: u64, delta: i64) {
        let mut cursor = Some(from);
        while let Some(key) = cursor {
            let slot = self
                .slots
                .get_mut(&key)
                .expect("ancestor chains only contain live nodes");
            slot.descendant_count = slot
                .descendant_count
                .checked_add_signed(delta)
                .expect("descendant counts never go negative");
            cursor = slot.parent;
        }
    }

    /// Re-derives the structural delegate of one node from the link state.
    pub fn delegate_for(&self, key: u64) -> crate::error::Result<StructuralDelegate> {
        let slot = &self.slots[&key];

        let first_child = slot
            .children
            .first()
            .map(|child| NodeKey::new(*child))
            .unwrap_or(NodeKey::NULL);

        let (left, right) = match slot.parent {
            None => (NodeKey::NULL, NodeKey::NULL),
            Some(parent) => {
                let siblings = &self.slots[&parent].children;
                let at = siblings
                    .iter()
                    .position(|sibling| *sibling == key)
                    .expect("a child is linked from its parent");

                let left = if at > 0 {
                    NodeKey::new(siblings[at - 1])
                } else {
                    NodeKey::NULL
                };
                let right = siblings
                    .get(at + 1)
                    .map(|sibling| NodeKey::new(*sibling))
                    .unwrap_or(NodeKey::NULL);
                (left, right)
            }
        };

        StructuralDelegate::new(
            first_child,
            right,
            left,
            slot.children.len() as u64,
            slot.descendant_count,
        )
    }

    /// Checks the incrementally maintained counters against a from-scratch
    /// recomputation, and the delegate predicates against the link state.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (key, slot) in &self.slots {
            let expected: u64 = slot
                .children
                .iter()
                .map(|child| 1 + self.slots[child].descendant_count)
                .sum();

            if slot.descendant_count != expected {
                return Err(format!(
                    "node {key}: descendant count {} but children sum to {expected}",
                    slot.descendant_count
                ));
            }

            let delegate = self.delegate_for(*key).map_err(|e| e.to_string())?;

            if delegate.child_count() != slot.children.len() as u64 {
                return Err(format!("node {key}: child count drifted"));
            }
            if delegate.has_first_child() != !slot.children.is_empty() {
                return Err(format!("node {key}: first-child predicate drifted"));
            }
            if delegate.descendant_count() < delegate.child_count() {
                return Err(format!("node {key}: count invariant violated"));
            }
        }
        Ok(())
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_trx_resolves_inserted_aux_payloads() {
        let mut trx = MemoryPageTrx::at_revision(Revision::new(7));
        trx.insert_aux(NodeKey::new(42), vec![1u8, 2, 3]);

        assert_eq!(trx.revision(), Revision::new(7));
        assert_eq!(
            trx.resolve_aux(NodeKey::new(42)),
            Some(Bytes::from(vec![1u8, 2, 3]))
        );
        assert_eq!(trx.resolve_aux(NodeKey::new(43)), None);
    }

    #[test]
    fn test_default_trx_reads_the_uncommitted_revision() {
        assert!(MemoryPageTrx::default().revision().is_null());
    }

    #[test]
    fn test_tree_builder_counts_a_small_tree() {
        let mut tree = TreeBuilder::new();

        // Three children of the root, then one grandchild.
        let first = tree.insert_child(0);
        let second = tree.insert_child(0);
        tree.insert_child(0);
        let grandchild = tree.insert_child(second);

        assert_eq!(tree.node_count(), 5);
        tree.check_invariants().unwrap();

        let root = tree.delegate_for(0).unwrap();
        assert_eq!(root.child_count(), 3);
        assert_eq!(root.descendant_count(), 4);
        assert!(root.has_first_child());
        assert!(!root.has_left_sibling());

        let middle = tree.delegate_for(second).unwrap();
        assert!(middle.has_left_sibling());
        assert!(middle.has_right_sibling());
        assert_eq!(middle.first_child_key(), NodeKey::new(grandchild));
        assert_eq!(middle.descendant_count(), 1);

        tree.remove_leaf(grandchild);
        tree.remove_leaf(first);
        tree.check_invariants().unwrap();

        let root = tree.delegate_for(0).unwrap();
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.descendant_count(), 2);
    }
}
