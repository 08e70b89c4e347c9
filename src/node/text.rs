use bytes::BytesMut;
use digest::Digest;

use crate::{
    delegate::{IdentityDelegate, StructuralDelegate, ValueDelegate},
    hash::NodeHash,
    key::{NodeKey, Revision},
    node::NodeKind,
};

/// String/scalar leaf: identity, structural links and a byte payload.
///
/// The digest covers the keys, the structural fields and the raw value
/// bytes, in that order; the compression marker never contributes.
#[derive(Clone, Debug)]
pub struct TextNode<D: Digest> {
    identity: IdentityDelegate<D>,
    structure: StructuralDelegate,
    value: ValueDelegate,
}

impl<D: Digest> TextNode<D> {
    pub const KIND: NodeKind = NodeKind::Text;

    pub fn new(
        identity: IdentityDelegate<D>,
        structure: StructuralDelegate,
        value: ValueDelegate,
    ) -> Self {
        TextNode {
            identity,
            structure,
            value,
        }
    }

    pub fn identity(&self) -> &IdentityDelegate<D> {
        &self.identity
    }

    pub(crate) fn identity_mut(&mut self) -> &mut IdentityDelegate<D> {
        &mut self.identity
    }

    pub fn structure(&self) -> &StructuralDelegate {
        &self.structure
    }

    pub fn value(&self) -> &ValueDelegate {
        &self.value
    }

    pub fn node_key(&self) -> NodeKey {
        self.identity.node_key()
    }

    pub fn parent_key(&self) -> NodeKey {
        self.identity.parent_key()
    }

    pub fn has_parent(&self) -> bool {
        self.identity.has_parent()
    }

    pub fn first_child_key(&self) -> NodeKey {
        self.structure.first_child_key()
    }

    pub fn left_sibling_key(&self) -> NodeKey {
        self.structure.left_sibling_key()
    }

    pub fn right_sibling_key(&self) -> NodeKey {
        self.structure.right_sibling_key()
    }

    pub fn has_first_child(&self) -> bool {
        self.structure.has_first_child()
    }

    pub fn has_left_sibling(&self) -> bool {
        self.structure.has_left_sibling()
    }

    pub fn has_right_sibling(&self) -> bool {
        self.structure.has_right_sibling()
    }

    pub fn child_count(&self) -> u64 {
        self.structure.child_count()
    }

    pub fn descendant_count(&self) -> u64 {
        self.structure.descendant_count()
    }

    pub fn raw_value(&self) -> &[u8] {
        self.value.raw_value()
    }

    pub fn is_compressed(&self) -> bool {
        self.value.is_compressed()
    }

    pub fn revision(&self) -> Revision {
        self.identity.revision()
    }

    pub fn hash(&self) -> Option<NodeHash> {
        self.identity.hash()
    }

    pub fn set_hash(&mut self, hash: NodeHash) {
        self.identity.set_hash(hash);
    }

    pub fn compute_hash(&self, scratch: &mut BytesMut) -> NodeHash {
        scratch.clear();
        self.identity.hash_into(scratch);
        self.structure.hash_into(scratch);
        self.value.hash_into(scratch);
        NodeHash::digest::<D>(scratch)
    }
}

impl<D: Digest> PartialEq for TextNode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.structure == other.structure
            && self.value == other.value
    }
}

impl<D: Digest> Eq for TextNode<D> {}
