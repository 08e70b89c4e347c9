use bytes::BytesMut;
use digest::Digest;

use crate::{
    delegate::{IdentityDelegate, ValueDelegate},
    hash::NodeHash,
    key::{NodeKey, Revision},
    node::NodeKind,
};

/// Out-of-tree scalar: identity plus payload, no structural links.
///
/// Attributes hang off their owner through the parent key alone, so the
/// kind has no child or sibling accessors at all; it cannot have children
/// by construction rather than by zeroed fields.
#[derive(Clone, Debug)]
pub struct AttributeNode<D: Digest> {
    identity: IdentityDelegate<D>,
    value: ValueDelegate,
}

impl<D: Digest> AttributeNode<D> {
    pub const KIND: NodeKind = NodeKind::Attribute;

    pub fn new(identity: IdentityDelegate<D>, value: ValueDelegate) -> Self {
        AttributeNode { identity, value }
    }

    pub fn identity(&self) -> &IdentityDelegate<D> {
        &self.identity
    }

    pub(crate) fn identity_mut(&mut self) -> &mut IdentityDelegate<D> {
        &mut self.identity
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
        self.value.hash_into(scratch);
        NodeHash::digest::<D>(scratch)
    }
}

impl<D: Digest> PartialEq for AttributeNode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.value == other.value
    }
}

impl<D: Digest> Eq for AttributeNode<D> {}
