use bytes::BytesMut;
use digest::Digest;

use crate::{
    delegate::{IdentityDelegate, StructuralDelegate},
    hash::NodeHash,
    key::{NodeKey, Revision},
    node::NodeKind,
};

/// The tree root container: identity plus structural links, no payload.
///
/// Its parent key is [`NodeKey::NULL`] by convention; the delegate does not
/// enforce that, since the page layer owns tree-shape invariants.
#[derive(Clone, Debug)]
pub struct RootNode<D: Digest> {
    identity: IdentityDelegate<D>,
    structure: StructuralDelegate,
}

impl<D: Digest> RootNode<D> {
    pub const KIND: NodeKind = NodeKind::Root;

    pub fn new(identity: IdentityDelegate<D>, structure: StructuralDelegate) -> Self {
        RootNode {
            identity,
            structure,
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

    pub fn has_first_child(&self) -> bool {
        self.structure.has_first_child()
    }

    pub fn child_count(&self) -> u64 {
        self.structure.child_count()
    }

    pub fn descendant_count(&self) -> u64 {
        self.structure.descendant_count()
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
        NodeHash::digest::<D>(scratch)
    }
}

impl<D: Digest> PartialEq for RootNode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.structure == other.structure
    }
}

impl<D: Digest> Eq for RootNode<D> {}
