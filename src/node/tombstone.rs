use bytes::BytesMut;
use digest::Digest;

use crate::{
    delegate::IdentityDelegate,
    hash::NodeHash,
    key::{NodeKey, Revision},
    node::NodeKind,
};

/// Copy-on-write deletion marker: identity only.
#[derive(Clone, Debug)]
pub struct TombstoneNode<D: Digest> {
    identity: IdentityDelegate<D>,
}

impl<D: Digest> TombstoneNode<D> {
    pub const KIND: NodeKind = NodeKind::Tombstone;

    pub fn new(identity: IdentityDelegate<D>) -> Self {
        TombstoneNode { identity }
    }

    pub fn identity(&self) -> &IdentityDelegate<D> {
        &self.identity
    }

    pub(crate) fn identity_mut(&mut self) -> &mut IdentityDelegate<D> {
        &mut self.identity
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
        NodeHash::digest::<D>(scratch)
    }
}

impl<D: Digest> PartialEq for TombstoneNode<D> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl<D: Digest> Eq for TombstoneNode<D> {}
