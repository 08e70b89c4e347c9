use std::marker::PhantomData;

use bytes::BufMut;
use digest::Digest;
use proptest::prelude::*;

use crate::{
    error::{Error, Result},
    hash::NodeHash,
    key::{NodeKey, Revision},
    label::DeweyId,
};

/// Per-node identity and integrity anchor.
///
/// Carries the node's key, its parent link, the owning and
/// previously-modified revision numbers, the optional hierarchical label,
/// and the content digest. The digest starts absent and stays mutable until
/// the page layer seals the node into a revision; everything else is fixed
/// at construction. The hash function is part of the identity contract and
/// rides along as the `D` type parameter.
pub struct IdentityDelegate<D: Digest> {
    node_key: NodeKey,
    parent_key: NodeKey,
    hash: Option<NodeHash>,
    previous_revision: Revision,
    revision: Revision,
    dewey_id: Option<DeweyId>,
    _hasher: PhantomData<D>,
}

impl<D: Digest> IdentityDelegate<D> {
    /// Builds the identity aggregate.
    ///
    /// The node's own key must be a real key; passing [`NodeKey::NULL`] is a
    /// contract violation and is reported, never clamped. The parent key may
    /// be `NULL` (tree root). `previous_revision` is the revision the node
    /// was last modified in and `revision` the owning one, both `NULL` for a
    /// node that has not been committed yet.
    pub fn new(
        node_key: NodeKey,
        parent_key: NodeKey,
        previous_revision: Revision,
        revision: Revision,
        dewey_id: Option<DeweyId>,
    ) -> Result<Self> {
        if node_key.is_null() {
            return Err(Error::Contract(
                "a node's own key must not be the NULL sentinel".to_string(),
            ));
        }

        Ok(IdentityDelegate {
            node_key,
            parent_key,
            hash: None,
            previous_revision,
            revision,
            dewey_id,
            _hasher: PhantomData,
        })
    }

    pub fn node_key(&self) -> NodeKey {
        self.node_key
    }

    pub fn parent_key(&self) -> NodeKey {
        self.parent_key
    }

    pub fn has_parent(&self) -> bool {
        !self.parent_key.is_null()
    }

    pub fn hash(&self) -> Option<NodeHash> {
        self.hash
    }

    /// Replaces the stored digest unconditionally.
    ///
    /// Callers must have recomputed over the entire composed node; partial
    /// updates do not exist.
    pub fn set_hash(&mut self, hash: NodeHash) {
        self.hash = Some(hash);
    }

    pub fn previous_revision(&self) -> Revision {
        self.previous_revision
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn dewey_id(&self) -> Option<&DeweyId> {
        self.dewey_id.as_ref()
    }

    /// Appends the identity-relevant fields (node key, parent key) to the
    /// hash scratch buffer in fixed big-endian order.
    pub(crate) fn hash_into(&self, scratch: &mut impl BufMut) {
        scratch.put_u64(self.node_key.to_raw());
        scratch.put_u64(self.parent_key.to_raw());
    }
}

impl<D: Digest> Clone for IdentityDelegate<D> {
    fn clone(&self) -> Self {
        IdentityDelegate {
            node_key: self.node_key,
            parent_key: self.parent_key,
            hash: self.hash,
            previous_revision: self.previous_revision,
            revision: self.revision,
            dewey_id: self.dewey_id.clone(),
            _hasher: PhantomData,
        }
    }
}

impl<D: Digest> PartialEq for IdentityDelegate<D> {
    fn eq(&self, other: &Self) -> bool {
        self.node_key == other.node_key
            && self.parent_key == other.parent_key
            && self.hash == other.hash
            && self.previous_revision == other.previous_revision
            && self.revision == other.revision
            && self.dewey_id == other.dewey_id
    }
}

impl<D: Digest> Eq for IdentityDelegate<D> {}

impl<D: Digest> std::fmt::Debug for IdentityDelegate<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityDelegate")
            .field("node_key", &self.node_key)
            .field("parent_key", &self.parent_key)
            .field("hash", &self.hash)
            .field("previous_revision", &self.previous_revision)
            .field("revision", &self.revision)
            .field("dewey_id", &self.dewey_id)
            .finish()
    }
}

impl<D: Digest + 'static> Arbitrary for IdentityDelegate<D> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            any::<NodeKey>(),
            prop_oneof![Just(NodeKey::NULL), any::<NodeKey>()],
            prop_oneof![Just(Revision::NULL), any::<Revision>()],
            prop_oneof![Just(Revision::NULL), any::<Revision>()],
            any::<Option<DeweyId>>(),
        )
            .prop_map(|(node_key, parent_key, previous, revision, dewey_id)| {
                IdentityDelegate::new(node_key, parent_key, previous, revision, dewey_id)
                    .expect("generated keys are never NULL")
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use crate::hash::DefaultDigest;

    use super::*;

    #[test]
    fn test_null_own_key_is_rejected() {
        let result = IdentityDelegate::<DefaultDigest>::new(
            NodeKey::NULL,
            NodeKey::new(1),
            Revision::NULL,
            Revision::NULL,
            None,
        );

        assert!(matches!(result, Err(Error::Contract(_))));
    }

    #[proptest(fork = false)]
    fn test_has_parent_is_sentinel_comparison(identity: IdentityDelegate<DefaultDigest>) {
        prop_assert_eq!(identity.has_parent(), !identity.parent_key().is_null());
    }

    #[proptest(fork = false)]
    fn test_hash_starts_absent_and_set_replaces(
        identity: IdentityDelegate<DefaultDigest>,
        first: NodeHash,
        second: NodeHash,
    ) {
        let mut identity = identity;
        prop_assert_eq!(identity.hash(), None);

        identity.set_hash(first);
        prop_assert_eq!(identity.hash(), Some(first));

        identity.set_hash(second);
        prop_assert_eq!(identity.hash(), Some(second));
    }
}
