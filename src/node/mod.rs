//! Concrete node kinds and the kind-erased [`Node`] union.
//!
//! Every kind is a product over a fixed subset of the delegates plus a
//! permanent tag. Kind-specific accessors live on the concrete types, where
//! the capability is statically present; the erased [`Node`] offers fallible
//! [`Node::structure`]/[`Node::value`] accessors that report a contract
//! violation when the kind lacks the aggregate instead of pretending with
//! defaults.

mod attribute;
mod branch;
mod kind;
mod root;
mod text;
mod tombstone;

pub use {
    attribute::AttributeNode, branch::BranchNode, kind::NodeKind, root::RootNode, text::TextNode,
    tombstone::TombstoneNode,
};

use bytes::BytesMut;
use digest::Digest;

use crate::{
    delegate::{IdentityDelegate, StructuralDelegate, ValueDelegate},
    error::{Error, Result},
    hash::NodeHash,
    key::{NodeKey, Revision},
    label::DeweyId,
};

/// A node of any registered kind.
///
/// Closed tagged union: adding a kind means reserving a new tag in
/// [`NodeKind`] and a new variant here, never changing the meaning of an
/// existing one.
#[derive(Clone, Debug)]
pub enum Node<D: Digest> {
    Root(RootNode<D>),
    Branch(BranchNode<D>),
    Text(TextNode<D>),
    Attribute(AttributeNode<D>),
    Tombstone(TombstoneNode<D>),
}

impl<D: Digest> Node<D> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Root(_) => NodeKind::Root,
            Node::Branch(_) => NodeKind::Branch,
            Node::Text(_) => NodeKind::Text,
            Node::Attribute(_) => NodeKind::Attribute,
            Node::Tombstone(_) => NodeKind::Tombstone,
        }
    }

    pub fn identity(&self) -> &IdentityDelegate<D> {
        match self {
            Node::Root(n) => n.identity(),
            Node::Branch(n) => n.identity(),
            Node::Text(n) => n.identity(),
            Node::Attribute(n) => n.identity(),
            Node::Tombstone(n) => n.identity(),
        }
    }

    fn identity_mut(&mut self) -> &mut IdentityDelegate<D> {
        match self {
            Node::Root(n) => n.identity_mut(),
            Node::Branch(n) => n.identity_mut(),
            Node::Text(n) => n.identity_mut(),
            Node::Attribute(n) => n.identity_mut(),
            Node::Tombstone(n) => n.identity_mut(),
        }
    }

    pub fn node_key(&self) -> NodeKey {
        self.identity().node_key()
    }

    pub fn parent_key(&self) -> NodeKey {
        self.identity().parent_key()
    }

    pub fn has_parent(&self) -> bool {
        self.identity().has_parent()
    }

    pub fn revision(&self) -> Revision {
        self.identity().revision()
    }

    pub fn previous_revision(&self) -> Revision {
        self.identity().previous_revision()
    }

    pub fn dewey_id(&self) -> Option<&DeweyId> {
        self.identity().dewey_id()
    }

    pub fn hash(&self) -> Option<NodeHash> {
        self.identity().hash()
    }

    /// See [`IdentityDelegate::set_hash`].
    pub fn set_hash(&mut self, hash: NodeHash) {
        self.identity_mut().set_hash(hash);
    }

    /// Structural links, or a contract violation for kinds without them.
    pub fn structure(&self) -> Result<&StructuralDelegate> {
        self.structure_opt().ok_or_else(|| {
            Error::Contract(format!(
                "structural access on a {:?} node, which has no structural delegate",
                self.kind()
            ))
        })
    }

    /// Scalar payload, or a contract violation for kinds without one.
    pub fn value(&self) -> Result<&ValueDelegate> {
        self.value_opt().ok_or_else(|| {
            Error::Contract(format!(
                "value access on a {:?} node, which has no value delegate",
                self.kind()
            ))
        })
    }

    pub(crate) fn structure_opt(&self) -> Option<&StructuralDelegate> {
        match self {
            Node::Root(n) => Some(n.structure()),
            Node::Branch(n) => Some(n.structure()),
            Node::Text(n) => Some(n.structure()),
            Node::Attribute(_) | Node::Tombstone(_) => None,
        }
    }

    pub(crate) fn value_opt(&self) -> Option<&ValueDelegate> {
        match self {
            Node::Text(n) => Some(n.value()),
            Node::Attribute(n) => Some(n.value()),
            Node::Root(_) | Node::Branch(_) | Node::Tombstone(_) => None,
        }
    }

    /// Computes the content digest over the fully composed node.
    ///
    /// Pure and platform-stable: identical field values always produce the
    /// same digest. The scratch buffer is cleared and reused.
    pub fn compute_hash(&self, scratch: &mut BytesMut) -> NodeHash {
        match self {
            Node::Root(n) => n.compute_hash(scratch),
            Node::Branch(n) => n.compute_hash(scratch),
            Node::Text(n) => n.compute_hash(scratch),
            Node::Attribute(n) => n.compute_hash(scratch),
            Node::Tombstone(n) => n.compute_hash(scratch),
        }
    }

    /// Recomputes the digest and compares it against the stored one.
    ///
    /// Intended for callers that deferred verification at read time.
    pub fn verify_hash(&self, scratch: &mut BytesMut) -> Result<()> {
        let stored = self.hash().ok_or_else(|| {
            Error::Contract("cannot verify a node that has no stored digest".to_string())
        })?;

        let computed = self.compute_hash(scratch);
        if stored != computed {
            return Err(Error::Integrity {
                node_key: self.node_key(),
                expected: stored,
                computed,
            });
        }
        Ok(())
    }
}

impl<D: Digest> PartialEq for Node<D> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Root(a), Node::Root(b)) => a == b,
            (Node::Branch(a), Node::Branch(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Attribute(a), Node::Attribute(b)) => a == b,
            (Node::Tombstone(a), Node::Tombstone(b)) => a == b,
            _ => false,
        }
    }
}

impl<D: Digest> Eq for Node<D> {}

impl<D: Digest> From<RootNode<D>> for Node<D> {
    fn from(node: RootNode<D>) -> Self {
        Node::Root(node)
    }
}

impl<D: Digest> From<BranchNode<D>> for Node<D> {
    fn from(node: BranchNode<D>) -> Self {
        Node::Branch(node)
    }
}

impl<D: Digest> From<TextNode<D>> for Node<D> {
    fn from(node: TextNode<D>) -> Self {
        Node::Text(node)
    }
}

impl<D: Digest> From<AttributeNode<D>> for Node<D> {
    fn from(node: AttributeNode<D>) -> Self {
        Node::Attribute(node)
    }
}

impl<D: Digest> From<TombstoneNode<D>> for Node<D> {
    fn from(node: TombstoneNode<D>) -> Self {
        Node::Tombstone(node)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use crate::{hash::DefaultDigest, testing};

    use super::*;

    #[proptest(fork = false)]
    fn test_erased_accessors_match_kind_layout(
        #[strategy(testing::nodes::<DefaultDigest>())] node: Node<DefaultDigest>,
    ) {
        prop_assert_eq!(node.structure().is_ok(), node.kind().has_structure());
        prop_assert_eq!(node.value().is_ok(), node.kind().has_value());
    }

    #[proptest(fork = false)]
    fn test_accessors_on_identity_only_kind_are_contract_violations(
        #[strategy(testing::tombstone_nodes::<DefaultDigest>())] node: TombstoneNode<DefaultDigest>,
    ) {
        let node: Node<DefaultDigest> = node.into();
        prop_assert!(matches!(node.structure(), Err(Error::Contract(_))));
        prop_assert!(matches!(node.value(), Err(Error::Contract(_))));
    }

    #[proptest(fork = false)]
    fn test_verify_hash_after_seal(
        #[strategy(testing::nodes::<DefaultDigest>())] node: Node<DefaultDigest>,
    ) {
        let mut node = node;
        let mut scratch = bytes::BytesMut::new();

        prop_assert!(matches!(
            node.verify_hash(&mut scratch),
            Err(Error::Contract(_))
        ));

        let hash = node.compute_hash(&mut scratch);
        node.set_hash(hash);
        node.verify_hash(&mut scratch)?;
    }

    #[proptest(fork = false)]
    fn test_identical_nodes_hash_identically(
        #[strategy(testing::nodes::<DefaultDigest>())] node: Node<DefaultDigest>,
    ) {
        let twin = node.clone();
        let mut scratch = bytes::BytesMut::new();

        prop_assert_eq!(
            node.compute_hash(&mut scratch),
            twin.compute_hash(&mut scratch)
        );
    }
}
