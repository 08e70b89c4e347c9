//! The kind registry: the single source of wire-format truth.
//!
//! Every kind tag is permanently bound to one field layout and one
//! serialize/deserialize pair. The dispatch table is the `match` below,
//! fixed at compile time and never mutated at runtime; adding a kind means
//! reserving a fresh tag, never touching the meaning of an existing one,
//! because sealed revisions containing the old tag outlive any release.
//!
//! Record layout, always in this order:
//!
//! 1. kind tag (`u8`)
//! 2. node key (`u64`)
//! 3. parent key (`u64`, `NULL` as `u64::MAX`)
//! 4. structural block, iff the kind carries structural links:
//!    first child, left sibling, right sibling, child count,
//!    descendant count (`u64` each)
//! 5. value block, iff the kind carries a payload: length word
//!    (`u32`, top bit = compression marker) then the raw bytes
//! 6. digest (32 bytes), always last
//!
//! The owning revision, `previous_revision` and the DeweyID are sidecar
//! state of the page layer and deliberately absent from the record; a
//! deserialized node is stamped with the transaction's revision and carries
//! no label.

use bytes::{Buf, BufMut, BytesMut};
use digest::Digest;

use crate::{
    codec,
    delegate::{IdentityDelegate, StructuralDelegate, ValueDelegate},
    error::{Error, Result},
    hash::NodeHash,
    key::{NodeKey, Revision},
    node::{AttributeNode, BranchNode, Node, RootNode, TextNode, TombstoneNode},
    page::PageReadTrx,
};

/// Stable tag of a concrete node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum NodeKind {
    Root = 1,
    Branch = 2,
    Text = 3,
    Attribute = 4,
    Tombstone = 5,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Root,
        NodeKind::Branch,
        NodeKind::Text,
        NodeKind::Attribute,
        NodeKind::Tombstone,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Maps a tag byte back to its kind. Anything outside the registered
    /// set is rejected, never silently coerced.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(NodeKind::Root),
            2 => Ok(NodeKind::Branch),
            3 => Ok(NodeKind::Text),
            4 => Ok(NodeKind::Attribute),
            5 => Ok(NodeKind::Tombstone),
            _ => Err(Error::UnknownKind { tag }),
        }
    }

    /// Whether records of this kind carry the structural block.
    pub const fn has_structure(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Branch | NodeKind::Text)
    }

    /// Whether records of this kind carry the value block.
    pub const fn has_value(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::Attribute)
    }

    /// Writes `node` to the sink in this kind's fixed layout.
    ///
    /// The node must already be sealed (digest stored) and must actually be
    /// of this kind; either mismatch is a contract violation. The
    /// transaction handle is threaded for kinds that externalize parts of
    /// their payload on write; the current set writes self-contained
    /// records.
    pub fn serialize<D, B, T>(self, sink: &mut B, node: &Node<D>, _trx: &T) -> Result<()>
    where
        D: Digest,
        B: BufMut,
        T: PageReadTrx,
    {
        if node.kind() != self {
            return Err(Error::Contract(format!(
                "serializing a {:?} node through the {:?} kind",
                node.kind(),
                self
            )));
        }

        let hash = node.hash().ok_or_else(|| {
            Error::Contract(format!(
                "cannot serialize unsealed node {}: no stored digest",
                node.node_key()
            ))
        })?;

        sink.put_u8(self.tag());
        codec::put_key(sink, node.node_key());
        codec::put_key(sink, node.parent_key());

        if let Some(structure) = node.structure_opt() {
            codec::put_key(sink, structure.first_child_key());
            codec::put_key(sink, structure.left_sibling_key());
            codec::put_key(sink, structure.right_sibling_key());
            sink.put_u64(structure.child_count());
            sink.put_u64(structure.descendant_count());
        }

        if let Some(value) = node.value_opt() {
            let word = codec::pack_value_len(value.raw_value().len(), value.is_compressed())?;
            sink.put_u32(word);
            sink.put_slice(value.raw_value());
        }

        sink.put_slice(hash.as_ref());
        Ok(())
    }

    /// Reads one record from the source and reconstructs the matching
    /// composite node.
    ///
    /// `node_key` is the record's slot key and is cross-checked against the
    /// stream. When `expected_hash` is given, the digest is recomputed over
    /// the reconstructed node and compared; a `None` defers verification to
    /// [`Node::verify_hash`]. The stored digest is carried over either way.
    pub fn deserialize<D, B, T>(
        src: &mut B,
        node_key: NodeKey,
        expected_hash: Option<&NodeHash>,
        trx: &T,
    ) -> Result<Node<D>>
    where
        D: Digest,
        B: Buf,
        T: PageReadTrx,
    {
        let tag = codec::get_u8(src, "kind tag")?;
        let kind = NodeKind::from_tag(tag)?;

        let stored_key = codec::get_key(src, "node key")?;
        if stored_key != node_key {
            return Err(Error::Malformed(format!(
                "record key {stored_key} does not match slot key {node_key}"
            )));
        }
        let parent_key = codec::get_key(src, "parent key")?;

        let identity = IdentityDelegate::new(
            stored_key,
            parent_key,
            Revision::NULL,
            trx.revision(),
            None,
        )
        .map_err(|_| Error::Malformed(format!("record carries the NULL key in slot {node_key}")))?;

        let mut node = match kind {
            NodeKind::Root => {
                let structure = read_structure(src)?;
                Node::Root(RootNode::new(identity, structure))
            }
            NodeKind::Branch => {
                let structure = read_structure(src)?;
                Node::Branch(BranchNode::new(identity, structure))
            }
            NodeKind::Text => {
                let structure = read_structure(src)?;
                let value = read_value(src)?;
                Node::Text(TextNode::new(identity, structure, value))
            }
            NodeKind::Attribute => {
                let value = read_value(src)?;
                Node::Attribute(AttributeNode::new(identity, value))
            }
            NodeKind::Tombstone => Node::Tombstone(TombstoneNode::new(identity)),
        };

        let stored_hash = codec::get_hash(src, "digest")?;
        node.set_hash(stored_hash);

        if let Some(expected) = expected_hash {
            let mut scratch = BytesMut::with_capacity(128);
            let computed = node.compute_hash(&mut scratch);
            if computed != *expected {
                return Err(Error::Integrity {
                    node_key,
                    expected: *expected,
                    computed,
                });
            }
        }

        Ok(node)
    }
}

fn read_structure(src: &mut impl Buf) -> Result<StructuralDelegate> {
    let first_child = codec::get_key(src, "first child key")?;
    let left_sibling = codec::get_key(src, "left sibling key")?;
    let right_sibling = codec::get_key(src, "right sibling key")?;
    let child_count = codec::get_u64(src, "child count")?;
    let descendant_count = codec::get_u64(src, "descendant count")?;

    if descendant_count < child_count {
        return Err(Error::Malformed(format!(
            "descendant count {descendant_count} is smaller than child count {child_count}"
        )));
    }

    StructuralDelegate::new(
        first_child,
        right_sibling,
        left_sibling,
        child_count,
        descendant_count,
    )
}

fn read_value(src: &mut impl Buf) -> Result<ValueDelegate> {
    let word = codec::get_u32(src, "value length")?;
    let (len, compressed) = codec::unpack_value_len(word);
    let raw = codec::get_bytes(src, len, "value bytes")?;
    Ok(ValueDelegate::new(raw, compressed))
}
