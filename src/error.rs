use thiserror::Error as ThisError;

use crate::{hash::NodeHash, key::NodeKey, label::DeweyId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the hierarchical label encoder.
///
/// All of these are surfaced to the external tree-mutation layer, which owns
/// the corrective action (usually a local sibling renumbering).
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LabelError {
    #[error("no free label between sibling labels {lower} and {upper}")]
    OutOfLabelSpace { lower: DeweyId, upper: DeweyId },

    #[error("no free label before {0}")]
    NoRoomBefore(DeweyId),

    #[error("division overflow extending {0}")]
    Overflow(DeweyId),

    #[error("{a} and {b} are not ordered sibling labels")]
    NotSiblings { a: DeweyId, b: DeweyId },
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The byte source ended before the named field could be read.
    #[error("record truncated reading {what}: need {needed} bytes, {remaining} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A field was readable but violates its range or consistency invariant.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The tag byte does not belong to any registered node kind.
    #[error("unknown node kind tag {tag:#04x}")]
    UnknownKind { tag: u8 },

    /// Recomputed digest disagrees with the stored or expected digest.
    #[error("digest mismatch for node {node_key}: expected {expected}, computed {computed}")]
    Integrity {
        node_key: NodeKey,
        expected: NodeHash,
        computed: NodeHash,
    },

    /// A caller broke an API contract: accessed a delegate the kind does not
    /// carry, supplied an out-of-range key, or serialized an unsealed node.
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("label error: {0}")]
    Label(#[from] LabelError),
}
