pub use crate::{
    delegate::{IdentityDelegate, StructuralDelegate, ValueDelegate},
    error::{Error, LabelError, Result},
    hash::NodeHash,
    key::{NodeKey, Revision},
    label::DeweyId,
    node::{AttributeNode, BranchNode, Node, NodeKind, RootNode, TextNode, TombstoneNode},
    page::PageReadTrx,
};

#[cfg(feature = "blake3")]
pub use crate::hash::DefaultDigest;
