use bytes::Bytes;

use crate::key::{NodeKey, Revision};

/// Read handle onto the copy-on-write page layer, threaded through node
/// serialization and deserialization.
///
/// The page manager, snapshot allocation and transaction discipline live
/// outside this crate; nodes only ever consume this narrow surface. Every
/// kind stamps a freshly deserialized node's owning revision from
/// [`PageReadTrx::revision`]. Kinds that intern their payloads elsewhere
/// (value tables, path summaries) resolve them through
/// [`PageReadTrx::resolve_aux`]; self-contained kinds ignore it.
pub trait PageReadTrx {
    /// Revision this transaction reads from.
    fn revision(&self) -> Revision;

    /// Resolves an auxiliary back-reference by key within the current
    /// revision, or `None` when the key is unknown.
    fn resolve_aux(&self, key: NodeKey) -> Option<Bytes>;
}

impl<T: PageReadTrx + ?Sized> PageReadTrx for &T {
    fn revision(&self) -> Revision {
        (**self).revision()
    }

    fn resolve_aux(&self, key: NodeKey) -> Option<Bytes> {
        (**self).resolve_aux(key)
    }
}
