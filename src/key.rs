use std::fmt::{Display, Formatter};

use proptest::prelude::*;

/// Unique integer identity of a node within a revision's tree.
///
/// `NodeKey::NULL` is the reserved out-of-band "absent" value; every link
/// field (parent, first child, siblings) stores either a real key or `NULL`,
/// and the `has_*` predicates are plain comparisons against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeKey(u64);

impl NodeKey {
    /// Sentinel meaning "no node". Never a legal key for a live node.
    pub const NULL: NodeKey = NodeKey(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        NodeKey(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for NodeKey {
    fn from(raw: u64) -> Self {
        NodeKey(raw)
    }
}

impl Arbitrary for NodeKey {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0..u64::MAX).prop_map(NodeKey).boxed()
    }
}

/// Number of a sealed snapshot of the whole tree.
///
/// `Revision::NULL` marks a node that has not been committed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Revision(u32);

impl Revision {
    pub const NULL: Revision = Revision(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Revision(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == Self::NULL.0
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u32> for Revision {
    fn from(raw: u32) -> Self {
        Revision(raw)
    }
}

impl Arbitrary for Revision {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0..u32::MAX).prop_map(Revision).boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn test_null_key_is_out_of_band() {
        assert!(NodeKey::NULL.is_null());
        assert_eq!(NodeKey::NULL.to_raw(), u64::MAX);
    }

    #[test]
    fn test_null_revision_is_out_of_band() {
        assert!(Revision::NULL.is_null());
        assert_eq!(Revision::NULL.to_raw(), u32::MAX);
    }

    #[proptest(fork = false)]
    fn test_generated_keys_never_collide_with_sentinel(key: NodeKey) {
        prop_assert!(!key.is_null());
    }

    #[proptest(fork = false)]
    fn test_generated_revisions_never_collide_with_sentinel(revision: Revision) {
        prop_assert!(!revision.is_null());
    }

    #[proptest(fork = false)]
    fn test_key_ordering_matches_raw_ordering(a: NodeKey, b: NodeKey) {
        prop_assert_eq!(a.cmp(&b), a.to_raw().cmp(&b.to_raw()));
    }
}
