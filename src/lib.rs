mod codec;
mod error;

pub mod delegate;
pub mod hash;
pub mod key;
pub mod label;
pub mod node;
pub mod page;
pub mod prelude;
pub mod testing;

pub use error::{Error, LabelError, Result};

#[doc(hidden)]
/// This is a hidden module to make the macros defined on this crate available for the users.
pub mod __dependencies {
    pub use bytes;
    pub use paste;
    pub use proptest;
    pub use test_strategy;
}

/// Generates the wire round-trip suite for one node kind: seal, serialize,
/// deserialize with integrity verification, compare field-for-field, and
/// re-serialize byte-identically.
#[macro_export]
macro_rules! test_node_roundtrip {
    ($name:ident, $strategy:expr) => {
        $crate::__dependencies::paste::paste! {
            mod [<test_roundtrip_ $name>] {
                use $crate::__dependencies::{
                    bytes::BytesMut,
                    proptest::prelude::*,
                    test_strategy,
                };
                use $crate::{
                    hash::DefaultDigest,
                    node::{Node, NodeKind},
                    testing::MemoryPageTrx,
                };

                #[test_strategy::proptest(fork = false)]
                fn test_wire_roundtrip(#[strategy($strategy)] node: Node<DefaultDigest>) {
                    let trx = MemoryPageTrx::default();
                    let mut scratch = BytesMut::new();
                    let mut node = node;

                    let hash = node.compute_hash(&mut scratch);
                    node.set_hash(hash);

                    let mut wire = Vec::new();
                    node.kind().serialize(&mut wire, &node, &trx)?;

                    let mut source: &[u8] = &wire;
                    let copy = NodeKind::deserialize::<DefaultDigest, _, _>(
                        &mut source,
                        node.node_key(),
                        Some(&hash),
                        &trx,
                    )?;

                    prop_assert_eq!(&copy, &node);
                    prop_assert_eq!(copy.hash(), Some(hash));

                    let mut rewire = Vec::new();
                    copy.kind().serialize(&mut rewire, &copy, &trx)?;
                    prop_assert_eq!(rewire, wire);
                }
            }
        }
    };
}
