use std::fmt::{Display, Formatter};

use digest::Digest;
use proptest::prelude::*;

use crate::error::Result;

/// Default digest backend for node hashing.
#[cfg(feature = "blake3")]
pub type DefaultDigest = blake3::Hasher;

/// Fixed-width content digest of a node.
///
/// Digests are persisted and compared across revisions and machines, so the
/// value is a plain byte array with no platform-dependent state. The engine
/// is any [`digest::Digest`] with a 32-byte output; collision resistance is
/// for structural-integrity checking, not a security boundary.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeHash([u8; 32]);

impl NodeHash {
    pub const WIDTH: usize = 32;

    pub fn new(data: impl Into<[u8; 32]>) -> Self {
        NodeHash(data.into())
    }

    /// Copies a digest out of a 32-byte slice.
    ///
    /// Panics if the slice length is not exactly [`Self::WIDTH`]; every
    /// supported backend produces 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Self {
        let mut inner = [0u8; 32];
        inner.copy_from_slice(slice);
        NodeHash(inner)
    }

    pub const fn zero() -> Self {
        NodeHash([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex)
            .map_err(|e| crate::error::Error::Malformed(format!("invalid hex digest: {e}")))?;

        if bytes.len() != Self::WIDTH {
            return Err(crate::error::Error::Malformed(format!(
                "digest must be {} bytes, got {}",
                Self::WIDTH,
                bytes.len()
            )));
        }

        Ok(Self::from_slice(&bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Runs the hash engine over an arbitrary byte sequence.
    pub fn digest<D: Digest>(data: &[u8]) -> Self {
        let mut hasher = D::new();
        hasher.update(data);
        NodeHash::from_slice(&hasher.finalize())
    }
}

impl Display for NodeHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Default for NodeHash {
    fn default() -> Self {
        NodeHash::zero()
    }
}

impl From<[u8; 32]> for NodeHash {
    fn from(array: [u8; 32]) -> Self {
        NodeHash(array)
    }
}

impl From<NodeHash> for [u8; 32] {
    fn from(val: NodeHash) -> Self {
        val.0
    }
}

impl AsRef<[u8]> for NodeHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Arbitrary for NodeHash {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        any::<[u8; 32]>().prop_map(NodeHash::new).boxed()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[cfg(feature = "blake3")]
    mod blake3_engine {
        use super::*;

        type D = blake3::Hasher;

        #[proptest(fork = false)]
        fn test_determinism(data: Vec<u8>) {
            prop_assert_eq!(NodeHash::digest::<D>(&data), NodeHash::digest::<D>(&data));
        }

        #[proptest(fork = false)]
        fn test_single_byte_flip_changes_digest(
            data: Vec<u8>,
            #[strategy(0usize..64)] index: usize,
        ) {
            prop_assume!(!data.is_empty());
            let index = index % data.len();

            let mut flipped = data.clone();
            flipped[index] ^= 0x01;

            prop_assert_ne!(NodeHash::digest::<D>(&data), NodeHash::digest::<D>(&flipped));
        }

        #[test]
        fn test_known_width() {
            assert_eq!(NodeHash::digest::<D>(b"abc").as_ref().len(), NodeHash::WIDTH);
        }
    }

    #[cfg(feature = "blake2")]
    mod blake2_engine {
        use super::*;

        #[proptest(fork = false)]
        fn test_determinism(data: Vec<u8>) {
            prop_assert_eq!(
                NodeHash::digest::<blake2::Blake2s256>(&data),
                NodeHash::digest::<blake2::Blake2s256>(&data)
            );
        }
    }

    #[cfg(feature = "sha2")]
    mod sha2_engine {
        use super::*;

        #[proptest(fork = false)]
        fn test_determinism(data: Vec<u8>) {
            prop_assert_eq!(
                NodeHash::digest::<sha2::Sha256>(&data),
                NodeHash::digest::<sha2::Sha256>(&data)
            );
        }
    }

    #[proptest(fork = false)]
    fn test_hex_roundtrip(hash: NodeHash) {
        prop_assert_eq!(hash, NodeHash::from_hex(&hash.to_hex())?);
    }

    #[proptest(fork = false)]
    fn test_is_zero_is_same_as_zero_bytes(hash: NodeHash) {
        prop_assert_eq!(hash.is_zero(), hash == NodeHash::zero());
    }

    #[test]
    fn test_default_is_zero() {
        assert!(NodeHash::default().is_zero());
    }

    #[test]
    fn test_from_hex_rejects_bad_length() {
        assert!(NodeHash::from_hex("deadbeef").is_err());
    }
}
