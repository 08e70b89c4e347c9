use bytes::{BufMut, Bytes};
use proptest::{collection::vec, prelude::*};

/// Opaque scalar payload of a node.
///
/// The raw bytes are exposed by reference and must be treated as read-only
/// once the owning node is sealed. The compression marker describes the
/// storage representation only: it never participates in the content
/// digest, so logically-equal values hash identically however they are
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDelegate {
    raw_value: Bytes,
    compressed: bool,
}

impl ValueDelegate {
    pub fn new(raw_value: impl Into<Bytes>, compressed: bool) -> Self {
        ValueDelegate {
            raw_value: raw_value.into(),
            compressed,
        }
    }

    pub fn raw_value(&self) -> &[u8] {
        &self.raw_value
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Appends the value bytes (and only the bytes) to the hash scratch
    /// buffer.
    pub(crate) fn hash_into(&self, scratch: &mut impl BufMut) {
        scratch.put_slice(&self.raw_value);
    }
}

impl Arbitrary for ValueDelegate {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (vec(any::<u8>(), 0..256), any::<bool>())
            .prop_map(|(raw, compressed)| ValueDelegate::new(raw, compressed))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn test_empty_value_is_legal() {
        let value = ValueDelegate::new(Vec::new(), false);
        assert_eq!(value.raw_value().len(), 0);
    }

    #[proptest(fork = false)]
    fn test_hash_input_ignores_compression_marker(raw: Vec<u8>) {
        let plain = ValueDelegate::new(raw.clone(), false);
        let compressed = ValueDelegate::new(raw, true);

        let mut a = BytesMut::new();
        let mut b = BytesMut::new();
        plain.hash_into(&mut a);
        compressed.hash_into(&mut b);

        prop_assert_eq!(a, b);
    }

    #[proptest(fork = false)]
    fn test_equality_is_byte_for_byte(a: ValueDelegate, b: ValueDelegate) {
        prop_assert_eq!(
            a == b,
            a.raw_value() == b.raw_value() && a.is_compressed() == b.is_compressed()
        );
    }
}
