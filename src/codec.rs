//! Checked primitive reads and writes for node records.
//!
//! Sinks are any [`BufMut`] (append-only, monotonically advancing write
//! position); sources are any [`Buf`] (sequential cursor). All multi-byte
//! integers are big-endian so persisted records compare identically across
//! platforms. Reads never panic on underrun: every getter checks the
//! remaining length first and reports [`Error::Truncated`] with the field
//! name it was after.

use bytes::{Buf, BufMut, Bytes};

use crate::{
    error::{Error, Result},
    hash::NodeHash,
    key::NodeKey,
};

/// Top bit of the value-length word marks a compressed payload, leaving
/// 31 bits of length. Values are capped accordingly.
pub(crate) const COMPRESSED_BIT: u32 = 1 << 31;
pub(crate) const MAX_VALUE_LEN: usize = (COMPRESSED_BIT - 1) as usize;

fn ensure(src: &impl Buf, needed: usize, what: &'static str) -> Result<()> {
    let remaining = src.remaining();
    if remaining < needed {
        return Err(Error::Truncated {
            what,
            needed,
            remaining,
        });
    }
    Ok(())
}

pub(crate) fn get_u8(src: &mut impl Buf, what: &'static str) -> Result<u8> {
    ensure(src, 1, what)?;
    Ok(src.get_u8())
}

pub(crate) fn get_u32(src: &mut impl Buf, what: &'static str) -> Result<u32> {
    ensure(src, 4, what)?;
    Ok(src.get_u32())
}

pub(crate) fn get_u64(src: &mut impl Buf, what: &'static str) -> Result<u64> {
    ensure(src, 8, what)?;
    Ok(src.get_u64())
}

pub(crate) fn get_key(src: &mut impl Buf, what: &'static str) -> Result<NodeKey> {
    get_u64(src, what).map(NodeKey::new)
}

pub(crate) fn get_bytes(src: &mut impl Buf, len: usize, what: &'static str) -> Result<Bytes> {
    ensure(src, len, what)?;
    Ok(src.copy_to_bytes(len))
}

pub(crate) fn get_hash(src: &mut impl Buf, what: &'static str) -> Result<NodeHash> {
    ensure(src, NodeHash::WIDTH, what)?;
    let mut raw = [0u8; NodeHash::WIDTH];
    src.copy_to_slice(&mut raw);
    Ok(NodeHash::new(raw))
}

pub(crate) fn put_key(sink: &mut impl BufMut, key: NodeKey) {
    sink.put_u64(key.to_raw());
}

/// Packs the value length and compression marker into one `u32` word.
pub(crate) fn pack_value_len(len: usize, compressed: bool) -> Result<u32> {
    if len > MAX_VALUE_LEN {
        return Err(Error::Contract(format!(
            "value payload of {len} bytes exceeds the {MAX_VALUE_LEN}-byte record limit"
        )));
    }

    let mut word = len as u32;
    if compressed {
        word |= COMPRESSED_BIT;
    }
    Ok(word)
}

pub(crate) fn unpack_value_len(word: u32) -> (usize, bool) {
    ((word & !COMPRESSED_BIT) as usize, word & COMPRESSED_BIT != 0)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn test_truncated_read_names_the_field() {
        let mut src: &[u8] = &[0x01, 0x02];

        let err = get_u64(&mut src, "nodeKey").unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                what: "nodeKey",
                needed: 8,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_reads_consume_in_order() {
        let mut buf = Vec::new();
        buf.put_u8(3);
        put_key(&mut buf, NodeKey::new(13));
        buf.put_u32(7);

        let mut src: &[u8] = &buf;
        assert_eq!(get_u8(&mut src, "tag").unwrap(), 3);
        assert_eq!(get_key(&mut src, "nodeKey").unwrap(), NodeKey::new(13));
        assert_eq!(get_u32(&mut src, "len").unwrap(), 7);
        assert_eq!(src.remaining(), 0);
    }

    #[proptest(fork = false)]
    fn test_value_len_packing_roundtrip(
        #[strategy(0usize..=1 << 20)] len: usize,
        compressed: bool,
    ) {
        let word = pack_value_len(len, compressed)?;
        prop_assert_eq!(unpack_value_len(word), (len, compressed));
    }

    #[test]
    fn test_value_len_cap_is_enforced() {
        assert!(pack_value_len(MAX_VALUE_LEN, true).is_ok());
        assert!(matches!(
            pack_value_len(MAX_VALUE_LEN + 1, false),
            Err(Error::Contract(_))
        ));
    }
}
