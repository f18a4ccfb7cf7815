// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QUIC-style variable-length integers (RFC 9000, section 16).

use bytes::{Buf, BufMut};

use super::{DecodeError, EncodeError};

pub const MAX: u64 = (1 << 62) - 1;

pub fn put(buf: &mut impl BufMut, value: u64) -> Result<(), EncodeError> {
    match value {
        0..=0x3f => buf.put_u8(value as u8),
        0x40..=0x3fff => buf.put_u16(0x4000 | value as u16),
        0x4000..=0x3fff_ffff => buf.put_u32(0x8000_0000 | value as u32),
        0x4000_0000..=MAX => buf.put_u64(0xc000_0000_0000_0000 | value),
        _ => return Err(EncodeError::TooLong(value)),
    }
    Ok(())
}

pub fn get(buf: &mut impl Buf) -> Result<u64, DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::Truncated);
    }
    let len = 1usize << (buf.chunk()[0] >> 6);
    if buf.remaining() < len {
        return Err(DecodeError::Truncated);
    }
    let value = match len {
        1 => u64::from(buf.get_u8()),
        2 => u64::from(buf.get_u16() & 0x3fff),
        4 => u64::from(buf.get_u32() & 0x3fff_ffff),
        _ => buf.get_u64() & MAX,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        // from RFC 9000, appendix A.1
        let vectors: [(&[u8], u64); 4] = [
            (&[0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c], 151_288_809_941_952_652),
            (&[0x9d, 0x7f, 0x3e, 0x7d], 494_878_333),
            (&[0x7b, 0xbd], 15_293),
            (&[0x25], 37),
        ];
        for (encoded, value) in vectors {
            let mut buf = encoded;
            assert_eq!(get(&mut buf).unwrap(), value);
            assert!(buf.is_empty());

            let mut out = Vec::new();
            put(&mut out, value).unwrap();
            assert_eq!(out, encoded);
        }
    }

    #[test]
    fn non_minimal_encoding_is_accepted() {
        let mut buf: &[u8] = &[0x40, 0x25];
        assert_eq!(get(&mut buf).unwrap(), 37);
    }

    #[test]
    fn truncated_and_oversized() {
        let mut buf: &[u8] = &[0x9d, 0x7f];
        assert!(matches!(get(&mut buf), Err(DecodeError::Truncated)));
        assert!(matches!(
            put(&mut Vec::<u8>::new(), MAX + 1),
            Err(EncodeError::TooLong(_))
        ));
    }
}
