use crate::err::{DeserializationError, DeserializationResult};
use crate::utils::bytes;

/// Longest WSP `uintvar` encoding accepted, in bytes.
pub(crate) const MAX_UINTVAR_BYTES: usize = 5;

/// A lightweight cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, used for parsing the push envelope
/// where the whole message is already in memory and every read must be bounds checked.
///
/// All reads advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize, what: &'static str) -> DeserializationResult<()> {
        let _ = bytes::slice_r(self.buf, self.pos, n, what)?;
        self.pos += n;
        Ok(())
    }

    /// Look at the next byte without consuming it.
    #[inline]
    pub(crate) fn peek_u8(&self) -> Option<u8> {
        bytes::read_u8(self.buf, self.pos)
    }

    #[inline]
    pub(crate) fn u8_named(&mut self, what: &'static str) -> DeserializationResult<u8> {
        let b = bytes::read_u8_r(self.buf, self.pos, what)?;
        self.pos += 1;
        Ok(b)
    }

    /// Consume one byte, failing unless it equals `expected`.
    pub(crate) fn expect_u8(&mut self, expected: u8, what: &'static str) -> DeserializationResult<()> {
        let offset = self.pos;
        let found = self.u8_named(what)?;
        if found != expected {
            return Err(DeserializationError::UnexpectedByte {
                what,
                offset: offset as u64,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Read a WSP variable length unsigned integer.
    ///
    /// Big-endian groups of 7 bits, high bit set on every byte but the last.
    pub(crate) fn uintvar(&mut self, what: &'static str) -> DeserializationResult<u32> {
        let start = self.pos;
        let mut value: u32 = 0;

        for _ in 0..MAX_UINTVAR_BYTES {
            let b = self.u8_named(what)?;
            value = (value << 7) | u32::from(b & 0x7F);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(DeserializationError::UintvarTooLong {
            what,
            offset: start as u64,
            max: MAX_UINTVAR_BYTES,
        })
    }

    /// Read a NUL terminated UTF-8 string, consuming the terminator.
    pub(crate) fn c_str(&mut self, what: &'static str) -> DeserializationResult<&'a str> {
        let start = self.pos;
        let end = bytes::find_nul(self.buf, start).ok_or(DeserializationError::Unterminated {
            what,
            offset: start as u64,
        })?;

        let s = std::str::from_utf8(&self.buf[start..end]).map_err(|_| {
            DeserializationError::InvalidUtf8 {
                what,
                offset: start as u64,
            }
        })?;

        self.pos = end + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_single_byte_uintvar() {
        let mut c = ByteCursor::new(&[0x2F, 0xFF]);
        assert_eq!(c.uintvar("len").unwrap(), 0x2F);
        assert_eq!(c.pos(), 1);
    }

    #[test]
    fn test_reads_multi_byte_uintvar() {
        // 0x81 0x00 => 128
        let mut c = ByteCursor::new(&[0x81, 0x00]);
        assert_eq!(c.uintvar("len").unwrap(), 128);

        let mut c = ByteCursor::new(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(c.uintvar("len").unwrap(), u32::MAX);
    }

    #[test]
    fn test_rejects_overlong_uintvar() {
        let mut c = ByteCursor::new(&[0x81, 0x81, 0x81, 0x81, 0x81, 0x01]);
        assert_eq!(
            c.uintvar("len").unwrap_err(),
            DeserializationError::UintvarTooLong {
                what: "len",
                offset: 0,
                max: 5
            }
        );
    }

    #[test]
    fn test_uintvar_running_off_the_end_is_truncation() {
        let mut c = ByteCursor::new(&[0x81]);
        assert!(matches!(
            c.uintvar("len").unwrap_err(),
            DeserializationError::Truncated { offset: 1, .. }
        ));
    }

    #[test]
    fn test_c_str() {
        let mut c = ByteCursor::new(b"AABBCC\0rest");
        assert_eq!(c.c_str("mac").unwrap(), "AABBCC");
        assert_eq!(c.pos(), 7);
        assert_eq!(c.remaining(), 4);

        let mut c = ByteCursor::new(b"AABB");
        assert!(c.c_str("mac").is_err());
        assert_eq!(c.pos(), 0);
    }

    #[test]
    fn test_expect_u8() {
        let mut c = ByteCursor::new(&[0x06, 0x07]);
        assert!(c.expect_u8(0x06, "pdu").is_ok());
        assert_eq!(
            c.expect_u8(0x06, "pdu").unwrap_err(),
            DeserializationError::UnexpectedByte {
                what: "pdu",
                offset: 1,
                expected: 0x06,
                found: 0x07
            }
        );
    }
}
