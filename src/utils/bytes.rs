//! Byte-slice utilities for bounds-oriented parsing.
//!
//! There are two layers:
//! - **Option layer** (`read_*`): zero-cost helpers that return `Option<T>`.
//! - **Result layer** (`*_r`): wrappers that map `None` to `DeserializationError::Truncated`.
//!
//! Offsets are `usize` and are interpreted relative to the slice you pass in.

use crate::err::DeserializationError;

/// Read a single byte at `offset`.
pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Position of the first NUL byte at or after `offset`.
pub(crate) fn find_nul(buf: &[u8], offset: usize) -> Option<usize> {
    buf.get(offset..)?
        .iter()
        .position(|&b| b == 0)
        .map(|rel| offset + rel)
}

#[inline]
pub(crate) fn truncated(
    what: &'static str,
    offset: usize,
    need: usize,
    len: usize,
) -> DeserializationError {
    DeserializationError::Truncated {
        what,
        offset: offset as u64,
        need,
        have: len.saturating_sub(offset),
    }
}

pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], DeserializationError> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))?;
    buf.get(offset..end)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))
}

/// Read a single byte at `offset`, or return `DeserializationError::Truncated`.
pub(crate) fn read_u8_r(
    buf: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<u8, DeserializationError> {
    read_u8(buf, offset).ok_or_else(|| truncated(what, offset, 1, buf.len()))
}
