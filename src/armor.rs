//! Transport encodings for sealed envelopes.
//!
//! Neither encoding touches the envelope bytes themselves. `frame` prepends a
//! u32 big-endian length so an envelope can be embedded in a larger byte stream
//! and recovered later; the base64 helpers carry envelopes through text-only
//! channels.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, VaultError};

/// Size of the length prefix written by `frame`.
pub const FRAME_PREFIX_LEN: usize = 4;

/// Prefix `envelope` with its length as a u32 big-endian integer.
pub fn frame(envelope: &[u8]) -> Result<Vec<u8>> {
    let len =
        u32::try_from(envelope.len()).map_err(|_| VaultError::FrameTooLarge(envelope.len()))?;
    let mut out = Vec::with_capacity(FRAME_PREFIX_LEN + envelope.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(envelope);
    Ok(out)
}

/// Read one framed envelope from the front of `buf`.
///
/// Returns the envelope and whatever follows it. Bytes past the declared length
/// are left alone, so padding or noise after the frame is tolerated.
pub fn unframe(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    let (prefix, rest) = buf
        .split_first_chunk::<FRAME_PREFIX_LEN>()
        .ok_or(VaultError::TruncatedFrame {
            declared: FRAME_PREFIX_LEN,
            available: buf.len(),
        })?;
    let declared = u32::from_be_bytes(*prefix) as usize;
    if rest.len() < declared {
        return Err(VaultError::TruncatedFrame {
            declared,
            available: rest.len(),
        });
    }
    Ok(rest.split_at(declared))
}

/// Standard padded base64 of an envelope.
pub fn to_base64(envelope: &[u8]) -> String {
    STANDARD.encode(envelope)
}

/// Decode a base64 envelope. Surrounding whitespace is ignored.
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}
