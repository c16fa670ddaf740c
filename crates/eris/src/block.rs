//! Core block-level types: sizes, references, keys, secrets, pairs.

use std::fmt;

use zeroize::Zeroize;

use crate::error::{ErisError, Result};
use crate::{KEY_SIZE, PAIR_SIZE, REFERENCE_SIZE, SECRET_SIZE};

/// Unpadded RFC 4648 base32, as used in capability URNs and display forms.
pub(crate) const BASE32_NOPAD: base32::Alphabet = base32::Alphabet::RFC4648 { padding: false };

/// Size of an encoded block. Encoded in one byte as the base-2 logarithm of
/// the size: 0x0a for 1 KiB, 0x0f for 32 KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
    /// 1 KiB blocks, for small content
    Kib1,
    /// 32 KiB blocks, for bulk content
    Kib32,
}

impl BlockSize {
    /// Block size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            BlockSize::Kib1 => 1024,
            BlockSize::Kib32 => 32 * 1024,
        }
    }

    /// Number of child pairs that fit in one interior block.
    pub const fn arity(self) -> usize {
        self.bytes() / PAIR_SIZE
    }

    /// The single-byte wire encoding (log2 of the size).
    pub const fn code(self) -> u8 {
        match self {
            BlockSize::Kib1 => 0x0a,
            BlockSize::Kib32 => 0x0f,
        }
    }

    /// Decode the wire byte. Any value other than 0x0a or 0x0f is a format
    /// error.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x0a => Ok(BlockSize::Kib1),
            0x0f => Ok(BlockSize::Kib32),
            other => Err(ErisError::InvalidBlockSize(other)),
        }
    }

    /// Conventional choice for a given content length: 1 KiB blocks for
    /// content up to 16 KiB, 32 KiB blocks above that.
    pub fn recommended_for(content_len: u64) -> Self {
        if content_len <= 16 * 1024 {
            BlockSize::Kib1
        } else {
            BlockSize::Kib32
        }
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSize::Kib1 => write!(f, "1KiB"),
            BlockSize::Kib32 => write!(f, "32KiB"),
        }
    }
}

/// Content address of a ciphertext block: its BLAKE2b-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference([u8; REFERENCE_SIZE]);

impl Reference {
    pub fn from_bytes(bytes: [u8; REFERENCE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; REFERENCE_SIZE] {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base32::encode(BASE32_NOPAD, &self.0))
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b32 = base32::encode(BASE32_NOPAD, &self.0);
        write!(f, "Reference({}..)", &b32[..8])
    }
}

/// Per-block decryption key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockKey([u8; KEY_SIZE]);

impl BlockKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Drop for BlockKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// Convergence salt for leaf encryption. The all-zero secret is the public
/// convergence mode. Zeroized on drop.
#[derive(Clone)]
pub struct Secret([u8; SECRET_SIZE]);

impl Secret {
    /// The all-zero secret: public, globally convergent encoding.
    pub fn zero() -> Self {
        Self([0u8; SECRET_SIZE])
    }

    pub fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::zero()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret").field("bytes", &"[REDACTED]").finish()
    }
}

/// A (reference, key) pair: the handle needed to fetch and decrypt one
/// block. Its 64-byte wire image, reference then key, is copied verbatim
/// into interior node blocks; the pair order inside a node block is the
/// tree order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    reference: Reference,
    key: BlockKey,
}

impl Pair {
    pub fn new(reference: Reference, key: BlockKey) -> Self {
        Self { reference, key }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    /// The contiguous wire image: reference ‖ key.
    pub fn to_bytes(&self) -> [u8; PAIR_SIZE] {
        let mut out = [0u8; PAIR_SIZE];
        out[..REFERENCE_SIZE].copy_from_slice(self.reference.as_bytes());
        out[REFERENCE_SIZE..].copy_from_slice(self.key.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; PAIR_SIZE]) -> Self {
        let mut reference = [0u8; REFERENCE_SIZE];
        let mut key = [0u8; KEY_SIZE];
        reference.copy_from_slice(&bytes[..REFERENCE_SIZE]);
        key.copy_from_slice(&bytes[REFERENCE_SIZE..]);
        Self {
            reference: Reference::from_bytes(reference),
            key: BlockKey::from_bytes(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_codes_round_trip() {
        assert_eq!(BlockSize::from_code(0x0a).unwrap(), BlockSize::Kib1);
        assert_eq!(BlockSize::from_code(0x0f).unwrap(), BlockSize::Kib32);
        assert_eq!(BlockSize::Kib1.code(), 0x0a);
        assert_eq!(BlockSize::Kib32.code(), 0x0f);
    }

    #[test]
    fn block_size_rejects_unknown_codes() {
        for code in [0x00u8, 0x0b, 0x10, 0xff] {
            assert!(BlockSize::from_code(code).is_err(), "code 0x{code:02x}");
        }
    }

    #[test]
    fn arity_is_block_size_over_pair_size() {
        assert_eq!(BlockSize::Kib1.arity(), 16);
        assert_eq!(BlockSize::Kib32.arity(), 512);
    }

    #[test]
    fn pair_wire_image_round_trips() {
        let pair = Pair::new(
            Reference::from_bytes([0xAB; 32]),
            BlockKey::from_bytes([0xCD; 32]),
        );
        let bytes = pair.to_bytes();
        assert_eq!(&bytes[..32], &[0xAB; 32]);
        assert_eq!(&bytes[32..], &[0xCD; 32]);
        assert_eq!(Pair::from_bytes(&bytes), pair);
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = BlockKey::from_bytes([7u8; 32]);
        let s = format!("{key:?}");
        assert!(s.contains("REDACTED"));
        assert!(!s.contains('7'));
    }
}
