//! Block-pair codec: padding, convergent encryption, reference derivation.
//!
//! A leaf block is padded plaintext encrypted under a key that is the keyed
//! BLAKE2b-256 digest of the plaintext (keyed with the convergence secret).
//! An interior node block is packed child pairs encrypted the same way, but
//! keyed with the all-zero secret and with the tree level in the last nonce
//! byte. The reference of either is the unkeyed BLAKE2b-256 digest of the
//! ciphertext.

use crate::block::{BlockKey, Pair, Reference, Secret};
use crate::crypto::{blake2b_256, blake2b_256_keyed, chacha20_xor, NONCE_SIZE};
use crate::error::{ErisError, Result};
use crate::SECRET_SIZE;

/// Padding sentinel written after the last content byte.
pub(crate) const PAD_SENTINEL: u8 = 0x80;

/// ChaCha20 nonce for a block at `level`: all zero except the last byte.
/// Domain-separates keys across levels, so identical node content at
/// different depths yields different ciphertext.
pub(crate) fn level_nonce(level: u8) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[NONCE_SIZE - 1] = level;
    nonce
}

fn check_block_len(len: usize) -> Result<()> {
    if len == 1024 || len == 32 * 1024 {
        Ok(())
    } else {
        Err(ErisError::InvalidBlockLength(len))
    }
}

fn encrypt_block(block: &mut [u8], hash_key: &[u8; SECRET_SIZE], level: u8) -> Result<Pair> {
    check_block_len(block.len())?;
    let key = blake2b_256_keyed(hash_key, block);
    chacha20_xor(&key, &level_nonce(level), block);
    let reference = blake2b_256(block);
    Ok(Pair::new(
        Reference::from_bytes(reference),
        BlockKey::from_bytes(key),
    ))
}

/// Encrypt a padded leaf block in place. The key is the convergent digest
/// of the plaintext under the secret; the nonce is all zero (level 0).
pub fn encrypt_leaf(block: &mut [u8], secret: &Secret) -> Result<Pair> {
    encrypt_block(block, secret.as_bytes(), 0)
}

/// Encrypt a packed-pairs node block in place. Interior convergence is
/// unconditional: the hash key is the all-zero secret regardless of the
/// leaf secret.
pub fn encrypt_node(block: &mut [u8], level: u8) -> Result<Pair> {
    encrypt_block(block, &[0u8; SECRET_SIZE], level)
}

/// Verify a fetched block against its reference, then decrypt it in place
/// with the level-dependent nonce. A digest mismatch is a corruption error;
/// the block is left encrypted in that case.
pub fn decrypt_block(block: &mut [u8], pair: &Pair, level: u8) -> Result<()> {
    let digest = blake2b_256(block);
    if digest != *pair.reference().as_bytes() {
        return Err(ErisError::BlockCorrupted(*pair.reference()));
    }
    chacha20_xor(pair.key().as_bytes(), &level_nonce(level), block);
    Ok(())
}

/// Write the padding sentinel at `offset` and zero-fill the rest of the
/// block.
pub(crate) fn pad_in_place(block: &mut [u8], offset: usize) {
    block[offset] = PAD_SENTINEL;
    block[offset + 1..].fill(0);
}

/// Strip padding from a decrypted leaf: scan backwards over zero bytes to
/// the sentinel and return the content length. Any other terminator byte is
/// a corruption error, as is a block with no sentinel at all.
pub fn unpad(block: &[u8]) -> Result<usize> {
    for i in (0..block.len()).rev() {
        match block[i] {
            0x00 => continue,
            PAD_SENTINEL => return Ok(i),
            other => return Err(ErisError::InvalidPadding(other)),
        }
    }
    Err(ErisError::InvalidPadding(0x00))
}
