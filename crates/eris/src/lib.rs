//! eris: ERIS (Encoding for Robust Immutable Storage)
//!
//! Content-addressable encoding of arbitrary byte streams into fixed-arity
//! Merkle trees of encrypted, fixed-size blocks, addressed by a compact
//! read capability.
//!
//! Encode pipeline:
//! ```text
//! plaintext → pad (0x80 ‖ zeros) → split into blocks
//!   per leaf:  key = BLAKE2b-256(block, keyed with secret)
//!              ciphertext = ChaCha20(key, nonce = 0)
//!              reference = BLAKE2b-256(ciphertext)
//!   pairs (reference ‖ key) pack into interior node blocks, level by level,
//!   until a single root pair remains → capability (urn:erisx3:...)
//! ```
//!
//! Anyone holding the capability can walk the tree back down, verify each
//! block against its reference, and decrypt. Without it the blocks are
//! opaque ciphertext. Encoding is convergent: identical content and secret
//! yield identical blocks and an identical URN.

pub mod block;
pub mod cap;
pub mod codec;
pub mod crypto;
pub mod encode;
pub mod error;
pub mod ingest;
pub mod reader;
pub mod store;

pub use block::{BlockKey, BlockSize, Pair, Reference, Secret};
pub use cap::ErisCap;
pub use encode::{decode, encode};
pub use error::{ErisError, Result};
pub use ingest::Ingest;
pub use reader::ErisReader;
pub use store::{BlockStore, MemoryStore};

/// Size of a block reference in bytes (BLAKE2b-256 output)
pub const REFERENCE_SIZE: usize = 32;

/// Size of a per-block encryption key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of a convergence secret in bytes
pub const SECRET_SIZE: usize = 32;

/// Size of a reference-key pair as laid out in a node block
pub const PAIR_SIZE: usize = REFERENCE_SIZE + KEY_SIZE;

/// Size of the binary capability: block-size byte, level byte, root pair
pub const CAP_SIZE: usize = 2 + PAIR_SIZE;
