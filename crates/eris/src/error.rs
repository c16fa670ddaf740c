use thiserror::Error;

use crate::block::Reference;
use crate::CAP_SIZE;

pub type Result<T> = std::result::Result<T, ErisError>;

/// Errors surfaced at the public operation boundary.
///
/// Corruption is fatal for the read in progress but does not invalidate the
/// capability; the caller may retry against a different store. Ingest has no
/// recoverable errors: a failed put propagates out and the ingest is
/// discarded.
#[derive(Debug, Error)]
pub enum ErisError {
    /// Fetched block's BLAKE2b-256 digest does not match its reference.
    #[error("block does not match reference {0}")]
    BlockCorrupted(Reference),

    /// Decrypted leaf ends in a byte that is neither 0x00 nor the 0x80
    /// padding sentinel.
    #[error("invalid padding terminator byte 0x{0:02x}")]
    InvalidPadding(u8),

    /// Block-size byte in a capability is neither 0x0a nor 0x0f.
    #[error("invalid block size byte 0x{0:02x}")]
    InvalidBlockSize(u8),

    /// URN prefix, shape, or base32 payload is malformed.
    #[error("malformed capability URN: {0}")]
    InvalidUrn(String),

    /// Binary capability payload has the wrong length.
    #[error("capability payload is {0} bytes, expected {CAP_SIZE}")]
    InvalidCapLength(usize),

    /// CBOR capability is not a tag-276 byte string.
    #[error("invalid capability CBOR: {0}")]
    InvalidCbor(String),

    /// The store holds no block under this reference.
    #[error("block {0} not found in store")]
    BlockNotFound(Reference),

    /// Store backend I/O failure.
    #[error("store I/O: {0}")]
    Io(#[from] std::io::Error),

    /// A block buffer has a length that is not a valid block size.
    #[error("buffer length {0} is not a valid block size")]
    InvalidBlockLength(usize),
}
