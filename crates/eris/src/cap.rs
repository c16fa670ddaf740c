//! Read capability: root descriptor, URN text codec, CBOR wire form.
//!
//! Binary layout (66 bytes): block-size byte ‖ level ‖ reference[32] ‖
//! key[32]. The URN form is `urn:erisx3:` followed by the unpadded base32
//! of those 66 bytes (106 characters). On the wire the capability is a CBOR
//! byte string tagged 276.

use std::fmt;
use std::str::FromStr;

use ciborium::value::Value;

use crate::block::{BlockSize, Pair, BASE32_NOPAD};
use crate::error::{ErisError, Result};
use crate::{CAP_SIZE, PAIR_SIZE};

/// URN namespace identifier for this encoding revision.
pub const URN_NID: &str = "erisx3";

/// Length of the base32 payload in a capability URN.
pub const URN_PAYLOAD_LEN: usize = 106;

/// CBOR tag for a marshalled capability.
pub const CBOR_TAG: u64 = 276;

/// The minimum information needed to fetch and decrypt a full tree: block
/// size, root level, and the root's reference-key pair. A level of 0 means
/// the root is itself a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErisCap {
    pub block_size: BlockSize,
    pub level: u8,
    pub root: Pair,
}

impl ErisCap {
    /// The 66-byte binary form.
    pub fn to_bytes(&self) -> [u8; CAP_SIZE] {
        let mut out = [0u8; CAP_SIZE];
        out[0] = self.block_size.code();
        out[1] = self.level;
        out[2..].copy_from_slice(&self.root.to_bytes());
        out
    }

    /// Parse the binary form. Any level byte is syntactically valid;
    /// semantic problems surface when the tree is read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CAP_SIZE {
            return Err(ErisError::InvalidCapLength(bytes.len()));
        }
        let block_size = BlockSize::from_code(bytes[0])?;
        let level = bytes[1];
        let mut pair = [0u8; PAIR_SIZE];
        pair.copy_from_slice(&bytes[2..]);
        Ok(Self {
            block_size,
            level,
            root: Pair::from_bytes(&pair),
        })
    }

    /// Format as `urn:erisx3:<106 base32 characters>`.
    pub fn urn(&self) -> String {
        format!("urn:{URN_NID}:{}", base32::encode(BASE32_NOPAD, &self.to_bytes()))
    }

    /// Parse a capability URN: exactly three colon-separated parts, the
    /// payload at least 106 base32 characters (the first 106 decoded).
    pub fn from_urn(urn: &str) -> Result<Self> {
        let mut parts = urn.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("urn"), Some(URN_NID), Some(payload)) => {
                let head = payload
                    .get(..URN_PAYLOAD_LEN)
                    .ok_or_else(|| ErisError::InvalidUrn(format!("payload too short: {urn}")))?;
                let decoded = base32::decode(BASE32_NOPAD, head)
                    .ok_or_else(|| ErisError::InvalidUrn(format!("bad base32 payload: {urn}")))?;
                Self::from_bytes(&decoded[..CAP_SIZE.min(decoded.len())])
            }
            _ => Err(ErisError::InvalidUrn(urn.to_string())),
        }
    }

    /// CBOR wire form: the 66-byte payload as a byte string tagged 276.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let value = Value::Tag(CBOR_TAG, Box::new(Value::Bytes(self.to_bytes().to_vec())));
        let mut out = Vec::with_capacity(CAP_SIZE + 4);
        ciborium::into_writer(&value, &mut out)
            .map_err(|e| ErisError::InvalidCbor(e.to_string()))?;
        Ok(out)
    }

    /// Parse the CBOR wire form.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            ciborium::from_reader(bytes).map_err(|e| ErisError::InvalidCbor(e.to_string()))?;
        match value {
            Value::Tag(CBOR_TAG, inner) => match *inner {
                Value::Bytes(payload) => Self::from_bytes(&payload),
                other => Err(ErisError::InvalidCbor(format!(
                    "expected byte string under tag {CBOR_TAG}, got {other:?}"
                ))),
            },
            Value::Tag(tag, _) => Err(ErisError::InvalidCbor(format!("unexpected tag {tag}"))),
            other => Err(ErisError::InvalidCbor(format!("expected tagged value, got {other:?}"))),
        }
    }
}

impl fmt::Display for ErisCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.urn())
    }
}

impl FromStr for ErisCap {
    type Err = ErisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_urn(s)
    }
}
