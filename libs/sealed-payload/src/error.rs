use thiserror::Error;

/// Failure of the decryption stage.
///
/// Never accompanied by partial plaintext.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecryptionError {
    /// The bearer token does not provide enough key material
    #[error("token too short for AES-128 key: need {required} bytes, got {actual}")]
    KeyTooShort { required: usize, actual: usize },

    /// Input cannot even hold the IV prefix
    #[error("sealed payload malformed: {len} bytes is shorter than the {iv_len}-byte IV")]
    MalformedInput { len: usize, iv_len: usize },

    /// Tag mismatch: tampered ciphertext or wrong key
    #[error("authentication failed: ciphertext tampered or wrong key")]
    Authentication,
}

/// Failure to seal a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncryptionError {
    /// The cipher refused the input (plaintext beyond the GCM length limit)
    #[error("encryption failed: AES-GCM rejected a {len}-byte plaintext")]
    PlaintextRejected { len: usize },
}

/// Failure of the MessagePack decoding stage.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeserializationError {
    /// Input buffer is empty
    #[error("empty MessagePack buffer")]
    Empty,

    /// Input ended in the middle of a value
    #[error("truncated MessagePack data: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// The never-used marker `0xc1`
    #[error("reserved MessagePack marker at offset {offset}")]
    ReservedMarker { offset: usize },

    /// String payload is not valid UTF-8
    #[error("invalid UTF-8 in MessagePack string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Extension type outside the supported set
    #[error("unsupported MessagePack extension type {ext_type}")]
    UnsupportedExtension { ext_type: i8 },

    /// Timestamp extension with an invalid length or out-of-range value
    #[error("invalid MessagePack timestamp ({len} bytes)")]
    InvalidTimestamp { len: usize },

    /// Map key that has no textual form (array, map or binary)
    #[error("unsupported MessagePack map key at offset {offset}")]
    UnsupportedMapKey { offset: usize },

    /// Arrays/maps nested beyond the decoder limit
    #[error("MessagePack nesting exceeds {limit} levels")]
    DepthLimitExceeded { limit: usize },

    /// Data remains after the first complete value
    #[error("trailing data after MessagePack value: {remaining} bytes")]
    TrailingBytes { remaining: usize },

    /// JSON re-encoding failed
    #[error("JSON re-encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of MessagePack encoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SerializationError {
    /// Collection or payload length does not fit the format's 32-bit length
    #[error("length {len} exceeds the MessagePack 32-bit limit")]
    LengthOverflow { len: usize },

    /// Writer failure
    #[error("failed to write MessagePack data: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Pipeline stage that produced an [`UnpackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackStage {
    Decryption,
    Deserialization,
}

/// Error returned by [`crate::unpack`], tagged with the failing stage.
///
/// The stage error is preserved unmodified as the source.
#[derive(Error, Debug)]
pub enum UnpackError {
    #[error("decryption stage failed: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("deserialization stage failed: {0}")]
    Deserialization(#[from] DeserializationError),
}

impl UnpackError {
    /// Which stage failed.
    #[must_use]
    pub fn stage(&self) -> UnpackStage {
        match self {
            Self::Decryption(_) => UnpackStage::Decryption,
            Self::Deserialization(_) => UnpackStage::Deserialization,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unpack_error_reports_stage() {
        let err = UnpackError::from(DecryptionError::Authentication);
        assert_eq!(err.stage(), UnpackStage::Decryption);

        let err = UnpackError::from(DeserializationError::Empty);
        assert_eq!(err.stage(), UnpackStage::Deserialization);
    }

    #[test]
    fn test_encryption_error_is_not_a_decryption_error() {
        let err = EncryptionError::PlaintextRejected { len: 42 };
        assert_eq!(
            err.to_string(),
            "encryption failed: AES-GCM rejected a 42-byte plaintext"
        );
        assert_ne!(
            err.to_string(),
            DecryptionError::Authentication.to_string()
        );
    }

    #[test]
    fn test_unpack_error_preserves_source() {
        let err = UnpackError::from(DecryptionError::KeyTooShort {
            required: 16,
            actual: 3,
        });

        let source = err.source().unwrap();
        let downcast = source.downcast_ref::<DecryptionError>();
        assert_eq!(
            downcast,
            Some(&DecryptionError::KeyTooShort {
                required: 16,
                actual: 3
            })
        );
    }
}
