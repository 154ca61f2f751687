use bytes::Bytes;

use crate::codec;
use crate::crypto;
use crate::error::UnpackError;

/// Turn a raw response body into the byte payload handed to callers.
///
/// With a `token`, the body is opened as a sealed payload first; without one
/// it is decoded as plain MessagePack (error responses are never sealed).
/// The decoded value is re-encoded by [`codec::reencode`].
///
/// # Errors
///
/// Returns [`UnpackError::Decryption`] or [`UnpackError::Deserialization`]
/// carrying the failing stage's error unmodified.
pub fn unpack(raw_body: &[u8], token: Option<&str>) -> Result<Bytes, UnpackError> {
    let value = match token {
        Some(token) => {
            let plaintext = crypto::decrypt(raw_body, token)?;
            codec::deserialize(&plaintext)?
        }
        None => codec::deserialize(raw_body)?,
    };

    let out = codec::reencode(value)?;
    tracing::debug!(
        sealed = token.is_some(),
        input_len = raw_body.len(),
        output_len = out.len(),
        "unpacked response body"
    );
    Ok(out)
}
