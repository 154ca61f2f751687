#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Sealed payload handling for interceptor responses
//!
//! Response bodies served by the sealed API are laid out as
//! `[12-byte IV][AES-128-GCM ciphertext][16-byte tag]` and the plaintext is a
//! MessagePack document. This crate provides:
//! - Key derivation from a bearer token and authenticated decryption ([`crypto`])
//! - A MessagePack decoder into a closed [`Value`] union and JSON re-encoding ([`codec`])
//! - The combined decrypt-then-decode step used by interceptors ([`unpack`])
//!
//! # Example
//!
//! ```ignore
//! use sealed_payload::unpack;
//!
//! // Encrypted success body: decrypt with the bearer token, then decode
//! let json = unpack(&raw_body, Some("0123456789abcdef"))?;
//!
//! // Error bodies are plain MessagePack
//! let json = unpack(&error_body, None)?;
//! ```

pub mod codec;
pub mod crypto;
mod error;
mod pipeline;
mod value;

pub use crypto::{IV_LEN, KEY_LEN, SessionKey, TAG_LEN};
pub use error::{
    DecryptionError, DeserializationError, EncryptionError, SerializationError, UnpackError,
    UnpackStage,
};
pub use pipeline::unpack;
pub use value::Value;
