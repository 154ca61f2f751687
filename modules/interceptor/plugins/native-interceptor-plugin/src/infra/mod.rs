//! Infrastructure adapters for the native interceptor plugin.

pub mod hyper_transport;
pub mod redirect;

pub use hyper_transport::{HyperTransport, HyperTransportError};
pub use redirect::SecureRedirectPolicy;
