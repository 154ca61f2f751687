//! Domain layer for the native interceptor plugin.

pub mod client;
pub mod request;
pub mod service;

pub use client::Client;
pub use service::Service;
