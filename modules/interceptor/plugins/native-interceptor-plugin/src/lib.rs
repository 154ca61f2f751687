#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Native interceptor plugin.
//!
//! Runs requests through a hyper-based transport and turns sealed
//! (AES-128-GCM encrypted MessagePack) response bodies into JSON, with
//! cancellation and timing.

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;


pub use module::NativeInterceptorPlugin;
