//! A streaming relay between chat clients and a hosted inference provider.
//!
//! The relay exposes a health check, a single-shot chat endpoint and a
//! streaming chat endpoint. It owns the provider credential and is the only
//! component talking to the provider.

#[macro_use]
extern crate tracing;

mod config;
mod error;
pub mod http;
mod relay;
mod upstream;

pub use config::{DEFAULT_ADDR, RelayConfig, RelayConfigBuilder, TOKEN_VARS};
pub use error::{ErrorCategory, RelayError};
pub use relay::Relay;
pub use upstream::{FragmentStream, UpstreamClient, UpstreamError};
