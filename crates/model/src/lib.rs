//! An abstraction layer for the upstream inference provider.
//!
//! The relay talks to the hosted model only through the traits in this
//! crate, so that the HTTP-backed provider can be swapped with a scripted
//! one in tests without touching the relay itself.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
