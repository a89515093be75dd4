//! Wire types shared by the relay and its chat clients.
//!
//! The streaming endpoint writes one [`StreamEvent`] per frame, each frame
//! being a single `data: <json>` line followed by a blank line.

#![deny(missing_docs)]

mod event;
mod message;

pub use event::*;
pub use message::*;
