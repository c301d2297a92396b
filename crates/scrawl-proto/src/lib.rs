//! # scrawl-proto
//!
//! Wire protocol for the scrawl shared-canvas application: the JSON message
//! model exchanged between clients and the relay, and the brace-framing codec
//! that delimits messages inside a continuous byte stream.
//!
//! ## Quick Start
//!
//! ```rust
//! use scrawl_proto::Message;
//!
//! let msg: Message = serde_json::from_str(r#"{"type":"chat","message":"alice: hi"}"#).unwrap();
//! assert!(matches!(msg, Message::Chat { .. }));
//! ```
//!
//! The codec is deliberately wire-compatible with the legacy clients: frames
//! end at the first `}` byte, so only flat JSON objects with no literal `}`
//! inside string values survive the framing. See [`codec::BraceCodec`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{BraceCodec, Frame};
pub use error::ProtocolError;
pub use message::Message;
