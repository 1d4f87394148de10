//! # strux-stream
//!
//! Streaming materialization: turn a provider's delta stream into typed
//! progress updates while the model is still writing.
//!
//! Two disciplines, chosen by the schema's root shape:
//!
//! - **partial object**: each new closed state of the in-progress object is
//!   emitted as a [`StreamUpdate::Snapshot`]; unchanged states are skipped
//! - **multi item**: each element of a top-level collection is validated
//!   and emitted as a [`StreamUpdate::Item`] the moment it closes
//!
//! Either way the stream ends with exactly one terminal outcome: a
//! [`StreamUpdate::Final`] carrying the strictly validated instance, or an
//! error. A terminal validation failure does not end the extraction; it is
//! folded into the reask loop and remaining attempts run non-streaming.
//!
//! The update channel is bounded. A slow consumer exerts backpressure all
//! the way to the provider read loop.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod materializer;

pub use materializer::{MaterializedStream, StreamMaterializer, StreamUpdate};
