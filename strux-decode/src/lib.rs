//! # strux-decode
//!
//! JSON decoding for strux, in two flavors.
//!
//! [`decode_strict`] is plain serde_json parsing with positioned errors and
//! is the only decoder terminal results go through. [`decode_partial`]
//! repairs a truncated JSON prefix into the largest well-formed value the
//! text supports, and reports which part of that value is still open via a
//! frontier path. Repair is deterministic: the same prefix always produces
//! the same value and frontier, and a longer prefix never changes a part the
//! shorter prefix reported as closed.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod partial;
pub mod strict;

pub use error::DecodeError;
pub use partial::{decode_partial, path_to_string, PartialValue, PathSeg};
pub use strict::decode_strict;
