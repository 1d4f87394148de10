//! # strux-modes
//!
//! Mode adapters: the strategies by which a schema is pushed into a
//! provider request and a JSON candidate is pulled back out of the
//! response.
//!
//! Three modes are provided:
//!
//! - [`ToolCallAdapter`]: the schema becomes a required tool definition and
//!   the candidate is the tool call's argument blob
//! - [`JsonModeAdapter`]: the provider's native JSON response format plus a
//!   schema instruction, candidate scanned out of the assistant text
//! - [`MarkdownJsonAdapter`]: an instruction to answer inside a ```json
//!   fenced block, candidate taken from the fence
//!
//! Each adapter reads only its own channel of the response. A tool-call
//! response never leaks into a text-mode extraction and vice versa.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod json_mode;
pub mod markdown;
pub mod scan;
pub mod tool_call;

pub use adapter::{AdapterError, Mode, ModeAdapter, StreamAccum};
pub use json_mode::JsonModeAdapter;
pub use markdown::MarkdownJsonAdapter;
pub use tool_call::ToolCallAdapter;
