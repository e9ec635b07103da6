//! Output rendering.
//!
//! JSON output is the plain array of summaries; Markdown output adds a
//! metadata header and renders one card per entry.

pub mod generator;

pub use generator::*;
