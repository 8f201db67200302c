//! Payload renderers
//!
//! JSON payloads get syntax highlighting; everything else is drawn as is.

pub mod payload;

pub use payload::*;
