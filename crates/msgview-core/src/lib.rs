//! msgview-core - Core types and widget logic for the message viewer
//!
//! This crate holds everything that does not need a terminal: message records,
//! the payload classifier, the collapsed/expanded presentation state machine,
//! and the page of containers that the widget attaches to.

pub mod types;
pub mod classify;
pub mod presentation;
pub mod page;
pub mod parser;
pub mod filter;

pub use types::*;
pub use classify::*;
pub use presentation::*;
pub use page::*;
pub use parser::*;
pub use filter::*;
