//! msgview-ui - TUI components for the message viewer
//!
//! This crate provides the application state, key handling, clipboard access
//! and the ratatui components that draw a page of message containers.

pub mod app;
pub mod event;
pub mod clipboard;
pub mod feedback;
pub mod config;
pub mod components;
pub mod views;
pub mod snapshot;

pub use app::*;
pub use event::*;
pub use config::*;
