//! Core logic for the waterfall skill bot's update dialog.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port
//! (a trait) implemented in the adapter crate.

pub mod channel;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod prompt;
pub mod security;
pub mod tracker;
pub mod update;

pub use errors::{Error, Result};
