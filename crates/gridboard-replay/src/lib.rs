#![forbid(unsafe_code)]

//! Trace replay for the gridboard layout engine.
//!
//! Reads a JSONL trace of inbound session events, drives a
//! [`gridboard_layout::LayoutSession`] with it and prints what every event
//! did, followed by the final board.

pub mod cli;
pub mod error;
pub mod replay;

pub use cli::run_from_env;
pub use error::{ReplayError, Result};
