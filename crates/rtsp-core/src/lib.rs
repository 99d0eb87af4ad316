//! Shared contracts for the RTSP scenario control plane.
//!
//! This crate holds the pieces every saga stage needs: the data model,
//! the repository error sentinel, the `MessageBus` trait (and its Kafka
//! implementation), and the `clap`-flattened configuration fragments
//! shared by every binary.

pub mod bus;
pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use error::{Error, Result};
