//! ZoomEye query library
//!
//! Cached, retrying access to the ZoomEye asset search and vulnerability APIs,
//! exposed as callable tools. The binary in `main.rs` is a thin CLI over this crate.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod tools;

pub use client::{RetryPolicy, SearchParams, ZoomEyeClient, ZoomEyeError};
pub use config::ClientConfig;
