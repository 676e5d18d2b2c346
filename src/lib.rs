//! stackx library
//!
//! Search Stack Exchange sites from the terminal. The binary wires these
//! modules together; they are exposed for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
pub mod search;
pub mod ui;
