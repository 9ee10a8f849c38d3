//! # Cadence Bridge
//!
//! The demo host: picks a message source from config, drives a heartbeat
//! engine with it, and reports what was pumped.

pub mod app;
pub mod cli;
pub mod config;
pub mod heartbeat;
pub mod input;
pub mod util;
