//! Library crate for scan-console: drives a remote scanning service and keeps
//! the console state (sessions, records, stats) that the terminal draws.
pub mod client;
pub mod config;
pub mod console;
pub mod display;
pub mod error;
pub mod normalize;
pub mod render;
pub mod session;
pub mod types;
