//! domains
//!
//! The post aggregate, ranking rules and port definitions for the blog core.
//! Nothing in this crate performs I/O.

pub mod errors;
pub mod models;
pub mod ports;
pub mod ranking;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
