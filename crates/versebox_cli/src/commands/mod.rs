//! CLI command implementations.

pub mod cache;
pub mod records;
pub mod transfer;
