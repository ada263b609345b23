//! Infrastructure layer: configuration and other process-level plumbing.

pub mod config;
