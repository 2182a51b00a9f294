//! Configuration module for the crawler
//!
//! This module provides the `CrawlerConfig` struct and its type-safe builder.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlerConfigBuilder, WithDbPath};
pub use types::{CrawlerConfig, FailurePolicy};
