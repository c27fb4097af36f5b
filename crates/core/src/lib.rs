//! Core types and shared functionality for pitlane.
//!
//! This crate provides:
//! - File-backed table cache with flat and race-scoped layouts
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod table;

pub use cache::{KeyParams, KeyValue, TableFormat, TableStore};
pub use config::{AppConfig, CacheConfig};
pub use error::{Error, ErrorKind};
pub use table::Table;
