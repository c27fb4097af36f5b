//! On-disk table cache.
//!
//! Tables are stored as one file per entry under a configured root, keyed
//! either by a flattened composite key or by a year/series/race directory
//! tree:
//!
//! - Key sanitization and composition
//! - Flat and race-scoped path layouts
//! - CSV and Parquet codecs negotiated per call
//! - Save, load, exists and clear, plus race-wide clear with directory pruning

pub mod codec;
pub mod format;
pub mod key;
pub mod layout;
pub mod store;

pub use crate::Error;

pub use format::TableFormat;
pub use key::{KeyParams, KeyValue, compose_key, sanitize_key};
pub use layout::{Layout, ensure_race_directory, race_directory};
pub use store::TableStore;
