//! # dumpsearch - substring search over an exported game-data tree
//!
//! dumpsearch loads the text of every JSON file in an export directory into a
//! single SQLite file once, then answers substring searches against that file
//! instead of rescanning hundreds of thousands of files on every query.
//!
//! ## Architecture
//!
//! - [`index`] - Store access and the batched, idempotent indexer
//! - [`query`] - Query validation, SQL construction and in-memory matching
//! - [`output`] - Result formatting for the terminal
//! - [`error`] - The crate-wide error type
//! - [`utils`] - Config, app data paths, text decoding, progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use dumpsearch::index::{build_index, IndexConfig};
//! use dumpsearch::query::{search, parse_query};
//! use std::path::Path;
//!
//! let store = Path::new("/tmp/exports.db");
//! build_index(Path::new("/data/Output"), store, &IndexConfig::default())?;
//!
//! let query = parse_query("Alpha Energy")?;
//! for result in search(store, &query, false)? {
//!     println!("{}", result.path);
//! }
//! # Ok::<(), dumpsearch::error::SearchError>(())
//! ```
//!
//! ## Matching rules
//!
//! Matching is case-sensitive unless `ignore_case` is set, in which case ASCII
//! letters are folded (non-ASCII text still compares exactly). Results are
//! always ordered by path, byte-wise ascending.

pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{Result, SearchError};
