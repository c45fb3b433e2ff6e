//! Utility functions shared by the indexer and the query path.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and config file (platform-aware)
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//! - [`text`] - Text decoding and human-readable formatting
//!
//! ```no_run
//! use dumpsearch::utils::{decode_text, format_size};
//!
//! let text = decode_text(b"{\"Name\": \"Alpha\"}".to_vec()).unwrap();
//! println!("{} ({})", text, format_size(text.len() as u64));
//! ```

pub mod app_data;
pub mod progress;
pub mod text;

pub use app_data::*;
pub use text::*;
