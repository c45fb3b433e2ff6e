pub mod build;
pub mod stats;
pub mod store;
pub mod types;
pub mod writer;

pub use build::build_index;
pub use store::Store;
pub use types::*;
pub use writer::BatchWriter;
