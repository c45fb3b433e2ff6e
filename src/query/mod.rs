pub mod executor;
pub mod matcher;
pub mod parser;

pub use executor::{QueryExecutor, QueryResult};
pub use matcher::Matcher;
pub use parser::{parse_query, Combine, MatchMode, QueryOptions, SearchQuery, MAX_TERM_BYTES};

use crate::error::Result;
use crate::index::store::Store;
use std::path::Path;

/// Open the store at `store_path`, run one query and close it again.
///
/// With `verify`, a full integrity scan runs before the query.
pub fn search(store_path: &Path, query: &SearchQuery, verify: bool) -> Result<Vec<QueryResult>> {
    let store = Store::open(store_path)?;
    if verify {
        store.verify_integrity()?;
    }
    let results = QueryExecutor::new(&store).execute(query)?;
    store.close()?;
    Ok(results)
}
