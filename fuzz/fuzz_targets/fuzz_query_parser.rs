#![no_main]

use dumpsearch::query::{parse_query, MatchMode, QueryOptions, SearchQuery};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Substring terms that parse must also build SQL
    if let Ok(query) = parse_query(data) {
        let _ = dumpsearch::query::executor::build_sql(&query);
    }

    let options = QueryOptions {
        mode: MatchMode::Pattern,
        ..QueryOptions::default()
    };
    if let Ok(query) = SearchQuery::parse(data, options) {
        let _ = dumpsearch::query::executor::build_sql(&query);
    }
});
