#![no_main]

use arbitrary::Arbitrary;
use dumpsearch::query::{Combine, MatchMode, Matcher, QueryOptions, SearchQuery};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    term: &'a str,
    line: &'a str,
    pattern: bool,
    ignore_case: bool,
    all: bool,
}

fuzz_target!(|input: Input| {
    let options = QueryOptions {
        mode: if input.pattern {
            MatchMode::Pattern
        } else {
            MatchMode::Substring
        },
        combine: if input.all { Combine::All } else { Combine::Phrase },
        ignore_case: input.ignore_case,
        limit: None,
    };
    let Ok(query) = SearchQuery::parse(input.term, options) else {
        return;
    };
    let Ok(matcher) = Matcher::new(&query) else {
        return;
    };

    // Spans must be sorted, non-overlapping and on char boundaries
    let mut last = 0;
    for (start, end) in matcher.find_spans(input.line) {
        assert!(start >= last && start < end && end <= input.line.len());
        assert!(input.line.is_char_boundary(start) && input.line.is_char_boundary(end));
        last = end;
    }
});
