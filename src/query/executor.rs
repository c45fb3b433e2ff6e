use crate::error::Result;
use crate::index::store::Store;
use crate::query::parser::{pattern_pieces, Combine, MatchMode, PatternPiece, SearchQuery};
use rusqlite::params_from_iter;
use std::time::Instant;
use tracing::debug;

/// A matching document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub path: String,
    pub content: String,
}

/// Runs search queries against an open store
pub struct QueryExecutor<'a> {
    store: &'a Store,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Every document satisfying the query, ordered by path ascending.
    pub fn execute(&self, query: &SearchQuery) -> Result<Vec<QueryResult>> {
        let start = Instant::now();
        let (sql, params) = build_sql(query);
        debug!("Executing `{}` with {} parameters", sql, params.len());

        let results = self
            .run(&sql, &params)
            .map_err(|e| self.store.classify_error(e))?;

        debug!(
            "Query {:?} matched {} documents in {:?}",
            query.raw,
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    fn run(&self, sql: &str, params: &[String]) -> rusqlite::Result<Vec<QueryResult>> {
        let mut stmt = self.store.conn().prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(QueryResult {
                path: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        rows.collect()
    }
}

/// Build the SELECT statement and its bound parameters.
///
/// Case-sensitive substrings use `instr`; everything case-insensitive goes
/// through `LIKE`, which folds ASCII letters only. Patterns use `GLOB` when
/// case matters.
pub fn build_sql(query: &SearchQuery) -> (String, Vec<String>) {
    let mut predicates = Vec::with_capacity(query.terms.len());
    let mut params = Vec::with_capacity(query.terms.len());

    for term in &query.terms {
        let (predicate, param) = match (query.mode(), query.ignore_case()) {
            (MatchMode::Substring, false) => ("instr(content, ?) > 0", term.clone()),
            (MatchMode::Substring, true) => (
                "content LIKE ? ESCAPE '\\'",
                format!("%{}%", escape_like(term)),
            ),
            (MatchMode::Pattern, false) => ("content GLOB ?", format!("*{}*", pattern_to_glob(term))),
            (MatchMode::Pattern, true) => (
                "content LIKE ? ESCAPE '\\'",
                format!("%{}%", pattern_to_like(term)),
            ),
        };
        predicates.push(predicate);
        params.push(param);
    }

    let joiner = match query.combine() {
        Combine::Phrase | Combine::All => " AND ",
        Combine::Any => " OR ",
    };

    let mut sql = format!(
        "SELECT path, content FROM documents WHERE ({}) ORDER BY path ASC",
        predicates.join(joiner)
    );
    if let Some(limit) = query.options.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    (sql, params)
}

/// Escape `LIKE` metacharacters (escape character `\`)
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape `GLOB` metacharacters using single-character classes
fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' => out.push_str("[*]"),
            '?' => out.push_str("[?]"),
            '[' => out.push_str("[[]"),
            _ => out.push(c),
        }
    }
    out
}

fn pattern_to_glob(pattern: &str) -> String {
    pattern_pieces(pattern)
        .into_iter()
        .map(|piece| match piece {
            PatternPiece::Literal(lit) => escape_glob(&lit),
            PatternPiece::AnyRun => "*".to_string(),
            PatternPiece::AnyChar => "?".to_string(),
        })
        .collect()
}

fn pattern_to_like(pattern: &str) -> String {
    pattern_pieces(pattern)
        .into_iter()
        .map(|piece| match piece {
            PatternPiece::Literal(lit) => escape_like(&lit),
            PatternPiece::AnyRun => "%".to_string(),
            PatternPiece::AnyChar => "_".to_string(),
        })
        .collect()
}
