//! In-memory evaluation of a [`SearchQuery`].
//!
//! Mirrors the SQL predicate built by the executor so the display layer can
//! find and highlight match spans inside individual lines.

use crate::error::{Result, SearchError};
use crate::query::parser::{pattern_pieces, Combine, MatchMode, PatternPiece, SearchQuery};
use regex::Regex;

enum Needle {
    Literal(String),
    Pattern(Regex),
}

/// Compiled form of a query's terms
pub struct Matcher {
    needles: Vec<Needle>,
    combine: Combine,
    ignore_case: bool,
}

impl Matcher {
    pub fn new(query: &SearchQuery) -> Result<Self> {
        let ignore_case = query.ignore_case();
        let needles = query
            .terms
            .iter()
            .map(|term| {
                let term = if ignore_case {
                    term.to_ascii_lowercase()
                } else {
                    term.clone()
                };
                match query.mode() {
                    MatchMode::Substring => Ok(Needle::Literal(term)),
                    MatchMode::Pattern => compile_pattern(&term).map(Needle::Pattern),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            needles,
            combine: query.combine(),
            ignore_case,
        })
    }

    /// Whether `text` satisfies the query as a whole
    pub fn is_match(&self, text: &str) -> bool {
        let folded = self.fold(text);
        let mut hits = self.needles.iter().map(|needle| match needle {
            Needle::Literal(lit) => folded.contains(lit.as_str()),
            Needle::Pattern(re) => re.is_match(&folded),
        });

        match self.combine {
            Combine::Phrase | Combine::All => hits.all(|hit| hit),
            Combine::Any => hits.any(|hit| hit),
        }
    }

    /// Byte spans of every needle occurrence in `line`, sorted and merged.
    /// Empty matches are dropped.
    pub fn find_spans(&self, line: &str) -> Vec<(usize, usize)> {
        let folded = self.fold(line);
        let mut spans: Vec<(usize, usize)> = Vec::new();

        for needle in &self.needles {
            match needle {
                Needle::Literal(lit) => {
                    if lit.is_empty() {
                        continue;
                    }
                    spans.extend(
                        folded
                            .match_indices(lit.as_str())
                            .map(|(start, m)| (start, start + m.len())),
                    );
                }
                Needle::Pattern(re) => {
                    spans.extend(
                        re.find_iter(&folded)
                            .filter(|m| !m.is_empty())
                            .map(|m| (m.start(), m.end())),
                    );
                }
            }
        }

        spans.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        merged
    }

    /// ASCII case folding keeps byte offsets identical to the original text
    fn fold<'t>(&self, text: &'t str) -> std::borrow::Cow<'t, str> {
        if self.ignore_case {
            std::borrow::Cow::Owned(text.to_ascii_lowercase())
        } else {
            std::borrow::Cow::Borrowed(text)
        }
    }
}

/// Translate a wildcard pattern into a regex matching anywhere in the text.
fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut source = String::from("(?s)");
    for piece in pattern_pieces(pattern) {
        match piece {
            PatternPiece::Literal(lit) => source.push_str(&regex::escape(&lit)),
            PatternPiece::AnyRun => source.push_str(".*?"),
            PatternPiece::AnyChar => source.push('.'),
        }
    }

    Regex::new(&source)
        .map_err(|e| SearchError::InvalidQuery(format!("pattern `{}`: {}", pattern, e)))
}
