use crate::error::{Result, SearchError};

/// Longest accepted term. Escaping can triple a term inside a `LIKE`/`GLOB`
/// pattern, which SQLite caps at 50,000 bytes.
pub const MAX_TERM_BYTES: usize = 16 * 1024;

/// How each term is compared against document content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Literal substring
    #[default]
    Substring,
    /// Wildcards: `*` any run of characters, `?` one character, `\` escapes
    Pattern,
}

/// How multiple terms combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    /// The whole input is one needle, spaces included
    #[default]
    Phrase,
    /// Whitespace-separated terms; every term must match
    All,
    /// Whitespace-separated terms; at least one must match
    Any,
}

/// Options accompanying a search term
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    pub mode: MatchMode,
    pub combine: Combine,
    /// Fold ASCII letters when comparing
    pub ignore_case: bool,
    /// Cap on the number of results
    pub limit: Option<usize>,
}

/// Validated search request
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub raw: String,
    pub terms: Vec<String>,
    pub options: QueryOptions,
}

impl SearchQuery {
    /// Validate a term and split it according to `options.combine`.
    pub fn parse(raw: &str, options: QueryOptions) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(SearchError::InvalidQuery("search term is empty".into()));
        }
        if raw.contains('\0') {
            return Err(SearchError::InvalidQuery("search term contains a NUL byte".into()));
        }
        match options.limit {
            Some(0) => return Err(SearchError::InvalidQuery("limit must be at least 1".into())),
            Some(limit) if i64::try_from(limit).is_err() => {
                return Err(SearchError::InvalidQuery(format!("limit {} is too large", limit)));
            }
            _ => {}
        }

        let terms: Vec<String> = match options.combine {
            Combine::Phrase => vec![raw.to_string()],
            Combine::All | Combine::Any => raw.split_whitespace().map(String::from).collect(),
        };

        if let Some(term) = terms.iter().find(|t| t.len() > MAX_TERM_BYTES) {
            return Err(SearchError::InvalidQuery(format!(
                "search term is {} bytes, the maximum is {}",
                term.len(),
                MAX_TERM_BYTES
            )));
        }

        if options.mode == MatchMode::Pattern {
            for term in &terms {
                let trailing = term.chars().rev().take_while(|&c| c == '\\').count();
                if trailing % 2 == 1 {
                    return Err(SearchError::InvalidQuery(format!(
                        "pattern `{}` ends with a dangling escape",
                        term
                    )));
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            terms,
            options,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.options.mode
    }

    pub fn combine(&self) -> Combine {
        self.options.combine
    }

    pub fn ignore_case(&self) -> bool {
        self.options.ignore_case
    }
}

/// Parse a plain, case-sensitive substring query
pub fn parse_query(raw: &str) -> Result<SearchQuery> {
    SearchQuery::parse(raw, QueryOptions::default())
}

/// One element of a wildcard pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPiece {
    Literal(String),
    AnyRun,
    AnyChar,
}

/// Split a wildcard pattern into literal runs and wildcards.
///
/// `\*`, `\?` and `\\` produce literal characters; a backslash before any
/// other character is kept as is.
pub fn pattern_pieces(pattern: &str) -> Vec<PatternPiece> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('*' | '?' | '\\')) => {
                    literal.push(next);
                    chars.next();
                }
                _ => literal.push('\\'),
            },
            '*' | '?' => {
                if !literal.is_empty() {
                    pieces.push(PatternPiece::Literal(std::mem::take(&mut literal)));
                }
                if c == '*' {
                    // Consecutive stars collapse
                    if pieces.last() != Some(&PatternPiece::AnyRun) {
                        pieces.push(PatternPiece::AnyRun);
                    }
                } else {
                    pieces.push(PatternPiece::AnyChar);
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        pieces.push(PatternPiece::Literal(literal));
    }

    pieces
}
