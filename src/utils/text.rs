use chrono::DateTime;
use memchr::memchr;
use std::time::Duration;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Why a file's bytes could not be stored as text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    /// Contains NUL bytes; almost certainly not text
    #[error("binary content (NUL byte)")]
    Binary,
    /// Not valid UTF-8; `valid_up_to` is the offset of the first bad byte
    #[error("invalid UTF-8 at byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
}

/// Check for NUL bytes anywhere in the content.
///
/// SQLite text values cannot carry NULs reliably, so a single one disqualifies
/// the file.
pub fn is_binary(content: &[u8]) -> bool {
    memchr(0, content).is_some()
}

/// Decode file bytes as UTF-8 text, dropping a leading byte-order mark.
pub fn decode_text(content: Vec<u8>) -> Result<String, DecodeFailure> {
    if is_binary(&content) {
        return Err(DecodeFailure::Binary);
    }

    let content = match content.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_vec(),
        None => content,
    };

    String::from_utf8(content).map_err(|e| DecodeFailure::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format a duration as `HH:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format a unix timestamp (seconds) as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(ts: u64) -> String {
    if ts == 0 {
        return "never".to_string();
    }

    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
