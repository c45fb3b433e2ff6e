//! Terminal formatting for search results

use crate::query::{Matcher, QueryResult};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Display settings for [`print_results`]
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub color: ColorChoice,
    /// Print only the matching paths
    pub files_only: bool,
    /// Matching lines shown per file
    pub max_lines: usize,
    /// Lines longer than this are cut to a window around the first match
    pub max_columns: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            files_only: false,
            max_lines: 3,
            max_columns: 240,
        }
    }
}

/// Print results to stdout
pub fn print_results(results: &[QueryResult], matcher: &Matcher, options: &OutputOptions) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(options.color);
    write_results(&mut stdout, results, matcher, options)
}

/// Write results to any color-capable writer
pub fn write_results<W: WriteColor>(
    out: &mut W,
    results: &[QueryResult],
    matcher: &Matcher,
    options: &OutputOptions,
) -> io::Result<()> {
    for (i, result) in results.iter().enumerate() {
        if options.files_only {
            write_path(out, &result.path, false)?;
            continue;
        }

        if i > 0 {
            // Blank line between files
            writeln!(out)?;
        }
        write_path(out, &result.path, true)?;
        write_snippet(out, result, matcher, options)?;
    }
    Ok(())
}

fn write_path<W: WriteColor>(out: &mut W, path: &str, bold: bool) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(bold))?;
    write!(out, "{}", path)?;
    out.reset()?;
    writeln!(out)
}

fn write_snippet<W: WriteColor>(
    out: &mut W,
    result: &QueryResult,
    matcher: &Matcher,
    options: &OutputOptions,
) -> io::Result<()> {
    let mut shown = 0;
    let mut remaining = 0;

    for (idx, line) in result.content.lines().enumerate() {
        let spans = matcher.find_spans(line);
        if spans.is_empty() {
            continue;
        }
        if shown >= options.max_lines {
            remaining += 1;
            continue;
        }

        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", idx + 1)?;
        out.reset()?;
        write!(out, ":")?;
        write_highlighted(out, line, &spans, options.max_columns)?;
        shown += 1;
    }

    if shown == 0 && remaining == 0 {
        // A wildcard matched across a line break; no single line holds it
        out.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_dimmed(true))?;
        write!(out, "(match spans lines)")?;
        out.reset()?;
        writeln!(out)?;
    }

    if remaining > 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_dimmed(true))?;
        write!(
            out,
            "... and {} more match{}",
            remaining,
            if remaining > 1 { "es" } else { "" }
        )?;
        out.reset()?;
        writeln!(out)?;
    }

    Ok(())
}

/// Print a line with spans highlighted, cut to `max_columns` bytes around the first span.
fn write_highlighted<W: WriteColor>(
    out: &mut W,
    line: &str,
    spans: &[(usize, usize)],
    max_columns: usize,
) -> io::Result<()> {
    let (start, end) = visible_window(line, spans.first().map(|s| s.0).unwrap_or(0), max_columns);

    if start > 0 {
        write!(out, "…")?;
    }

    let mut cursor = start;
    for &(span_start, span_end) in spans {
        let s = span_start.clamp(start, end);
        let e = span_end.clamp(start, end);
        if s >= e {
            continue;
        }
        if s > cursor {
            write!(out, "{}", &line[cursor..s])?;
        }
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "{}", &line[s..e])?;
        out.reset()?;
        cursor = e;
    }
    if cursor < end {
        write!(out, "{}", &line[cursor..end])?;
    }

    if end < line.len() {
        write!(out, "…")?;
    }
    writeln!(out)
}

/// Byte range of `line` to display, aligned to char boundaries.
fn visible_window(line: &str, anchor: usize, max_columns: usize) -> (usize, usize) {
    if max_columns == 0 || line.len() <= max_columns {
        return (0, line.len());
    }

    // Keep a little leading context before the match
    let lead = max_columns / 4;
    let mut start = anchor.saturating_sub(lead).min(line.len() - max_columns);
    while !line.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (start + max_columns).min(line.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    (start, end)
}

/// Write a one-line match count to stderr
pub fn print_match_count(count: usize) {
    let mut stderr = StandardStream::stderr(ColorChoice::Never);
    let _ = writeln!(
        stderr,
        "{} matching file{}",
        count,
        if count == 1 { "" } else { "s" }
    );
}
