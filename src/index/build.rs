use crate::error::{Result, SearchError};
use crate::index::store::{is_store_file, Store};
use crate::index::types::*;
use crate::index::writer::BatchWriter;
use crate::utils::{decode_text, format_duration, format_size, progress};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Skipped files listed individually before the report collapses the rest
const SKIP_REPORT_LIMIT: usize = 20;

/// A file selected by the walker
struct Candidate {
    full_path: PathBuf,
    rel_path: PathBuf,
}

/// Read and decode a single file. Errors become skipped entries, never build failures.
fn load_candidate(candidate: &Candidate) -> Result<IndexedDocument> {
    let bytes = fs::read(&candidate.full_path).map_err(|e| SearchError::io(&candidate.full_path, e))?;
    let text = decode_text(bytes).map_err(|source| SearchError::Decode {
        path: candidate.rel_path.clone(),
        source,
    })?;
    Ok(IndexedDocument::from_relative(&candidate.rel_path, text))
}

/// Compile the include globs. Patterns match the path relative to the root.
pub fn build_content_filter(patterns: &[String]) -> Result<GlobSet> {
    if patterns.is_empty() {
        return Err(SearchError::Config("at least one include pattern is required".into()));
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SearchError::Config(format!("invalid include pattern `{}`: {}", pattern, e))
        })?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| SearchError::Config(format!("invalid include patterns: {}", e)))
}

/// Validate the root directory and return its canonical form.
pub fn check_root(root: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(root).map_err(|e| SearchError::io(root, e))?;
    if !meta.is_dir() {
        return Err(SearchError::NotADirectory(root.to_path_buf()));
    }

    // Listing proves readability; metadata alone succeeds on 0o000 dirs
    fs::read_dir(root).map_err(|e| SearchError::io(root, e))?;
    root.canonicalize().map_err(|e| SearchError::io(root, e))
}

/// Walk the root and collect every file the filter accepts.
///
/// Hidden files are included and ignore files are not honoured: an export
/// tree is not a source checkout. Walk errors become skipped entries.
fn discover(
    root: &Path,
    filter: &GlobSet,
    store_path: Option<&Path>,
    skipped: &mut Vec<SkippedFile>,
) -> Vec<Candidate> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut candidates = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = walk_error_path(&err, root);
                warn!("Skipping {}: {}", path.display(), err);
                skipped.push(SkippedFile {
                    path,
                    reason: format!("walk failed: {}", err),
                });
                continue;
            }
        };

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let full_path = entry.path();

        // The store and its sidecars may live inside the tree being indexed
        if store_path.is_some_and(|store| is_store_file(full_path, store)) {
            continue;
        }

        let Ok(rel_path) = full_path.strip_prefix(root) else {
            continue;
        };
        if !filter.is_match(rel_path) {
            continue;
        }

        candidates.push(Candidate {
            full_path: full_path.to_path_buf(),
            rel_path: rel_path.to_path_buf(),
        });
    }

    candidates
}

fn walk_error_path(err: &ignore::Error, root: &Path) -> PathBuf {
    match err {
        ignore::Error::WithPath { path, .. } => path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf(),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err, root)
        }
        _ => root.to_path_buf(),
    }
}

/// Build or refresh the store from every matching file under `root_path`.
///
/// Documents are upserted in batches; each batch is one transaction. Files
/// that cannot be read or decoded are skipped and listed in the summary.
/// When the walk completes, documents whose files no longer exist are pruned.
pub fn build_index(root_path: &Path, store_path: &Path, config: &IndexConfig) -> Result<BuildSummary> {
    let start = Instant::now();
    let root = check_root(root_path)?;
    let filter = build_content_filter(&config.include)?;
    let silent = config.silent;

    if config.force && Store::remove(store_path)? {
        info!("Removed existing store at {}", store_path.display());
    }

    let mut store = Store::create(store_path)?;
    let store_canonical = store_path.canonicalize().ok();

    if !silent {
        println!("Indexing: {}", root.display());
    }
    info!("Indexing {} into {}", root.display(), store_path.display());

    // Phase 1: discover files
    let discover_spinner = progress::spinner("Discovering files...", silent);
    let mut skipped = Vec::new();
    let candidates = discover(&root, &filter, store_canonical.as_deref(), &mut skipped);
    if let Some(spinner) = discover_spinner {
        spinner.finish_with_message(format!("Found {} files", candidates.len()));
    }

    // Phase 2: read in parallel, write in batches on this thread
    let generation = store.begin_build(&root, &config.include)?;
    let bar = progress::file_bar(candidates.len() as u64, silent);

    let totals = {
        let mut writer = BatchWriter::new(
            &mut store,
            generation,
            config.batch_size,
            config.max_batch_bytes,
        );

        for chunk in candidates.chunks(config.read_ahead.max(1)) {
            let loaded: Vec<Result<IndexedDocument>> =
                chunk.par_iter().map(load_candidate).collect();

            for (candidate, item) in chunk.iter().zip(loaded) {
                match item {
                    Ok(doc) => {
                        writer.push(doc)?;
                    }
                    Err(err) => {
                        let file = SkippedFile::from_error(candidate.rel_path.clone(), &err);
                        warn!("Skipping {}: {}", file.path.display(), file.reason);
                        skipped.push(file);
                    }
                }

                if let Some(ref pb) = bar {
                    pb.inc(1);
                }
            }
        }

        writer.finish()?
    };

    if let Some(pb) = bar {
        pb.finish_with_message(format!("{} batches", totals.batches));
    }

    // Phase 3: prune and finalize
    let finalize_spinner = progress::spinner("Finalizing store...", silent);

    let pruned = store.prune_before(generation)?;
    let summary = BuildSummary {
        indexed: totals.documents,
        skipped,
        pruned,
        batches: totals.batches,
        bytes: totals.bytes,
        elapsed: start.elapsed(),
    };
    store.finish_build(&summary)?;
    store.close()?;

    if let Some(spinner) = finalize_spinner {
        spinner.finish_with_message("Store complete");
    }

    info!(
        "Indexed {} files, skipped {}, pruned {} in {:?}",
        summary.indexed,
        summary.skipped_count(),
        summary.pruned,
        summary.elapsed
    );

    if !silent {
        print_summary(&summary, store_path);
    }

    Ok(summary)
}

fn print_summary(summary: &BuildSummary, store_path: &Path) {
    println!(
        "Indexed {} files ({}) in {} batches, {}",
        summary.indexed,
        format_size(summary.bytes),
        summary.batches,
        format_duration(summary.elapsed)
    );
    if summary.pruned > 0 {
        println!("Removed {} documents for files no longer present", summary.pruned);
    }
    println!("Store: {}", store_path.display());

    if !summary.skipped.is_empty() {
        eprintln!("Skipped {} files:", summary.skipped_count());
        for file in summary.skipped.iter().take(SKIP_REPORT_LIMIT) {
            eprintln!("  {}: {}", file.path.display(), file.reason);
        }
        if summary.skipped.len() > SKIP_REPORT_LIMIT {
            eprintln!("  ... and {} more", summary.skipped.len() - SKIP_REPORT_LIMIT);
        }
    }
}
