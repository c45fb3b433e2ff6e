use crate::error::Result;
use crate::index::store::Store;
use crate::utils::{format_size, format_timestamp};
use std::path::Path;

/// Display store statistics
pub fn show_stats(store_path: &Path) -> Result<()> {
    let store = Store::open(store_path)?;
    let stats = store.stats()?;
    store.close()?;

    println!("Store Statistics");
    println!("================");
    println!();
    println!("Store location:   {}", store_path.display());
    println!("Schema version:   {}", stats.meta.schema_version);
    println!(
        "Root path:        {}",
        stats
            .meta
            .root_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(never built)".to_string())
    );
    println!("Include:          {}", stats.meta.include.join(", "));
    println!("Document count:   {}", stats.doc_count);
    println!("Content size:     {}", format_size(stats.content_bytes));
    println!("Store size:       {}", format_size(stats.file_size));
    println!("Builds:           {}", stats.meta.generation);

    println!();
    println!("Last build:");
    println!("  Indexed:        {}", stats.meta.last_indexed);
    println!("  Skipped:        {}", stats.meta.last_skipped);

    println!();
    println!("Created:          {}", format_timestamp(stats.meta.created_at));
    println!("Updated:          {}", format_timestamp(stats.meta.updated_at));

    Ok(())
}
