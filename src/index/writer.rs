use crate::error::Result;
use crate::index::store::Store;
use crate::index::types::{Generation, IndexedDocument};
use tracing::debug;

/// Accumulates documents and commits them to the store in bounded batches.
///
/// A batch is committed when it reaches `max_docs` documents or `max_bytes`
/// of content, whichever comes first. Documents still pending when the
/// writer is dropped without [`BatchWriter::finish`] are discarded, so an
/// interrupted build only ever leaves whole batches behind.
pub struct BatchWriter<'a> {
    store: &'a mut Store,
    generation: Generation,
    max_docs: usize,
    max_bytes: u64,
    pending: Vec<IndexedDocument>,
    pending_bytes: u64,
    committed_docs: usize,
    committed_bytes: u64,
    batches: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a mut Store, generation: Generation, max_docs: usize, max_bytes: u64) -> Self {
        let max_docs = max_docs.max(1);
        Self {
            store,
            generation,
            max_docs,
            max_bytes: max_bytes.max(1),
            pending: Vec::with_capacity(max_docs.min(4096)),
            pending_bytes: 0,
            committed_docs: 0,
            committed_bytes: 0,
            batches: 0,
        }
    }

    /// Queue a document, committing the batch if a limit is reached.
    /// Returns `true` when this call committed a batch.
    pub fn push(&mut self, doc: IndexedDocument) -> Result<bool> {
        self.pending_bytes += doc.content.len() as u64;
        self.pending.push(doc);

        if self.pending.len() >= self.max_docs || self.pending_bytes >= self.max_bytes {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Commit whatever is pending.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        self.store.write_batch(&self.pending, self.generation)?;

        self.batches += 1;
        self.committed_docs += self.pending.len();
        self.committed_bytes += self.pending_bytes;
        debug!(
            "Committed batch {} ({} documents, {:.1} MB)",
            self.batches,
            self.pending.len(),
            self.pending_bytes as f64 / 1024.0 / 1024.0
        );

        self.pending.clear();
        self.pending_bytes = 0;
        Ok(())
    }

    /// Flush the final partial batch and report totals.
    pub fn finish(mut self) -> Result<WriteTotals> {
        self.flush()?;
        Ok(WriteTotals {
            documents: self.committed_docs,
            bytes: self.committed_bytes,
            batches: self.batches,
        })
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Totals reported once a writer finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteTotals {
    pub documents: usize,
    pub bytes: u64,
    pub batches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flush_on_doc_limit() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::create(&temp.path().join("store.db")).unwrap();
        let generation = store.begin_build(temp.path(), &[]).unwrap();

        let mut writer = BatchWriter::new(&mut store, generation, 2, u64::MAX);
        assert!(!writer.push(IndexedDocument::new("a.json", "1")).unwrap());
        assert!(writer.push(IndexedDocument::new("b.json", "2")).unwrap());
        assert_eq!(writer.pending_len(), 0);
        assert!(!writer.push(IndexedDocument::new("c.json", "3")).unwrap());

        let totals = writer.finish().unwrap();
        assert_eq!(totals.documents, 3);
        assert_eq!(totals.batches, 2);
        assert_eq!(store.document_count().unwrap(), 3);
    }

    #[test]
    fn test_flush_on_byte_limit() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::create(&temp.path().join("store.db")).unwrap();
        let generation = store.begin_build(temp.path(), &[]).unwrap();

        let mut writer = BatchWriter::new(&mut store, generation, 1000, 10);
        assert!(!writer.push(IndexedDocument::new("a.json", "12345")).unwrap());
        assert!(writer.push(IndexedDocument::new("b.json", "67890")).unwrap());

        let totals = writer.finish().unwrap();
        assert_eq!(totals.batches, 1);
        assert_eq!(totals.bytes, 10);
    }

    #[test]
    fn test_dropped_writer_discards_pending() {
        let temp = TempDir::new().unwrap();
        let mut store = Store::create(&temp.path().join("store.db")).unwrap();
        let generation = store.begin_build(temp.path(), &[]).unwrap();

        {
            let mut writer = BatchWriter::new(&mut store, generation, 2, u64::MAX);
            writer.push(IndexedDocument::new("a.json", "1")).unwrap();
            writer.push(IndexedDocument::new("b.json", "2")).unwrap();
            writer.push(IndexedDocument::new("c.json", "3")).unwrap();
            // Interrupted before finish()
        }

        assert_eq!(store.document_count().unwrap(), 2);
        assert!(store.get("c.json").unwrap().is_none());
    }
}
