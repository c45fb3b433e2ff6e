//! SQLite-backed document store.
//!
//! One database file holds every indexed document keyed by relative path,
//! plus a small key/value metadata table. A [`Store`] owns the connection for
//! the duration of one build or one query session; [`Store::close`] releases
//! it explicitly and `Drop` covers every other exit path.

use crate::error::{Result, SearchError};
use crate::index::types::*;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS documents (
        path TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        size INTEGER NOT NULL,
        generation INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_documents_generation ON documents(generation);
";

const UPSERT_DOCUMENT: &str = "
    INSERT INTO documents (path, content, size, generation)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(path) DO UPDATE SET
        content = excluded.content,
        size = excluded.size,
        generation = excluded.generation";

/// Files SQLite may leave next to the database
pub(crate) const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Open handle on a store file
pub struct Store {
    path: PathBuf,
    conn: Connection,
}

impl Store {
    /// Open the store for a build, creating it (and its parent directory) if absent.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SearchError::io(parent, e))?;
            }
        }

        let fresh = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let conn = Connection::open(path).map_err(|e| classify(path, e))?;

        let store = Self {
            path: path.to_path_buf(),
            conn,
        };

        // Validate before any pragma that persists in the file header
        if fresh {
            store.init_schema()?;
            info!("Created store at {}", path.display());
        } else {
            store.verify_schema()?;
            debug!("Opened existing store at {} for writing", path.display());
        }

        store
            .conn
            .execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA temp_store=MEMORY;
                PRAGMA cache_size=-50000;
                ",
            )
            .map_err(|e| classify(path, e))?;

        Ok(store)
    }

    /// Open an existing store for querying.
    ///
    /// The connection is put in `query_only` mode so the query path can never
    /// modify or create the file.
    pub fn open(path: &Path) -> Result<Self> {
        match fs::metadata(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SearchError::StoreNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(SearchError::io(path, e)),
            Ok(meta) if !meta.is_file() => {
                return Err(corrupt(path, "not a regular file"));
            }
            Ok(meta) if meta.len() == 0 => {
                return Err(corrupt(path, "file is empty"));
            }
            Ok(_) => {}
        }

        // READ_WRITE without CREATE: SQLite still needs write access to replay
        // a WAL left behind by an interrupted build, and falls back to read-only
        // for write-protected files.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| classify(path, e))?;
        conn.execute_batch("PRAGMA query_only = ON;")
            .map_err(|e| classify(path, e))?;

        let store = Self {
            path: path.to_path_buf(),
            conn,
        };
        store.verify_schema()?;
        Ok(store)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Map a SQLite error from this store, surfacing corruption as such.
    pub(crate) fn classify_error(&self, err: rusqlite::Error) -> SearchError {
        classify(&self.path, err)
    }

    /// Release the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| SearchError::Database(e))
    }

    /// Delete a store file and its sidecars. Returns whether anything existed.
    pub fn remove(path: &Path) -> Result<bool> {
        let mut removed = false;
        let mut targets = vec![path.to_path_buf()];
        targets.extend(SIDECAR_SUFFIXES.iter().map(|s| sidecar(path, s)));

        for target in targets {
            match fs::remove_file(&target) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SearchError::io(&target, e)),
            }
        }
        Ok(removed)
    }

    fn init_schema(&self) -> Result<()> {
        let now = unix_now().to_string();
        self.conn.execute_batch(SCHEMA)?;
        set_meta(&self.conn, "schema_version", &STORE_VERSION.to_string())?;
        set_meta(&self.conn, "generation", "0")?;
        set_meta(&self.conn, "created_at", &now)?;
        set_meta(&self.conn, "updated_at", &now)?;
        Ok(())
    }

    /// Structural integrity check run on every open.
    ///
    /// SQLite validates the header and page count on the first read, which
    /// catches truncation; this adds the schema and version checks.
    fn verify_schema(&self) -> Result<()> {
        let path = self.path.as_path();
        let tables: Vec<String> = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .and_then(|mut stmt| {
                stmt.query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(|e| classify(path, e))?;

        for required in ["store_meta", "documents"] {
            if !tables.iter().any(|t| t == required) {
                return Err(corrupt(path, &format!("missing table `{}`", required)));
            }
        }

        let version = get_meta(&self.conn, "schema_version")
            .map_err(|e| classify(path, e))?
            .ok_or_else(|| corrupt(path, "missing schema version"))?;
        if version.parse::<u32>().ok() != Some(STORE_VERSION) {
            return Err(corrupt(
                path,
                &format!("unsupported schema version {}", version),
            ));
        }

        Ok(())
    }

    /// Full `PRAGMA quick_check` scan. Linear in the file size.
    pub fn verify_integrity(&self) -> Result<()> {
        let path = self.path.as_path();
        let problems: Vec<String> = self
            .conn
            .prepare("PRAGMA quick_check")
            .and_then(|mut stmt| {
                stmt.query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()
            })
            .map_err(|e| classify(path, e))?;

        if problems.len() == 1 && problems[0] == "ok" {
            debug!("Integrity check passed for {}", path.display());
            return Ok(());
        }

        let reason = problems.into_iter().take(5).collect::<Vec<_>>().join("; ");
        Err(corrupt(path, &reason))
    }

    /// Start a build: bump the generation and record what is being indexed.
    pub fn begin_build(&mut self, root: &Path, include: &[String]) -> Result<Generation> {
        let include_json = serde_json::to_string(include)
            .map_err(|e| SearchError::Config(format!("cannot encode include patterns: {}", e)))?;

        let tx = self.conn.transaction()?;
        let generation = get_meta(&tx, "generation")?
            .and_then(|v| v.parse::<Generation>().ok())
            .unwrap_or(0)
            + 1;
        set_meta(&tx, "generation", &generation.to_string())?;
        set_meta(&tx, "root_path", &root.to_string_lossy())?;
        set_meta(&tx, "include", &include_json)?;
        tx.commit()?;

        debug!("Starting build generation {}", generation);
        Ok(generation)
    }

    /// Upsert a batch of documents in a single transaction.
    ///
    /// Either every document in the batch is durable afterwards or none is.
    pub fn write_batch(&mut self, docs: &[IndexedDocument], generation: Generation) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_DOCUMENT)?;
            for doc in docs {
                stmt.execute(params![
                    doc.path,
                    doc.content,
                    doc.content.len() as i64,
                    generation
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete documents not touched since `generation` started.
    pub fn prune_before(&mut self, generation: Generation) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM documents WHERE generation < ?1", [generation])?;
        Ok(removed)
    }

    /// Record the build outcome and compact the file for readers.
    pub fn finish_build(&mut self, summary: &BuildSummary) -> Result<()> {
        let tx = self.conn.transaction()?;
        set_meta(&tx, "updated_at", &unix_now().to_string())?;
        set_meta(&tx, "last_indexed", &summary.indexed.to_string())?;
        set_meta(&tx, "last_skipped", &summary.skipped_count().to_string())?;
        tx.commit()?;

        self.conn.execute_batch(
            "
            PRAGMA optimize;
            PRAGMA wal_checkpoint(TRUNCATE);
            PRAGMA journal_mode=DELETE;
            ",
        )?;
        Ok(())
    }

    /// Number of stored documents
    pub fn document_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Fetch one document by path
    pub fn get(&self, path: &str) -> Result<Option<IndexedDocument>> {
        let doc = self
            .conn
            .query_row(
                "SELECT path, content FROM documents WHERE path = ?1",
                [path],
                |row| {
                    Ok(IndexedDocument {
                        path: row.get(0)?,
                        content: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(doc)
    }

    /// Every stored document, ordered by path
    pub fn documents(&self) -> Result<Vec<IndexedDocument>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, content FROM documents ORDER BY path ASC")?;
        let docs = stmt
            .query_map([], |row| {
                Ok(IndexedDocument {
                    path: row.get(0)?,
                    content: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Read the metadata table
    pub fn meta(&self) -> Result<StoreMeta> {
        let number = |key: &str| -> Result<u64> {
            Ok(get_meta(&self.conn, key)?
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0))
        };

        let include = match get_meta(&self.conn, "include")? {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(StoreMeta {
            schema_version: number("schema_version")? as u32,
            root_path: get_meta(&self.conn, "root_path")?.map(PathBuf::from),
            include,
            generation: number("generation")? as Generation,
            created_at: number("created_at")?,
            updated_at: number("updated_at")?,
            last_indexed: number("last_indexed")? as usize,
            last_skipped: number("last_skipped")? as usize,
        })
    }

    /// Aggregate statistics for display
    pub fn stats(&self) -> Result<StoreStats> {
        let (doc_count, content_bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let file_size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            meta: self.meta()?,
            doc_count: doc_count as usize,
            content_bytes: content_bytes as u64,
            file_size,
        })
    }
}

fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

fn corrupt(path: &Path, reason: &str) -> SearchError {
    SearchError::StoreCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Map a SQLite error raised while opening or validating a store.
fn classify(path: &Path, err: rusqlite::Error) -> SearchError {
    if SearchError::is_corruption(&err) {
        corrupt(path, &err.to_string())
    } else {
        SearchError::Database(err)
    }
}

/// Whether `candidate` is the store at `store_path` or one of its sidecars.
///
/// Both paths must be canonical.
pub(crate) fn is_store_file(candidate: &Path, store_path: &Path) -> bool {
    if candidate.parent() != store_path.parent() {
        return false;
    }
    let (Some(name), Some(store_name)) = (candidate.file_name(), store_path.file_name()) else {
        return false;
    };

    name == store_name
        || SIDECAR_SUFFIXES.iter().any(|suffix| {
            let mut sidecar_name = store_name.to_os_string();
            sidecar_name.push(suffix);
            name == sidecar_name.as_os_str()
        })
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
