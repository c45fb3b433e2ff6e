//! End-to-end tests for the dumpsearch binary.
//!
//! Each test gets its own export tree, store and config path under a temp
//! directory, so nothing touches the user's app data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("Output")).unwrap();
        Self { dir }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("Output")
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("store.db")
    }

    fn write(&self, rel: &str, content: &[u8]) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Run dumpsearch against this workspace's store
    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dumpsearch"))
            .arg("--store")
            .arg(self.store())
            .arg("--config")
            .arg(self.dir.path().join("config.json"))
            .args(args)
            .env_remove("RUST_LOG")
            .env_remove("DUMPSEARCH_STORE")
            .output()
            .expect("Failed to run dumpsearch")
    }

    fn build(&self) -> Output {
        let root = self.root();
        let output = self.run(&["build", root.to_str().unwrap(), "--quiet"]);
        assert!(
            output.status.success(),
            "build failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }

    fn query(&self, args: &[&str]) -> Output {
        let mut full = vec!["query", "--color", "never"];
        full.extend_from_slice(args);
        self.run(&full)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("terminated by signal")
}

fn sample_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write("Weapons/Sword.json", b"{\n  \"Name\": \"The king rules\"\n}\n");
    ws.write("Weapons/Axe.json", b"{\n  \"Name\": \"KING\"\n}\n");
    ws.write("Items/Potion.json", b"{\n  \"Name\": \"queen\",\n  \"Effect\": \"Alpha Energy\"\n}\n");
    ws.write("notes.txt", b"king but not json");
    ws
}

#[test]
fn test_query_is_case_sensitive_by_default() {
    let ws = sample_workspace();
    ws.build();

    let lower = ws.query(&["-l", "king"]);
    assert_eq!(code(&lower), 0);
    assert_eq!(stdout(&lower), "Weapons/Sword.json\n");

    let upper = ws.query(&["-l", "KING"]);
    assert_eq!(code(&upper), 0);
    assert_eq!(stdout(&upper), "Weapons/Axe.json\n");
}

#[test]
fn test_ignore_case_matches_both() {
    let ws = sample_workspace();
    ws.build();

    let output = ws.query(&["-l", "-i", "king"]);
    assert_eq!(code(&output), 0);
    assert_eq!(stdout(&output), "Weapons/Axe.json\nWeapons/Sword.json\n");
}

#[test]
fn test_non_json_files_are_not_indexed() {
    let ws = sample_workspace();
    ws.build();

    let output = ws.query(&["-l", "not json"]);
    assert_eq!(code(&output), 0);
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_snippet_output() {
    let ws = sample_workspace();
    ws.build();

    let output = ws.query(&["king"]);
    assert_eq!(code(&output), 0);
    assert_eq!(stdout(&output), "Weapons/Sword.json\n2:  \"Name\": \"The king rules\"\n");
    assert!(stderr(&output).contains("1 matching file"));
}

#[test]
fn test_multi_word_term_is_a_phrase() {
    let ws = sample_workspace();
    ws.build();

    let phrase = ws.query(&["-l", "Alpha", "Energy"]);
    assert_eq!(stdout(&phrase), "Items/Potion.json\n");

    let swapped = ws.query(&["-l", "Energy", "Alpha"]);
    assert_eq!(stdout(&swapped), "");

    let all = ws.query(&["-l", "--all", "Energy", "Alpha"]);
    assert_eq!(stdout(&all), "Items/Potion.json\n");

    let any = ws.query(&["-l", "--any", "queen", "KING"]);
    assert_eq!(stdout(&any), "Items/Potion.json\nWeapons/Axe.json\n");
}

#[test]
fn test_pattern_mode() {
    let ws = sample_workspace();
    ws.build();

    let output = ws.query(&["-l", "--pattern", "Alpha*Energy"]);
    assert_eq!(code(&output), 0);
    assert_eq!(stdout(&output), "Items/Potion.json\n");

    let literal = ws.query(&["-l", "Alpha*Energy"]);
    assert_eq!(stdout(&literal), "");
}

#[test]
fn test_files_listed_in_path_order() {
    let ws = Workspace::new();
    for rel in ["z.json", "m.json", "a/b.json", "B.json", "a.json"] {
        ws.write(rel, b"{\"tag\": \"common\"}");
    }
    ws.build();

    let first = stdout(&ws.query(&["-l", "common"]));
    let second = stdout(&ws.query(&["-l", "common"]));
    assert_eq!(first, "B.json\na.json\na/b.json\nm.json\nz.json\n");
    assert_eq!(first, second);
}

#[test]
fn test_limit() {
    let ws = Workspace::new();
    for i in 0..5 {
        ws.write(&format!("file_{}.json", i), b"{\"tag\": \"common\"}");
    }
    ws.build();

    let output = ws.query(&["-l", "--limit", "2", "common"]);
    assert_eq!(stdout(&output), "file_0.json\nfile_1.json\n");
}

#[test]
fn test_empty_query_is_rejected() {
    let ws = sample_workspace();
    ws.build();

    for term in ["", "   "] {
        let output = ws.query(&[term]);
        assert_eq!(code(&output), 2, "term {:?}", term);
        assert!(stderr(&output).contains("Invalid query"));
        assert_eq!(stdout(&output), "");
    }
}

#[test]
fn test_missing_store() {
    let ws = sample_workspace();

    let output = ws.query(&["king"]);
    assert_eq!(code(&output), 3);
    assert!(stderr(&output).contains("dumpsearch build"));
    assert!(!ws.store().exists(), "query must not create a store");
}

#[test]
fn test_truncated_store_is_reported_as_corrupt() {
    let ws = Workspace::new();
    let filler = "x".repeat(1000);
    for i in 0..50 {
        ws.write(
            &format!("Data/Entry_{:02}.json", i),
            format!("{{\"Id\": {}, \"Blob\": \"{}\"}}", i, filler).as_bytes(),
        );
    }
    ws.build();

    let len = fs::metadata(ws.store()).unwrap().len();
    let file = fs::OpenOptions::new().write(true).open(ws.store()).unwrap();
    file.set_len(len / 2).unwrap();
    drop(file);

    let output = ws.query(&["Entry"]);
    assert_eq!(code(&output), 4, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("corrupt"));
}

#[test]
fn test_garbage_store_is_reported_as_corrupt() {
    let ws = sample_workspace();
    fs::write(ws.store(), b"this is not a database at all, just some text").unwrap();

    let output = ws.query(&["king"]);
    assert_eq!(code(&output), 4);
}

#[test]
fn test_invalid_utf8_file_is_skipped_and_reported() {
    let ws = sample_workspace();
    ws.write("Broken/bad.json", b"{\"Name\": \"king \xff\xfe\"}");

    let output = ws.build();
    let err = stderr(&output);
    assert!(err.contains("bad.json"), "stderr: {}", err);
    assert!(err.contains("invalid UTF-8"), "stderr: {}", err);

    let query = ws.query(&["-l", "king"]);
    assert_eq!(stdout(&query), "Weapons/Sword.json\n");
}

#[test]
fn test_rebuild_reflects_changes() {
    let ws = sample_workspace();
    ws.build();

    fs::remove_file(ws.root().join("Weapons/Sword.json")).unwrap();
    ws.write("Weapons/Bow.json", b"{\"Name\": \"the king's bow\"}");
    ws.build();

    let output = ws.query(&["-l", "king"]);
    assert_eq!(stdout(&output), "Weapons/Bow.json\n");

    let stats = ws.run(&["stats"]);
    assert_eq!(code(&stats), 0);
    assert!(stdout(&stats).contains("Document count:   3"));
}

#[test]
fn test_build_missing_root() {
    let ws = Workspace::new();
    let missing = ws.dir.path().join("nope");

    let output = ws.run(&["build", missing.to_str().unwrap(), "--quiet"]);
    assert_eq!(code(&output), 1);
    assert!(stderr(&output).contains("not found"));
}

#[test]
fn test_remove() {
    let ws = sample_workspace();
    ws.build();
    assert!(ws.store().exists());

    let output = ws.run(&["remove"]);
    assert_eq!(code(&output), 0);
    assert!(!ws.store().exists());

    let query = ws.query(&["king"]);
    assert_eq!(code(&query), 3);
}

#[test]
fn test_source_tree_untouched() {
    let ws = sample_workspace();
    let before = snapshot(&ws.root());
    ws.build();
    ws.query(&["king"]);
    assert_eq!(before, snapshot(&ws.root()));
}

fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut entries: Vec<_> = walk(root)
        .into_iter()
        .map(|p| {
            let bytes = fs::read(&p).unwrap();
            (p, bytes)
        })
        .collect();
    entries.sort();
    entries
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
