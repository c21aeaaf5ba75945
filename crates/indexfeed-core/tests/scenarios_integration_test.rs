//! End-to-end runs against a stand-in indexer executable

#![cfg(unix)]

mod common;

use common::{listing, FakeSwish};
use indexfeed_core::{
    AggregatorConfig, Document, FileProvider, IndexFeedError, Indexer, IndexerState, MemorySink,
    Pipeline, SqlProvider,
};
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Log output collected from a `tracing` subscriber
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn with_captured_log<T>(f: impl FnOnce() -> T) -> (T, String) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, log.text())
}

fn write_index(dir: &std::path::Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
    fs::write(dir.join(format!("{}.prop", name)), format!("{}-props", content)).unwrap();
}

#[test]
fn test_directory_index_skips_vcs_dirs() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("a.html"), "<html><title>A</title>alpha</html>").unwrap();
    fs::create_dir_all(source.path().join(".git")).unwrap();
    fs::write(source.path().join(".git/config"), "[core]").unwrap();
    fs::write(source.path().join(".git/notes.html"), "<p>never</p>").unwrap();

    let work = TempDir::new().unwrap();
    let fake = FakeSwish::install(work.path(), false);
    let index = work.path().join("site.index");

    let mut indexer = Indexer::new(&index, fake.config());
    indexer.start().unwrap();
    assert_eq!(indexer.state(), IndexerState::Running);

    let config = AggregatorConfig::default();
    let mut provider = FileProvider::new(&[source.path().to_path_buf()], &config).unwrap();
    let mut pipeline = Pipeline::new(indexer, &config).unwrap();
    assert_eq!(pipeline.index_source(&mut provider).unwrap(), 1);

    let mut indexer = pipeline.into_sink();
    indexer.finish().unwrap();
    assert_eq!(indexer.state(), IndexerState::Closed);

    let stream = fs::read_to_string(&index).unwrap();
    assert!(stream.starts_with("Content-Length: 34\n"));
    assert!(stream.contains("Document-Type: HTML*\n"));
    assert!(stream.contains("a.html\n\n<html>"));
    assert!(!stream.contains(".git"));
    assert!(!stream.contains("never"));

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].ends_with("-v 1 -W 2 -S prog -i stdin"));
}

#[test]
fn test_database_rows_become_documents() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("movies.db");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE movies (title TEXT, year INTEGER);
         INSERT INTO movies VALUES ('Alien', 1979);
         INSERT INTO movies VALUES ('Heat', 1995);
         INSERT INTO movies VALUES ('Up', 2009);",
    )
    .unwrap();
    drop(conn);

    let mut provider = SqlProvider::open(db_path.to_str().unwrap()).unwrap();
    let mut pipeline = Pipeline::new(MemorySink::new(), &AggregatorConfig::default()).unwrap();
    assert_eq!(pipeline.index_source(&mut provider).unwrap(), 3);

    let docs = &pipeline.sink().documents;
    let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["1", "2", "3"]);
    for doc in docs {
        assert!(doc.content_str().contains("<table>movies</table>"));
    }
    assert!(docs[1].content_str().contains("<title>Heat</title>"));
    assert!(docs[2].content_str().contains("<year>2009</year>"));
}

#[test]
fn test_merge_replaces_target() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    write_index(dir.path(), "A", "a");
    write_index(dir.path(), "B", "b");
    write_index(dir.path(), "C", "c");

    let mut indexer = Indexer::new(dir.path().join("A"), fake.config());
    indexer
        .merge([dir.path().join("B"), dir.path().join("C")])
        .unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("A")).unwrap(), "abc");
    assert_eq!(fs::read_to_string(dir.path().join("A.prop")).unwrap(), "merged");
    assert_eq!(fs::read_to_string(dir.path().join("B")).unwrap(), "b");
    assert_eq!(
        listing(dir.path()),
        vec!["A", "A.prop", "B", "B.prop", "C", "C.prop", "calls.log", "swish-e"]
    );
    assert!(fake.calls()[0].contains("-M"));
}

#[test]
fn test_failed_merge_leaves_target_untouched() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), true);
    write_index(dir.path(), "A", "a");
    write_index(dir.path(), "B", "b");
    write_index(dir.path(), "C", "c");

    let mut indexer = Indexer::new(dir.path().join("A"), fake.config());
    let err = indexer
        .merge([dir.path().join("B"), dir.path().join("C")])
        .unwrap_err();

    assert!(matches!(err, IndexFeedError::Process { .. }));
    assert!(err.to_string().contains("merge failed"));
    assert_eq!(fs::read_to_string(dir.path().join("A")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dir.path().join("A.prop")).unwrap(), "a-props");
    assert!(!listing(dir.path()).iter().any(|n| n.starts_with(".indexfeed")));
}

#[test]
fn test_merge_warns_above_source_limit() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    let sources: Vec<_> = (0..61)
        .map(|i| {
            let name = format!("part{:02}", i);
            write_index(dir.path(), &name, "x");
            dir.path().join(name)
        })
        .collect();

    let mut indexer = Indexer::new(dir.path().join("all"), fake.config());
    let (result, log) = with_captured_log(|| indexer.merge(sources.clone()));

    result.unwrap();
    assert!(log.contains("Merging 61 indexes at once"));
    assert_eq!(fs::read_to_string(dir.path().join("all")).unwrap(), "x".repeat(61));
}

#[test]
fn test_merge_at_source_limit_does_not_warn() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    let sources: Vec<_> = (0..60)
        .map(|i| {
            let name = format!("part{:02}", i);
            write_index(dir.path(), &name, "x");
            dir.path().join(name)
        })
        .collect();

    let mut indexer = Indexer::new(dir.path().join("all"), fake.config());
    let (result, log) = with_captured_log(|| indexer.merge(sources.clone()));

    result.unwrap();
    assert!(!log.contains("open file limit"));
}

#[test]
fn test_incomplete_merge_output_restores_target() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install_without_merge_props(dir.path());
    write_index(dir.path(), "A", "a");
    write_index(dir.path(), "B", "b");
    write_index(dir.path(), "C", "c");

    let mut indexer = Indexer::new(dir.path().join("A"), fake.config());
    let err = indexer
        .merge([dir.path().join("B"), dir.path().join("C")])
        .unwrap_err();

    assert!(matches!(err, IndexFeedError::Process { .. }));
    assert!(err.to_string().contains("could not move merged index"));
    assert_eq!(fs::read_to_string(dir.path().join("A")).unwrap(), "a");
    assert_eq!(fs::read_to_string(dir.path().join("A.prop")).unwrap(), "a-props");
    assert!(!listing(dir.path()).iter().any(|n| n.starts_with(".indexfeed")));
}

#[test]
fn test_merge_with_one_source_never_runs() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    write_index(dir.path(), "A", "a");
    write_index(dir.path(), "B", "b");

    let mut indexer = Indexer::new(dir.path().join("A"), fake.config());
    let err = indexer.merge([dir.path().join("B")]).unwrap_err();

    assert!(matches!(err, IndexFeedError::InvalidInput(_)));
    assert!(fake.calls().is_empty());
    assert_eq!(fs::read_to_string(dir.path().join("A")).unwrap(), "a");
}

#[test]
fn test_add_merges_and_cleans_scratch() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    write_index(dir.path(), "A", "a");

    let mut indexer = Indexer::new(dir.path().join("A"), fake.config());
    let doc = Document::new("notes/new.txt", "fresh text", "text/plain");
    indexer.add(&doc).unwrap();

    let merged = fs::read_to_string(dir.path().join("A")).unwrap();
    assert!(merged.starts_with("aContent-Length: 10\n"));
    assert!(merged.ends_with("Path-Name: notes/new.txt\n\nfresh text"));
    assert_eq!(listing(dir.path()), vec!["A", "A.prop", "calls.log", "swish-e"]);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("-S prog -i stdin"));
    assert!(calls[1].contains("-M"));
}

#[test]
fn test_add_creates_missing_target() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);

    let mut indexer = Indexer::new(dir.path().join("fresh"), fake.config());
    indexer
        .add(&Document::new("one.txt", "one", "text/plain"))
        .unwrap();

    assert!(indexer.handle().exists());
    assert_eq!(listing(dir.path()), vec!["calls.log", "fresh", "fresh.prop", "swish-e"]);
    assert_eq!(fake.calls().len(), 1);
}

#[test]
fn test_empty_run_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);

    let mut indexer = Indexer::new(dir.path().join("empty"), fake.config());
    indexer.start().unwrap();
    indexer.finish().unwrap();
    assert_eq!(indexer.documents_written(), 0);
}

#[test]
fn test_failed_run_is_process_error() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), true);

    let mut indexer = Indexer::new(dir.path().join("idx"), fake.config());
    indexer.start().unwrap();
    indexer
        .write(&Document::new("a.txt", "a", "text/plain"))
        .unwrap();
    let err = indexer.finish().unwrap_err();
    assert!(matches!(err, IndexFeedError::Process { ref command, .. } if command.contains("-f")));
    assert!(indexer.start().is_err());
}

#[test]
fn test_settings_materialized_for_run() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSwish::install(dir.path(), false);
    let conf = dir.path().join("swish.conf");

    let mut config = fake.config();
    config
        .settings
        .insert("MetaNames".to_string(), vec!["title".to_string(), "year".to_string()]);
    config.config_file = Some(conf.clone());

    let mut indexer = Indexer::new(dir.path().join("idx"), config);
    indexer.start().unwrap();
    indexer
        .write(&Document::new("a.txt", "a", "text/plain"))
        .unwrap();
    indexer.finish().unwrap();

    assert_eq!(fs::read_to_string(&conf).unwrap(), "MetaNames title year\n");
    assert!(fake.calls()[0].ends_with(&format!("-c {}", conf.display())));
}
