//! SQL Provider for indexing database content
//!
//! Every row of every configured table (all user tables by default) becomes
//! one XML document. Supports SQLite databases.

use super::{FilterHook, SourceProvider, TitleHook, UrlHook};
use crate::document::{Document, ParserHint};
use crate::error::{IndexFeedError, Result};
use crate::xml::XmlBuilder;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, warn};

/// Which table to index and how
#[derive(Debug, Clone, Default)]
pub struct TableSpec {
    pub name: String,
    /// Columns to select; empty selects every column
    pub columns: Vec<String>,
    pub title_column: Option<String>,
    pub url_column: Option<String>,
    /// Columns wrapped in the excerpt element
    pub description_columns: Vec<String>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title_column(mut self, column: impl Into<String>) -> Self {
        self.title_column = Some(column.into());
        self
    }

    pub fn with_url_column(mut self, column: impl Into<String>) -> Self {
        self.url_column = Some(column.into());
        self
    }

    pub fn with_description_column(mut self, column: impl Into<String>) -> Self {
        self.description_columns.push(column.into());
        self
    }
}

/// One fetched row
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRow {
    pub table: String,
    /// 1-based position within its table
    pub row_number: u64,
    pub columns: Vec<(String, String)>,
}

impl SqlRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }
}

/// A table still to be read, from `offset` rows in
#[derive(Debug, Clone)]
struct TableCursor {
    spec: TableSpec,
    offset: u64,
    /// Row count, looked up once a row fails
    total: Option<u64>,
}

/// Provider for extracting content from SQL databases
pub struct SqlProvider {
    conn: Connection,
    db_path: String,
    configured: Vec<TableSpec>,
    tables: Option<VecDeque<TableCursor>>,
    fetched: Vec<TableSpec>,
    /// Rows and row-level errors, in table order
    pending: VecDeque<Result<SqlRow>>,
    title_hook: Option<TitleHook<SqlRow>>,
    url_hook: Option<UrlHook<SqlRow>>,
    row_filter: Option<FilterHook<SqlRow>>,
}

impl SqlProvider {
    /// Open a database read-only
    pub fn open(db_path: &str) -> Result<Self> {
        if db_path.trim().is_empty() {
            return Err(IndexFeedError::Config(
                "SQL provider requires a database path".to_string(),
            ));
        }
        if !Path::new(db_path).exists() {
            return Err(IndexFeedError::Config(format!(
                "Database file does not exist: {}",
                db_path
            )));
        }

        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self {
            conn,
            db_path: db_path.to_string(),
            configured: Vec::new(),
            tables: None,
            fetched: Vec::new(),
            pending: VecDeque::new(),
            title_hook: None,
            url_hook: None,
            row_filter: None,
        })
    }

    /// Restrict indexing to this table; may be called more than once
    pub fn with_table(mut self, spec: TableSpec) -> Self {
        self.configured.push(spec);
        self
    }

    pub fn with_title_hook(mut self, hook: impl Fn(&SqlRow) -> Option<String> + Send + Sync + 'static) -> Self {
        self.title_hook = Some(Box::new(hook));
        self
    }

    pub fn with_url_hook(mut self, hook: impl Fn(&SqlRow) -> Option<String> + Send + Sync + 'static) -> Self {
        self.url_hook = Some(Box::new(hook));
        self
    }

    pub fn with_row_filter(mut self, hook: impl Fn(SqlRow) -> SqlRow + Send + Sync + 'static) -> Self {
        self.row_filter = Some(Box::new(hook));
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// User tables, sorted by name
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Column names of `table`, in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if columns.is_empty() {
            return Err(IndexFeedError::InvalidInput(format!(
                "Table '{}' not found in {}",
                table, self.db_path
            )));
        }
        Ok(columns)
    }

    fn resolve_tables(&self) -> Result<VecDeque<TableCursor>> {
        let specs = if self.configured.is_empty() {
            self.list_tables()?.into_iter().map(TableSpec::new).collect()
        } else {
            self.configured.clone()
        };

        let mut resolved = VecDeque::new();
        for mut spec in specs {
            if spec.columns.is_empty() {
                spec.columns = self.table_columns(&spec.name)?;
            }
            resolved.push_back(TableCursor {
                spec,
                offset: 0,
                total: None,
            });
        }
        Ok(resolved)
    }

    fn count_rows(&self, table: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Buffer the rows of `cursor`'s table from its offset on.
    ///
    /// A row that fails to step is buffered as an error, and the table is
    /// queued again to resume just past it. Rows fetched before the failure
    /// are kept.
    fn fetch_table(&mut self, mut cursor: TableCursor) -> Result<()> {
        let spec = &cursor.spec;
        let select = spec
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {} FROM {} LIMIT -1 OFFSET {}",
            select,
            quote_ident(&spec.name),
            cursor.offset
        );
        debug!("{}: {}", self.db_path, query);

        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|e| IndexFeedError::InvalidInput(format!("Invalid SQL query: {}", e)))?;

        let mut fetched = Vec::new();
        let mut failed_at = None;
        let mut rows = stmt.query([])?;
        let mut row_number = cursor.offset;
        loop {
            row_number += 1;
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    fetched.push(Err(IndexFeedError::from(e)));
                    failed_at = Some(row_number);
                    break;
                }
            };
            let columns = spec
                .columns
                .iter()
                .enumerate()
                .map(|(idx, name)| Ok((name.clone(), value_to_string(row.get_ref(idx)?))))
                .collect::<rusqlite::Result<Vec<_>>>();
            fetched.push(columns.map_err(IndexFeedError::from).map(|columns| SqlRow {
                table: spec.name.clone(),
                row_number,
                columns,
            }));
        }
        drop(rows);
        drop(stmt);
        self.pending.extend(fetched);

        if let Some(position) = failed_at {
            let total = match cursor.total {
                Some(total) => Some(total),
                None => match self.count_rows(&cursor.spec.name) {
                    Ok(total) => Some(total),
                    Err(e) => {
                        warn!("Cannot resume {} after row {}: {}", cursor.spec.name, position, e);
                        None
                    }
                },
            };
            if let Some(total) = total.filter(|&total| position < total) {
                debug!("Resuming {} after failed row {}", cursor.spec.name, position);
                cursor.offset = position;
                cursor.total = Some(total);
                if let Some(tables) = self.tables.as_mut() {
                    tables.push_front(cursor);
                }
            }
        }
        Ok(())
    }

    fn spec_for(&self, table: &str) -> Option<&TableSpec> {
        self.fetched.iter().find(|s| s.name == table)
    }

    fn build_xml(&self, row: &SqlRow, title: &str) -> String {
        let spec = self.spec_for(&row.table);
        let is_description = |column: &str| {
            spec.map(|s| s.description_columns.iter().any(|d| d.eq_ignore_ascii_case(column)))
                .unwrap_or(false)
        };

        let mut xml = XmlBuilder::new();
        xml.start_tag(&row.table, &[])
            .newline()
            .element("swishtitle", title)
            .newline()
            .element("table", &row.table)
            .newline()
            .start_tag("body", &[])
            .newline();
        for (column, value) in &row.columns {
            if is_description(column) {
                xml.start_tag("swishdescription", &[])
                    .element(column, value)
                    .end_tag();
            } else {
                xml.element(column, value);
            }
            xml.newline();
        }
        xml.end_tag().newline().end_tag();
        xml.finish()
    }
}

impl SourceProvider for SqlProvider {
    type Item = SqlRow;

    fn provider_type(&self) -> &'static str {
        "sql"
    }

    fn next_item(&mut self) -> Option<Result<SqlRow>> {
        if self.tables.is_none() {
            match self.resolve_tables() {
                Ok(tables) => self.tables = Some(tables),
                Err(e) => {
                    self.tables = Some(VecDeque::new());
                    return Some(Err(e));
                }
            }
        }

        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(row);
            }
            let cursor = self.tables.as_mut()?.pop_front()?;
            if cursor.offset == 0 {
                self.fetched.push(cursor.spec.clone());
            }
            if let Err(e) = self.fetch_table(cursor) {
                return Some(Err(e));
            }
        }
    }

    fn describe(&self, item: &SqlRow) -> String {
        format!("{}:{} row {}", self.db_path, item.table, item.row_number)
    }

    fn to_document(&mut self, item: SqlRow) -> Result<Document> {
        let row = match &self.row_filter {
            Some(hook) => hook(item),
            None => item,
        };
        let spec = self.spec_for(&row.table);

        let counter = row.row_number.to_string();
        let title = self
            .title_hook
            .as_ref()
            .and_then(|hook| hook(&row))
            .or_else(|| {
                spec.and_then(|s| s.title_column.as_deref())
                    .and_then(|c| row.get(c))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| counter.clone());
        let url = self
            .url_hook
            .as_ref()
            .and_then(|hook| hook(&row))
            .or_else(|| {
                spec.and_then(|s| s.url_column.as_deref())
                    .and_then(|c| row.get(c))
                    .map(str::to_string)
            })
            .unwrap_or(counter);

        let xml = self.build_xml(&row, &title);
        Ok(Document::new(url, xml, "application/xml").with_parser(ParserHint::Xml))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(s) | ValueRef::Blob(s) => String::from_utf8_lossy(s).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> NamedTempFile {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();

        conn.execute_batch(
            "CREATE TABLE movies (title TEXT NOT NULL, year INTEGER);
             INSERT INTO movies VALUES ('Alien', 1979);
             INSERT INTO movies VALUES ('Brazil', 1985);
             INSERT INTO movies VALUES ('Heat & Dust <uncut>', 1983);
             CREATE TABLE actors (name TEXT, bio TEXT);
             INSERT INTO actors VALUES ('Sigourney', 'Born in NYC');",
        )
        .unwrap();

        temp_file
    }

    fn drain(provider: &mut SqlProvider) -> Vec<Document> {
        let mut docs = Vec::new();
        while let Some(item) = provider.next_item() {
            let item = item.unwrap();
            docs.push(provider.to_document(item).unwrap());
        }
        docs
    }

    #[test]
    fn test_provider_type() {
        let temp_db = create_test_db();
        let provider = SqlProvider::open(temp_db.path().to_str().unwrap()).unwrap();
        assert_eq!(provider.provider_type(), "sql");
    }

    #[test]
    fn test_missing_database_is_config_error() {
        assert!(matches!(SqlProvider::open(""), Err(IndexFeedError::Config(_))));
        assert!(matches!(
            SqlProvider::open("/no/such/file.sqlite"),
            Err(IndexFeedError::Config(_))
        ));
    }

    #[test]
    fn test_introspection() {
        let temp_db = create_test_db();
        let provider = SqlProvider::open(temp_db.path().to_str().unwrap()).unwrap();
        assert_eq!(provider.list_tables().unwrap(), vec!["actors", "movies"]);
        assert_eq!(provider.table_columns("movies").unwrap(), vec!["title", "year"]);
        assert!(provider.table_columns("nope").is_err());
    }

    #[test]
    fn test_all_tables_counter_restarts() {
        let temp_db = create_test_db();
        let mut provider = SqlProvider::open(temp_db.path().to_str().unwrap()).unwrap();
        let docs = drain(&mut provider);
        let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["1", "1", "2", "3"]);

        let movie = docs[1].content_str().to_string();
        assert!(movie.starts_with("<movies>"));
        assert!(movie.contains("<table>movies</table>"));
        assert!(movie.contains("<title>Alien</title>"));
        assert!(movie.contains("<year>1979</year>"));
        assert_eq!(docs[1].parser_hint, ParserHint::Xml);

        let escaped = docs[3].content_str().to_string();
        assert!(escaped.contains("<title>Heat &amp; Dust &lt;uncut&gt;</title>"));
    }

    #[test]
    fn test_table_spec_columns() {
        let temp_db = create_test_db();
        let mut provider = SqlProvider::open(temp_db.path().to_str().unwrap())
            .unwrap()
            .with_table(
                TableSpec::new("actors")
                    .with_title_column("name")
                    .with_description_column("bio"),
            );
        let docs = drain(&mut provider);
        assert_eq!(docs.len(), 1);
        let xml = docs[0].content_str().to_string();
        assert!(xml.contains("<swishtitle>Sigourney</swishtitle>"));
        assert!(xml.contains("<swishdescription><bio>Born in NYC</bio></swishdescription>"));
        assert_eq!(docs[0].url, "1");
    }

    #[test]
    fn test_hooks() {
        let temp_db = create_test_db();
        let mut provider = SqlProvider::open(temp_db.path().to_str().unwrap())
            .unwrap()
            .with_table(TableSpec::new("movies"))
            .with_url_hook(|row| Some(format!("movie/{}", row.row_number)))
            .with_row_filter(|mut row| {
                row.columns.retain(|(name, _)| name != "year");
                row
            });
        let docs = drain(&mut provider);
        assert_eq!(docs[0].url, "movie/1");
        assert!(!docs[0].content_str().contains("<year>"));
    }

    #[test]
    fn test_failing_row_keeps_the_rest_of_the_table() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE notes (id INTEGER, body TEXT);
             INSERT INTO notes VALUES (1, 'one'), (2, 'two'), (3, 'three'), (4, 'four'), (5, 'five');
             CREATE VIEW checked AS
                 SELECT id, CASE WHEN id = 3 THEN abs(-9223372036854775808) ELSE body END AS body
                 FROM notes;",
        )
        .unwrap();
        drop(conn);

        let mut provider = SqlProvider::open(temp_file.path().to_str().unwrap())
            .unwrap()
            .with_table(TableSpec::new("checked"));
        let mut urls = Vec::new();
        let mut errors = Vec::new();
        while let Some(item) = provider.next_item() {
            match item {
                Ok(row) => urls.push(provider.to_document(row).unwrap().url),
                Err(e) => errors.push(e),
            }
        }

        assert_eq!(urls, vec!["1", "2", "4", "5"]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_item_level());
    }
}
