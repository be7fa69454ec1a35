// Q9 Lookup Dataset Store
// Owns the SQLite connection and runs parameterized read-only queries

use crate::data::{DatasetInfo, LookupConfig};
use crate::segment::{split_value, Split};
use crate::types::{LookupError, Result, REQUIRED_TABLES};
use rusqlite::types::{FromSql, ValueRef};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read-only handle on the dataset
///
/// One connection is opened at construction and held until [`Dataset::close`]
/// or drop. Queries are serialized through a mutex, so a `Dataset` can be
/// shared between threads.
pub struct Dataset {
    conn: Mutex<Option<Connection>>,
}

impl Dataset {
    /// Open the dataset file named by `config`
    ///
    /// The file is opened read-only and must contain the four lookup tables.
    pub fn open(config: &LookupConfig) -> Result<Self> {
        config.validate()?;
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&config.dataset_path, flags)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        info!(path = %config.dataset_path.display(), "opened q9 dataset");
        Self::from_connection(conn)
    }

    /// Open a dataset file with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(&LookupConfig::with_dataset(path.as_ref()))
    }

    /// Wrap an already open connection (e.g. an in-memory database)
    pub fn from_connection(conn: Connection) -> Result<Self> {
        verify_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Run `f` with exclusive access to the connection
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let guard = self.conn.lock().map_err(|_| LookupError::Poisoned)?;
        let conn = guard.as_ref().ok_or(LookupError::Closed)?;
        f(conn)
    }

    /// Read one scalar and cut it into items
    ///
    /// Only the first column of the first row is read.
    ///
    /// # Returns
    /// `None` when the query yields no row or a NULL value
    pub(crate) fn query_split<P: Params>(
        &self,
        sql: &str,
        params: P,
        split: Split<'_>,
    ) -> Result<Option<Vec<String>>> {
        let text = self.query_text(sql, params)?;
        Ok(text.map(|text| split_value(&text, split)))
    }

    /// Read one scalar rendered as text
    ///
    /// Integers and reals are formatted; NULL and a missing row are `None`.
    pub(crate) fn query_text<P: Params>(&self, sql: &str, params: P) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let value = stmt
                .query_row(params, |row| Ok(value_to_text(row.get_ref(0)?)))
                .optional()?;
            Ok(value.flatten())
        })
    }

    /// Read the first column of every row
    pub(crate) fn query_column<T: FromSql, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let rows = stmt.query_map(params, |row| row.get::<_, T>(0))?;
            let values = rows.collect::<std::result::Result<Vec<T>, _>>()?;
            Ok(values)
        })
    }

    /// Row counts of the four lookup tables
    pub fn info(&self) -> Result<DatasetInfo> {
        self.with_connection(|conn| {
            let count = |table: &str| -> Result<usize> {
                let sql = format!("SELECT COUNT(*) FROM {}", table);
                let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(usize::try_from(n).unwrap_or(0))
            };
            Ok(DatasetInfo {
                mapped_rows: count("mapped_table")?,
                related_rows: count("related_candidates_table")?,
                phonetic_rows: count("word_meta")?,
                simplification_rows: count("ts_chinese_table")?,
            })
        })
    }

    /// Close the connection
    ///
    /// Later queries fail with [`LookupError::Closed`]. Closing twice is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|_| LookupError::Poisoned)?;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, err)| LookupError::Sqlite(err))?;
            info!("closed q9 dataset");
        }
        Ok(())
    }

    /// Whether the connection is still open
    ///
    /// A poisoned lock is reported as [`LookupError::Poisoned`], the same
    /// error every query would return.
    pub fn is_open(&self) -> Result<bool> {
        let guard = self.conn.lock().map_err(|_| LookupError::Poisoned)?;
        Ok(guard.is_some())
    }
}

/// Check that every lookup table exists
fn verify_schema(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
    )?;
    for table in REQUIRED_TABLES {
        let found: i64 = stmt.query_row(params![table], |row| row.get(0))?;
        if found == 0 {
            warn!(table, "dataset schema check failed");
            return Err(LookupError::MissingTable {
                table: table.to_string(),
            });
        }
    }
    debug!("dataset schema verified");
    Ok(())
}

/// Textual form of a scalar column value
fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
