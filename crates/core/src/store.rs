//! SQLite-backed quote store.
//!
//! The store owns the `quotes` table. Writes go through [`QuoteStore::insert_if_absent`], a
//! single `INSERT .. ON CONFLICT(id) DO NOTHING` statement, so uniqueness of the fingerprint is
//! enforced by the primary key rather than by a lookup before the insert. Two handles opened on
//! the same file (the ingestion loop and the REST layer each hold one) can therefore race on the
//! same fingerprint and still persist exactly one row.
//!
//! ## Schema
//!
//! ```text
//! quotes(id TEXT PRIMARY KEY, quote TEXT NOT NULL, author TEXT, added_at TIMESTAMP)
//! idx_quotes_quote_author ON quotes(quote, author)
//! ```
//!
//! Every statement runs in autocommit mode: a failed insert never rolls back quotes inserted
//! earlier in the same batch.

use crate::constants::BUSY_TIMEOUT_MS;
use crate::quote::Quote;
use crate::{QuoteError, QuoteResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use quotes_types::{NonEmptyText, QuoteId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Format SQLite uses for `CURRENT_TIMESTAMP` (always UTC).
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = "SELECT id, quote, author, added_at FROM quotes";

/// Durable, keyed collection of quotes.
///
/// A handle wraps one SQLite connection behind a mutex, so it can be shared (for example in an
/// `Arc`) between request handlers. Separate handles on the same file coordinate through
/// SQLite's own locking.
#[derive(Debug)]
pub struct QuoteStore {
    conn: Mutex<Connection>,
}

impl QuoteStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Missing parent directories are created. The schema is not touched; call
    /// [`QuoteStore::init`] before the first insert.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::StorageDirCreation` if the parent directory cannot be created and
    /// `QuoteError::Storage` if SQLite cannot open or configure the file.
    pub fn open(path: &Path) -> QuoteResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(QuoteError::StorageDirCreation)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        tracing::debug!("opened quote store at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a private in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> QuoteResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ensure the `quotes` table and its `(quote, author)` index exist.
    ///
    /// Idempotent; safe to call on every startup and from every handle.
    pub fn init(&self) -> QuoteResult<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS quotes (
                id TEXT PRIMARY KEY,
                quote TEXT NOT NULL,
                author TEXT,
                added_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_quotes_quote_author ON quotes(quote, author);
            ",
        )?;
        Ok(())
    }

    /// Insert a quote unless a row with `id` already exists.
    ///
    /// Returns `true` only when a new row was written. A blank author is stored as `NULL`.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Storage` if the statement fails; in that case nothing was inserted.
    pub fn insert_if_absent(
        &self,
        id: &QuoteId,
        text: &NonEmptyText,
        author: Option<&str>,
    ) -> QuoteResult<bool> {
        let author = NonEmptyText::from_optional(author);
        let conn = self.lock();
        let changed = conn.execute(
            "INSERT INTO quotes (id, quote, author) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO NOTHING",
            params![id.as_str(), text.as_str(), author.as_ref().map(NonEmptyText::as_str)],
        )?;
        Ok(changed == 1)
    }

    /// Total number of stored quotes.
    pub fn count(&self) -> QuoteResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| QuoteError::InvalidRow(format!("negative count {count}")))
    }

    /// One uniformly selected quote.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::NotFound` when the store is empty.
    pub fn random(&self) -> QuoteResult<Quote> {
        let row = {
            let conn = self.lock();
            conn.query_row(
                &format!("{SELECT_COLUMNS} ORDER BY RANDOM() LIMIT 1"),
                [],
                QuoteRow::from_row,
            )
            .optional()?
        };
        row.ok_or(QuoteError::NotFound)?.try_into()
    }

    /// Look up a quote by its fingerprint.
    pub fn get(&self, id: &QuoteId) -> QuoteResult<Option<Quote>> {
        let row = {
            let conn = self.lock();
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.as_str()],
                QuoteRow::from_row,
            )
            .optional()?
        };
        row.map(Quote::try_from).transpose()
    }

    /// Exact lookup on the stored text and author, served by the `(quote, author)` index.
    ///
    /// Matching is on the stored surface form (trimmed), not the normalised form; use
    /// [`crate::fingerprint()`] with [`QuoteStore::get`] for normalised matching.
    pub fn find_by_content(&self, text: &str, author: Option<&str>) -> QuoteResult<Vec<Quote>> {
        let author = NonEmptyText::from_optional(author);
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE quote = ?1 AND author IS ?2 ORDER BY added_at, id"
        ))?;
        let rows: Vec<QuoteRow> = stmt
            .query_map(
                params![text.trim(), author.as_ref().map(NonEmptyText::as_str)],
                QuoteRow::from_row,
            )?
            .collect::<Result<_, _>>()?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    // Every statement autocommits, so a panic while the guard was held cannot leave a
    // half-applied write behind; the connection stays usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.lock())
    }
}

/// Raw column values, validated into a [`Quote`] outside the SQLite callback.
struct QuoteRow {
    id: String,
    quote: String,
    author: Option<String>,
    added_at: String,
}

impl QuoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            quote: row.get(1)?,
            author: row.get(2)?,
            added_at: row.get(3)?,
        })
    }
}

impl TryFrom<QuoteRow> for Quote {
    type Error = QuoteError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        let id = QuoteId::parse(&row.id).map_err(|e| QuoteError::InvalidRow(e.to_string()))?;
        let text = NonEmptyText::new(&row.quote)
            .map_err(|e| QuoteError::InvalidRow(format!("{}: {e}", row.id)))?;
        Ok(Quote {
            id,
            text,
            author: row.author,
            added_at: parse_timestamp(&row.added_at)?,
        })
    }
}

/// Parse a stored `added_at`, accepting SQLite's `CURRENT_TIMESTAMP` form and RFC 3339.
fn parse_timestamp(value: &str) -> QuoteResult<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, SQLITE_TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| QuoteError::InvalidTimestamp(value.to_string()))
}
