//! Constants used throughout the quotes core crate.
//!
//! Defaults for every externally configurable value live here so the binaries and the CLI
//! agree on them.

/// Default SQLite database file when `QUOTES_DB` is not set.
pub const DEFAULT_DB_PATH: &str = "quotes.db";

/// Default pause between ingestion cycles, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 50;

/// Default upstream endpoint returning a JSON array of `{q, a}` objects.
pub const DEFAULT_SOURCE_URL: &str = "https://zenquotes.io/api/quotes";

/// Default timeout for one upstream request, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default time the process waits for the ingestion loop to stop, in seconds.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Author value the upstream uses for its "too many requests" placeholder quote.
pub const RATE_LIMIT_SENTINEL_AUTHOR: &str = "zenquotes.io";

/// User agent sent with upstream requests.
pub const USER_AGENT: &str = concat!("quotes-core/", env!("CARGO_PKG_VERSION"));

/// How long a connection waits on a locked database before giving up, in milliseconds.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;
