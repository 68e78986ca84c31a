//! # Quotes Core
//!
//! Core logic of the quotes service: the deduplication-and-ingestion pipeline.
//!
//! - [`normalize`]: canonicalises text before comparison
//! - [`fingerprint`]: derives the content id (`QuoteId`) of a (text, author) pair
//! - [`store::QuoteStore`]: SQLite table of quotes with an idempotent insert
//! - [`fetcher`]: upstream sources of candidate quotes
//! - [`ingest`]: the fetch → fingerprint → insert cycle and its background loop
//!
//! **No API concerns**: HTTP routing, CORS and OpenAPI documentation belong in `api-rest`;
//! response schemas live in `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod ingest;
pub mod normalize;
pub mod quote;
pub mod store;

pub use api_shared::schema;

pub use config::CoreConfig;
pub use constants::*;
pub use error::{QuoteError, QuoteResult};
pub use fetcher::{FetchError, HttpQuoteSource, QuoteSource, RawQuote};
pub use fingerprint::{fingerprint, fingerprint_raw};
pub use ingest::{ingest_batch, CycleReport, IngestReport, IngestionHandle, IngestionLoop, LoopState};
pub use normalize::normalize;
pub use quote::Quote;
pub use quotes_types::{NonEmptyText, QuoteId};
pub use store::QuoteStore;
