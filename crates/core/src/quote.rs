//! The persisted quote entity.

use api_shared::QuoteRes;
use chrono::{DateTime, Utc};
use quotes_types::{NonEmptyText, QuoteId};

/// A quote as held by the store.
///
/// `id` is derived from the normalised text and author and never changes; `added_at` is set by
/// the storage layer on first insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: QuoteId,
    pub text: NonEmptyText,
    pub author: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl From<Quote> for QuoteRes {
    fn from(quote: Quote) -> Self {
        QuoteRes {
            id: quote.id.to_string(),
            quote: quote.text.into_inner(),
            author: quote.author,
            added_at: quote.added_at,
        }
    }
}
