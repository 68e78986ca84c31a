//! Content fingerprints for quotes.
//!
//! A fingerprint is the SHA-256 of `normalize(text) + "|" + normalize(author)`, hex encoded.
//! Two raw records that differ only in surrounding whitespace, inner whitespace runs or case
//! therefore share one [`QuoteId`], which is what makes the store's insert idempotent across
//! fetch cycles.

use crate::fetcher::RawQuote;
use crate::normalize::normalize;
use quotes_types::QuoteId;
use sha2::{Digest, Sha256};

/// Separator between the normalised text and author in the hashed key.
const KEY_SEPARATOR: char = '|';

/// Builds the canonical key that is hashed into a fingerprint.
pub fn canonical_key(text: Option<&str>, author: Option<&str>) -> String {
    let mut key = normalize(text);
    key.push(KEY_SEPARATOR);
    key.push_str(&normalize(author));
    key
}

/// Derives the fingerprint of a (text, author) pair.
pub fn fingerprint(text: Option<&str>, author: Option<&str>) -> QuoteId {
    let key = canonical_key(text, author);
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    QuoteId::from_digest(&digest)
}

/// Fingerprint of a candidate as delivered by a fetcher.
pub fn fingerprint_raw(raw: &RawQuote) -> QuoteId {
    fingerprint(raw.text.as_deref(), raw.author.as_deref())
}
