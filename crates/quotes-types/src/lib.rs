//! # Quotes Types
//!
//! Validated value types shared by the quotes crates.
//!
//! - [`NonEmptyText`]: quote text that is guaranteed to carry content
//! - [`QuoteId`]: the content fingerprint used as the primary key of a stored quote
//!
//! Both types validate once at construction, so code holding one never re-checks it.

use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest.
pub const QUOTE_ID_LEN: usize = 64;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was absent, empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction; interior
/// whitespace and case are kept exactly as given, so the stored text reads the way the source
/// wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, returning [`TextError::Empty`] if nothing remains after
    /// trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`] but for optional input, mapping `None` and blank strings to
    /// `None`.
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors returned when parsing a [`QuoteId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuoteIdError {
    #[error("quote id must be {QUOTE_ID_LEN} lowercase hex characters, got: '{0}'")]
    InvalidFormat(String),
}

/// Content fingerprint of a quote.
///
/// Always the canonical form: 64 lowercase hexadecimal characters (a SHA-256 digest).
/// Values are produced by hashing (see [`QuoteId::from_digest`]) or by validating external input
/// with [`QuoteId::parse`]; uppercase or truncated forms are rejected rather than normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteId(String);

impl QuoteId {
    /// Builds the id from a raw 32-byte digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Validates an externally supplied id (API path segment, CLI argument, database row).
    pub fn parse(input: &str) -> Result<Self, QuoteIdError> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(QuoteIdError::InvalidFormat(input.to_owned()))
    }

    /// Purely syntactic check for the canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == QUOTE_ID_LEN
            && input
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuoteId {
    type Err = QuoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for QuoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for QuoteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for QuoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QuoteId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_but_keeps_interior() {
        let text = NonEmptyText::new("  Be   Yourself.  ").unwrap();
        assert_eq!(text.as_str(), "Be   Yourself.");
    }

    #[test]
    fn non_empty_text_rejects_blank() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" \t\n "), Err(TextError::Empty));
    }

    #[test]
    fn from_optional_maps_blank_to_none() {
        assert_eq!(NonEmptyText::from_optional(None), None);
        assert_eq!(NonEmptyText::from_optional(Some("   ")), None);
        assert_eq!(
            NonEmptyText::from_optional(Some(" Oscar Wilde ")).map(NonEmptyText::into_inner),
            Some("Oscar Wilde".to_string())
        );
    }

    #[test]
    fn quote_id_from_digest_is_lowercase_hex() {
        let id = QuoteId::from_digest(&[0xab; 32]);
        assert_eq!(id.as_str().len(), QUOTE_ID_LEN);
        assert!(id.as_str().chars().all(|c| c == 'a' || c == 'b'));
        assert!(QuoteId::is_canonical(id.as_str()));
    }

    #[test]
    fn quote_id_parse_rejects_non_canonical() {
        let upper = "A".repeat(QUOTE_ID_LEN);
        assert!(QuoteId::parse(&upper).is_err());
        assert!(QuoteId::parse("abc").is_err());
        assert!(QuoteId::parse(&"g".repeat(QUOTE_ID_LEN)).is_err());
        assert!(QuoteId::parse(&"0".repeat(QUOTE_ID_LEN)).is_ok());
    }

    #[test]
    fn quote_id_deserialize_validates() {
        let ok: Result<QuoteId, _> = serde_json::from_str(&format!("\"{}\"", "f".repeat(64)));
        assert!(ok.is_ok());
        let bad: Result<QuoteId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(bad.is_err());
    }
}
