//! Response bodies of the read API.
//!
//! These are plain serde structs carrying an OpenAPI schema, so the REST layer can both
//! serialise them and document them in the generated `openapi.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A single stored quote.
///
/// `id` is the 64-character content fingerprint; `author` is omitted from storage when the
/// source did not name one and is serialised as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuoteRes {
    pub id: String,
    pub quote: String,
    pub author: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Number of quotes currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountRes {
    pub total: u64,
}
