//! Decode-then-classify handling of the response envelope.
//!
//! The remote API answers every endpoint with one JSON object that carries
//! either success fields or error fields. `Envelope<T>` decodes the superset
//! (flat `code`/`message`, a nested `error` object, and the flattened success
//! payload `T`) and `resolve` picks the outcome.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{NewsApiError, NewsApiResult};

pub const UNEXPECTED_STATUS_CODE: &str = "unexpectedStatus";

/// Error fields as the remote API spells them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    fn is_empty(&self) -> bool {
        is_blank(&self.code) && is_blank(&self.message)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Envelope<T> {
    #[serde(flatten)]
    pub flat_error: ErrorBody,
    #[serde(default)]
    pub error: Option<ErrorBody>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    /// The populated error fields, nested placement first.
    pub fn error_fields(&self) -> Option<&ErrorBody> {
        self.error
            .as_ref()
            .filter(|e| !e.is_empty())
            .or_else(|| Some(&self.flat_error).filter(|e| !e.is_empty()))
    }
}

/// Return the success payload, or the remote rejection as `NewsApiError::Api`.
///
/// Error fields win over any success fields present in the same body. A
/// non-2xx `status` with no error fields is reported as `unexpectedStatus`.
pub fn resolve<T>(envelope: Envelope<T>, status: u16) -> NewsApiResult<T> {
    if let Some(err) = envelope.error_fields() {
        return Err(NewsApiError::Api {
            status,
            code: err.code.clone().unwrap_or_default(),
            message: err.message.clone().unwrap_or_default(),
        });
    }
    if !(200..300).contains(&status) {
        return Err(NewsApiError::Api {
            status,
            code: UNEXPECTED_STATUS_CODE.to_string(),
            message: format!("HTTP {status}"),
        });
    }
    Ok(envelope.payload)
}
