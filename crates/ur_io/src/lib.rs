//! ur_io — snapshot codec for suspending and resuming engines.
//!
//! An [`ur_core::Engine`] lives in memory for exactly one step at a time; in
//! between, front-ends park it as a flat [`snapshot::EngineSnapshot`] record.
//! This crate owns that record, its JSON transport (including canonical
//! byte-stable encoding), and the strict validation performed before an
//! engine is reconstituted.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for the snapshot codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The caller-provided name lists disagree with the record.
    #[error("state mismatch on {field}: {detail}")]
    StateMismatch { field: &'static str, detail: String },

    /// The record violates the state schema or an engine invariant.
    #[error("corrupt state: {0}")]
    Corrupt(String),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Json(e.to_string())
    }
}

pub mod canonical_json;
pub mod snapshot;

pub use canonical_json::to_canonical_bytes;
pub use snapshot::{decode, encode, EngineSnapshot};
