//! ur_session — per-session orchestration of the ordering engine.
//!
//! One participant session owns one engine, parked between steps as an
//! [`ur_io::EngineSnapshot`] inside a caller-provided [`store::SessionStore`].
//! The driver performs the step protocol:
//!
//! - GET/resume: decode → `next()` → persist → render the question
//! - POST: decode → record the audit event → `answer()` → `next()` → persist
//!
//! and, on completion, materializes the final ordering as the session's
//! [`SessionOutcome`]. The driver reads no clock — callers supply timestamps,
//! which are validated and normalized to RFC3339 UTC.

#![forbid(unsafe_code)]

use chrono::{DateTime, SecondsFormat, Utc};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ur_core::{Choice, EngineError};
use ur_io::CodecError;

pub mod driver;
pub mod store;

pub use driver::SessionDriver;
pub use store::{MemoryStore, SessionStore, StoreFailure};

/// Opaque session identifier (1..=64 chars of `[A-Za-z0-9_:.-]`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ok = (1..=64).contains(&s.len())
            && s.bytes().all(|b| {
                matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b':' | b'.')
            });
        if ok {
            Ok(Self(s.to_string()))
        } else {
            Err(SessionError::InvalidSessionId(s.to_string()))
        }
    }
}

/// Where a session stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Terminated,
}

/// A comparison answer as carried by the step protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerChoice {
    Lower,
    Higher,
}

impl From<AnswerChoice> for Choice {
    fn from(c: AnswerChoice) -> Self {
        match c {
            AnswerChoice::Lower => Choice::Lower,
            AnswerChoice::Higher => Choice::Higher,
        }
    }
}

/// The POST body of one step: the verdict plus an echo of the question it
/// answers (candidate `a`, comparand `b`, parameter `c`), so the audit event
/// can be recorded even before the engine advances.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnswerForm {
    pub choice: AnswerChoice,
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

/// One persisted audit event: which pair, which parameter, which side, when.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    /// Ordinal of this comparison within the session (0-based).
    pub step: u64,
    pub elem_a: usize,
    pub elem_b: usize,
    pub parameter: usize,
    pub parameter_name: String,
    pub choice: AnswerChoice,
    /// RFC3339 UTC.
    pub answered_at: String,
}

/// The session's persisted result, written once on completion.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Global ordering, highest priority first.
    pub ranking: Vec<usize>,
    /// Completed per-parameter orders (ascending).
    pub prioritized: Vec<Vec<usize>>,
    pub num_comparisons: u64,
    /// RFC3339 UTC.
    pub completed_at: String,
}

/// What a front-end renders after a step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepView {
    Question {
        elem: usize,
        against: usize,
        parameter: usize,
        elem_name: String,
        against_name: String,
        parameter_name: String,
        progress: f64,
    },
    Finished {
        ranking: Vec<usize>,
        num_comparisons: u64,
        /// Always 100 once the ordering is complete.
        progress: f64,
    },
}

/// Driver-level error set.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error("state codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),

    #[error("timestamp must be RFC3339 UTC: {0}")]
    BadTimestamp(String),

    #[error("session {0} is already completed")]
    Completed(SessionId),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}

/// Validate and normalize an RFC3339 UTC timestamp (seconds precision, `Z`).
pub fn normalize_timestamp_utc(ts: &str) -> Result<String, SessionError> {
    let dt: DateTime<Utc> = ts
        .parse::<DateTime<Utc>>()
        .map_err(|_| SessionError::BadTimestamp(ts.to_string()))?;
    Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
