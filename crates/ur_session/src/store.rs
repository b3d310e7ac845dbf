//! Persistence contract for parked sessions.
//!
//! The driver owns *what* is stored (snapshot, status, audit trail, outcome);
//! implementations own *where*. [`MemoryStore`] is the in-process reference
//! used by tests and the console front-end; a web deployment would back the
//! same trait with its database.

use std::collections::BTreeMap;
use std::fmt;

use ur_io::EngineSnapshot;

use crate::{ComparisonRecord, SessionError, SessionId, SessionOutcome, SessionStatus};

/// Storage-layer failure, carried opaquely into [`SessionError::Store`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreFailure(pub String);

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreFailure {}

impl From<StoreFailure> for SessionError {
    fn from(e: StoreFailure) -> Self {
        SessionError::Store(e.0)
    }
}

/// Everything the driver persists, keyed by session id.
pub trait SessionStore {
    fn load_state(&self, id: &SessionId) -> Result<Option<EngineSnapshot>, StoreFailure>;
    fn save_state(&mut self, id: &SessionId, snap: &EngineSnapshot) -> Result<(), StoreFailure>;

    fn load_status(&self, id: &SessionId) -> Result<Option<SessionStatus>, StoreFailure>;
    fn save_status(&mut self, id: &SessionId, status: SessionStatus) -> Result<(), StoreFailure>;

    fn append_comparison(
        &mut self,
        id: &SessionId,
        record: &ComparisonRecord,
    ) -> Result<(), StoreFailure>;
    fn comparisons(&self, id: &SessionId) -> Result<Vec<ComparisonRecord>, StoreFailure>;

    fn save_outcome(&mut self, id: &SessionId, outcome: &SessionOutcome)
        -> Result<(), StoreFailure>;
    fn load_outcome(&self, id: &SessionId) -> Result<Option<SessionOutcome>, StoreFailure>;
}

/// In-memory store: BTreeMaps for deterministic iteration, no I/O.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    states: BTreeMap<SessionId, EngineSnapshot>,
    statuses: BTreeMap<SessionId, SessionStatus>,
    events: BTreeMap<SessionId, Vec<ComparisonRecord>>,
    outcomes: BTreeMap<SessionId, SessionOutcome>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions known to this store, in id order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.statuses.keys().cloned().collect()
    }
}

impl SessionStore for MemoryStore {
    fn load_state(&self, id: &SessionId) -> Result<Option<EngineSnapshot>, StoreFailure> {
        Ok(self.states.get(id).cloned())
    }

    fn save_state(&mut self, id: &SessionId, snap: &EngineSnapshot) -> Result<(), StoreFailure> {
        self.states.insert(id.clone(), snap.clone());
        Ok(())
    }

    fn load_status(&self, id: &SessionId) -> Result<Option<SessionStatus>, StoreFailure> {
        Ok(self.statuses.get(id).copied())
    }

    fn save_status(&mut self, id: &SessionId, status: SessionStatus) -> Result<(), StoreFailure> {
        self.statuses.insert(id.clone(), status);
        Ok(())
    }

    fn append_comparison(
        &mut self,
        id: &SessionId,
        record: &ComparisonRecord,
    ) -> Result<(), StoreFailure> {
        self.events.entry(id.clone()).or_default().push(record.clone());
        Ok(())
    }

    fn comparisons(&self, id: &SessionId) -> Result<Vec<ComparisonRecord>, StoreFailure> {
        Ok(self.events.get(id).cloned().unwrap_or_default())
    }

    fn save_outcome(
        &mut self,
        id: &SessionId,
        outcome: &SessionOutcome,
    ) -> Result<(), StoreFailure> {
        self.outcomes.insert(id.clone(), outcome.clone());
        Ok(())
    }

    fn load_outcome(&self, id: &SessionId) -> Result<Option<SessionOutcome>, StoreFailure> {
        Ok(self.outcomes.get(id).cloned())
    }
}
