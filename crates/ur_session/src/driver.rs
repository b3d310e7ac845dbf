//! The step-at-a-time driver.
//!
//! Stateless between calls: every entry point decodes the parked snapshot,
//! lets the engine move one step, and persists the result. Timestamps come
//! from the caller so the driver stays deterministic and clock-free.

use ur_core::{Engine, Step};
use ur_io::{decode, encode};

use crate::store::SessionStore;
use crate::{
    normalize_timestamp_utc, AnswerForm, ComparisonRecord, SessionError, SessionId,
    SessionOutcome, SessionStatus, StepView,
};

pub struct SessionDriver<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionDriver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// First step of a fresh session: create the engine, ask for the first
    /// question, persist, render. A degenerate session (one element, or an
    /// empty list) completes right here.
    pub fn begin(
        &mut self,
        id: &SessionId,
        parameters: &[String],
        elements: &[String],
        now: &str,
    ) -> Result<StepView, SessionError> {
        let at = normalize_timestamp_utc(now)?;
        let mut engine = Engine::new(parameters.to_vec(), elements.to_vec())?;
        self.store.save_status(id, SessionStatus::InProgress)?;
        self.advance(id, &mut engine, &at)
    }

    /// Render the current question without consuming an answer. Also the
    /// resume path: a session parked by one device continues on another by
    /// loading the same snapshot.
    pub fn current(
        &mut self,
        id: &SessionId,
        parameters: &[String],
        elements: &[String],
        now: &str,
    ) -> Result<StepView, SessionError> {
        let at = normalize_timestamp_utc(now)?;
        let mut engine = self.load_engine(id, parameters, elements)?;
        self.advance(id, &mut engine, &at)
    }

    /// Apply one answer: record the audit event (echoed question included),
    /// advance the engine, persist. Completion materializes the outcome.
    pub fn submit(
        &mut self,
        id: &SessionId,
        parameters: &[String],
        elements: &[String],
        form: &AnswerForm,
        now: &str,
    ) -> Result<StepView, SessionError> {
        let at = normalize_timestamp_utc(now)?;
        if self.store.load_status(id)? == Some(SessionStatus::Completed) {
            return Err(SessionError::Completed(id.clone()));
        }
        let mut engine = self.load_engine(id, parameters, elements)?;

        let record = ComparisonRecord {
            step: engine.comparisons(),
            elem_a: form.a,
            elem_b: form.b,
            parameter: form.c,
            parameter_name: engine
                .parameter_names()
                .get(form.c)
                .cloned()
                .unwrap_or_default(),
            choice: form.choice,
            answered_at: at.clone(),
        };
        self.store.append_comparison(id, &record)?;

        engine.answer(form.choice.into())?;
        self.advance(id, &mut engine, &at)
    }

    /// Mark the session terminated. Parked state and audit events stay put
    /// so partial results remain readable.
    pub fn terminate(&mut self, id: &SessionId) -> Result<(), SessionError> {
        match self.store.load_status(id)? {
            None => Err(SessionError::UnknownSession(id.clone())),
            Some(SessionStatus::Completed) => Err(SessionError::Completed(id.clone())),
            Some(_) => {
                self.store.save_status(id, SessionStatus::Terminated)?;
                Ok(())
            }
        }
    }

    pub fn status(&self, id: &SessionId) -> Result<Option<SessionStatus>, SessionError> {
        Ok(self.store.load_status(id)?)
    }

    pub fn outcome(&self, id: &SessionId) -> Result<Option<SessionOutcome>, SessionError> {
        Ok(self.store.load_outcome(id)?)
    }

    fn load_engine(
        &self,
        id: &SessionId,
        parameters: &[String],
        elements: &[String],
    ) -> Result<Engine, SessionError> {
        match self.store.load_state(id)? {
            Some(snap) => Ok(decode(&snap, parameters, elements)?),
            None => Ok(Engine::new(parameters.to_vec(), elements.to_vec())?),
        }
    }

    /// Ask the engine for its next step and persist the (possibly mutated)
    /// state. On Done, write the outcome exactly once and mark Completed.
    fn advance(
        &mut self,
        id: &SessionId,
        engine: &mut Engine,
        at: &str,
    ) -> Result<StepView, SessionError> {
        match engine.next() {
            Step::Ask(q) => {
                self.store.save_state(id, &encode(engine))?;
                Ok(StepView::Question {
                    elem: q.elem,
                    against: q.against,
                    parameter: q.parameter,
                    elem_name: engine.element_names()[q.elem].clone(),
                    against_name: engine.element_names()[q.against].clone(),
                    parameter_name: engine.parameter_names()[q.parameter].clone(),
                    progress: engine.progress(),
                })
            }
            Step::Done => {
                let ranking = engine.final_ordering();
                self.store.save_state(id, &encode(engine))?;
                if self.store.load_status(id)? != Some(SessionStatus::Completed) {
                    let outcome = SessionOutcome {
                        ranking: ranking.clone(),
                        prioritized: engine.tables().to_vec(),
                        num_comparisons: engine.comparisons(),
                        completed_at: at.to_string(),
                    };
                    self.store.save_outcome(id, &outcome)?;
                    self.store.save_status(id, SessionStatus::Completed)?;
                }
                Ok(StepView::Finished {
                    ranking,
                    num_comparisons: engine.comparisons(),
                    progress: 100.0,
                })
            }
        }
    }
}
