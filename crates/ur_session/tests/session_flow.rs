//! End-to-end driver flows over the in-memory store: begin/step/resume/
//! terminate, audit trail, outcome materialization.

use ur_session::{
    AnswerChoice, AnswerForm, MemoryStore, SessionDriver, SessionError, SessionId, SessionStatus,
    SessionStore, StepView,
};

const TS: &str = "2024-06-01T12:00:00Z";

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn sid(s: &str) -> SessionId {
    s.parse().unwrap()
}

/// Answer every question with the same verdict until the session finishes.
fn drive(
    driver: &mut SessionDriver<MemoryStore>,
    id: &SessionId,
    parameters: &[String],
    elements: &[String],
    choice: AnswerChoice,
) -> (Vec<usize>, u64) {
    for _ in 0..100 {
        match driver.current(id, parameters, elements, TS).unwrap() {
            StepView::Question { elem, against, parameter, .. } => {
                let form = AnswerForm { choice, a: elem, b: against, c: parameter };
                driver.submit(id, parameters, elements, &form, TS).unwrap();
            }
            StepView::Finished { ranking, num_comparisons, progress } => {
                assert_eq!(progress, 100.0);
                return (ranking, num_comparisons);
            }
        }
    }
    panic!("session failed to finish");
}

#[test]
fn full_session_records_events_and_outcome() {
    let params = names(&["impact", "probability"]);
    let elems = names(&["a", "b", "c"]);
    let id = sid("exp1:alice");
    let mut driver = SessionDriver::new(MemoryStore::new());

    match driver.begin(&id, &params, &elems, TS).unwrap() {
        StepView::Question { parameter, parameter_name, progress, .. } => {
            assert_eq!(parameter, 0);
            assert_eq!(parameter_name, "impact");
            // The first element of the first order was seated for free.
            assert!((progress - 100.0 / 6.0).abs() < 1e-9);
        }
        StepView::Finished { .. } => panic!("three elements need questions"),
    }
    assert_eq!(driver.status(&id).unwrap(), Some(SessionStatus::InProgress));

    let (ranking, num_comparisons) = drive(&mut driver, &id, &params, &elems, AnswerChoice::Higher);
    assert_eq!(ranking, vec![2, 1, 0]);
    assert_eq!(num_comparisons, 4);

    assert_eq!(driver.status(&id).unwrap(), Some(SessionStatus::Completed));
    let outcome = driver.outcome(&id).unwrap().unwrap();
    assert_eq!(outcome.ranking, vec![2, 1, 0]);
    assert_eq!(outcome.prioritized, vec![vec![0, 1, 2], vec![0, 1, 2]]);
    assert_eq!(outcome.num_comparisons, 4);
    assert_eq!(outcome.completed_at, TS);

    // One audit event per accepted answer, in submission order.
    let events = driver.store().comparisons(&id).unwrap();
    assert_eq!(events.len(), 4);
    for (i, ev) in events.iter().enumerate() {
        assert_eq!(ev.step, i as u64);
        assert_eq!(ev.choice, AnswerChoice::Higher);
        assert_eq!(ev.answered_at, TS);
        assert!(ev.parameter < 2);
        assert_eq!(ev.parameter_name, params[ev.parameter]);
    }

    // Submitting against a completed session is rejected.
    let form = AnswerForm { choice: AnswerChoice::Higher, a: 0, b: 1, c: 0 };
    assert!(matches!(
        driver.submit(&id, &params, &elems, &form, TS),
        Err(SessionError::Completed(_))
    ));
}

#[test]
fn session_resumes_on_a_second_driver_with_the_same_result() {
    let params = names(&["impact", "probability"]);
    let elems = names(&["a", "b", "c", "d"]);
    let id = sid("exp1:bob");

    // Reference run, never parked.
    let mut reference = SessionDriver::new(MemoryStore::new());
    reference.begin(&id, &params, &elems, TS).unwrap();
    let (want_ranking, want_count) =
        drive(&mut reference, &id, &params, &elems, AnswerChoice::Lower);

    // Same answers, but the store changes hands after two of them.
    let mut first = SessionDriver::new(MemoryStore::new());
    first.begin(&id, &params, &elems, TS).unwrap();
    for _ in 0..2 {
        match first.current(&id, &params, &elems, TS).unwrap() {
            StepView::Question { elem, against, parameter, .. } => {
                let form =
                    AnswerForm { choice: AnswerChoice::Lower, a: elem, b: against, c: parameter };
                first.submit(&id, &params, &elems, &form, TS).unwrap();
            }
            StepView::Finished { .. } => panic!("finished too early"),
        }
    }

    let mut second = SessionDriver::new(first.into_store());
    let (ranking, count) = drive(&mut second, &id, &params, &elems, AnswerChoice::Lower);
    assert_eq!(ranking, want_ranking);
    assert_eq!(count, want_count);
    assert_eq!(
        second.store().comparisons(&id).unwrap().len() as u64,
        count
    );
}

#[test]
fn single_element_session_completes_at_begin() {
    let params = names(&["impact"]);
    let elems = names(&["solo"]);
    let id = sid("tiny");
    let mut driver = SessionDriver::new(MemoryStore::new());

    match driver.begin(&id, &params, &elems, TS).unwrap() {
        StepView::Finished { ranking, num_comparisons, progress } => {
            assert_eq!(ranking, vec![0]);
            assert_eq!(num_comparisons, 0);
            assert_eq!(progress, 100.0);
        }
        StepView::Question { .. } => panic!("nothing to compare"),
    }
    assert_eq!(driver.status(&id).unwrap(), Some(SessionStatus::Completed));
    assert_eq!(driver.outcome(&id).unwrap().unwrap().ranking, vec![0]);
}

#[test]
fn terminate_keeps_partial_state_readable() {
    let params = names(&["impact"]);
    let elems = names(&["a", "b", "c"]);
    let id = sid("quitter");
    let mut driver = SessionDriver::new(MemoryStore::new());

    assert!(matches!(
        driver.terminate(&sid("ghost")),
        Err(SessionError::UnknownSession(_))
    ));

    match driver.begin(&id, &params, &elems, TS).unwrap() {
        StepView::Question { elem, against, parameter, .. } => {
            let form =
                AnswerForm { choice: AnswerChoice::Higher, a: elem, b: against, c: parameter };
            driver.submit(&id, &params, &elems, &form, TS).unwrap();
        }
        StepView::Finished { .. } => panic!("finished too early"),
    }

    driver.terminate(&id).unwrap();
    assert_eq!(driver.status(&id).unwrap(), Some(SessionStatus::Terminated));
    assert_eq!(driver.store().comparisons(&id).unwrap().len(), 1);

    // The parked snapshot still renders, so a later resume is penalty-free.
    assert!(matches!(
        driver.current(&id, &params, &elems, TS).unwrap(),
        StepView::Question { .. }
    ));
}

#[test]
fn mismatched_names_and_bad_timestamps_are_rejected() {
    let params = names(&["impact"]);
    let elems = names(&["a", "b"]);
    let id = sid("strict");
    let mut driver = SessionDriver::new(MemoryStore::new());
    driver.begin(&id, &params, &elems, TS).unwrap();

    let other = names(&["a", "z"]);
    assert!(matches!(
        driver.current(&id, &params, &other, TS),
        Err(SessionError::Codec(_))
    ));

    assert!(matches!(
        driver.current(&id, &params, &elems, "not-a-time"),
        Err(SessionError::BadTimestamp(_))
    ));
}
