//! The flat snapshot record and its encode/decode pair.
//!
//! Field names and types are the stored-state contract; anything that can
//! parse JSON can read a parked session. Decoding is strict: the caller's
//! name lists must match the record (`StateMismatch`) and every engine
//! invariant is re-checked (`Corrupt`) before an engine is handed back.

use serde::{Deserialize, Serialize};

use ur_core::{Cursor, Engine};

use crate::{CodecError, CodecResult};

/// Serialization-friendly image of one engine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSnapshot {
    pub p_names: Vec<String>,
    pub e_names: Vec<String>,
    pub num_parameters: usize,
    pub num_elements: usize,
    pub num_comparisons: u64,
    /// One ascending working order per parameter.
    pub prioritized: Vec<Vec<usize>>,
    pub next_elem: Option<usize>,
    pub next_parameter: Option<usize>,
    pub next_range: Vec<usize>,
    pub final_list: Vec<usize>,
}

/// Snapshot the engine. Pure; the engine is left untouched.
pub fn encode(engine: &Engine) -> EngineSnapshot {
    let (next_elem, next_parameter, next_range) = match engine.cursor() {
        Cursor::Idle => (None, None, Vec::new()),
        Cursor::Probing { elem, param, window } => (Some(*elem), Some(*param), window.clone()),
    };
    EngineSnapshot {
        p_names: engine.parameter_names().to_vec(),
        e_names: engine.element_names().to_vec(),
        num_parameters: engine.parameter_names().len(),
        num_elements: engine.element_names().len(),
        num_comparisons: engine.comparisons(),
        prioritized: engine.tables().to_vec(),
        next_elem,
        next_parameter,
        next_range,
        final_list: engine.last_ordering().to_vec(),
    }
}

/// Reconstitute an engine from `snap`.
///
/// `parameter_names` / `element_names` are what the caller believes the
/// session is about; the record carries them redundantly and any difference
/// is a [`CodecError::StateMismatch`].
///
/// An empty `next_range` decodes to an idle cursor even when `next_elem` /
/// `next_parameter` are set: states saved right after an insertion leave both
/// dangling. A non-empty range requires both.
pub fn decode(
    snap: &EngineSnapshot,
    parameter_names: &[String],
    element_names: &[String],
) -> CodecResult<Engine> {
    if snap.p_names != parameter_names {
        return Err(CodecError::StateMismatch {
            field: "p_names",
            detail: format!("record {:?} vs caller {:?}", snap.p_names, parameter_names),
        });
    }
    if snap.e_names != element_names {
        return Err(CodecError::StateMismatch {
            field: "e_names",
            detail: format!("record {:?} vs caller {:?}", snap.e_names, element_names),
        });
    }
    if snap.num_parameters != snap.p_names.len() {
        return Err(CodecError::Corrupt(format!(
            "num_parameters is {} but {} names are recorded",
            snap.num_parameters,
            snap.p_names.len()
        )));
    }
    if snap.num_elements != snap.e_names.len() {
        return Err(CodecError::Corrupt(format!(
            "num_elements is {} but {} names are recorded",
            snap.num_elements,
            snap.e_names.len()
        )));
    }

    let cursor = if snap.next_range.is_empty() {
        Cursor::Idle
    } else {
        match (snap.next_elem, snap.next_parameter) {
            (Some(elem), Some(param)) => Cursor::Probing {
                elem,
                param,
                window: snap.next_range.clone(),
            },
            _ => {
                return Err(CodecError::Corrupt(
                    "active window without a pending element and parameter".to_string(),
                ))
            }
        }
    };

    Engine::from_saved(
        snap.p_names.clone(),
        snap.e_names.clone(),
        snap.prioritized.clone(),
        snap.num_comparisons,
        cursor,
        snap.final_list.clone(),
    )
    .map_err(|e| CodecError::Corrupt(e.to_string()))
}

/// JSON transport helpers.
pub fn to_json(snap: &EngineSnapshot) -> CodecResult<String> {
    Ok(serde_json::to_string(snap)?)
}

pub fn from_json(text: &str) -> CodecResult<EngineSnapshot> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;
    use ur_core::{Choice, Step};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn engine(params: &[&str], elems: &[&str]) -> Engine {
        Engine::new(names(params), names(elems)).unwrap()
    }

    fn drive(engine: &mut Engine, answers: &[Choice]) {
        for &choice in answers {
            match engine.next() {
                Step::Ask(_) => engine.answer(choice).unwrap(),
                Step::Done => panic!("ran out of questions"),
            }
        }
    }

    #[test]
    fn fresh_engine_snapshot_shape() {
        let e = engine(&["impact", "prob"], &["a", "b"]);
        let snap = encode(&e);
        let value = serde_json::to_value(&snap).unwrap();
        assert_json_eq!(
            value,
            json!({
                "p_names": ["impact", "prob"],
                "e_names": ["a", "b"],
                "num_parameters": 2,
                "num_elements": 2,
                "num_comparisons": 0,
                "prioritized": [[], []],
                "next_elem": null,
                "next_parameter": null,
                "next_range": [],
                "final_list": [],
            })
        );
    }

    #[test]
    fn round_trip_preserves_the_pending_question() {
        let mut original = engine(&["impact", "prob"], &["a", "b", "c", "d"]);
        drive(&mut original, &[Choice::Higher, Choice::Lower]);
        let question = original.next();

        let snap = encode(&original);
        let text = to_json(&snap).unwrap();
        let parsed = from_json(&text).unwrap();
        assert_eq!(parsed, snap);

        let mut resumed = decode(&parsed, original.parameter_names(), original.element_names())
            .unwrap();
        assert_eq!(resumed.next(), question);
        assert_eq!(resumed.comparisons(), original.comparisons());
        assert_eq!(resumed.tables(), original.tables());
    }

    #[test]
    fn resumed_engine_finishes_like_the_original() {
        let script = [Choice::Higher, Choice::Lower, Choice::Higher, Choice::Lower];

        let mut straight = engine(&["impact", "prob"], &["a", "b", "c"]);
        drive(&mut straight, &script[..2]);
        let snap = encode(&straight);

        let mut resumed = decode(&snap, straight.parameter_names(), straight.element_names())
            .unwrap();
        for e in [&mut straight, &mut resumed] {
            while let Step::Ask(_) = e.next() {
                let i = (e.comparisons() as usize) % script.len();
                e.answer(script[i]).unwrap();
            }
        }
        assert_eq!(straight.final_ordering(), resumed.final_ordering());
        assert_eq!(straight.comparisons(), resumed.comparisons());
    }

    #[test]
    fn caller_name_mismatch_is_rejected() {
        let e = engine(&["impact"], &["a", "b"]);
        let snap = encode(&e);
        let err = decode(&snap, &names(&["severity"]), &names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, CodecError::StateMismatch { field: "p_names", .. }));
        let err = decode(&snap, &names(&["impact"]), &names(&["a", "z"])).unwrap_err();
        assert!(matches!(err, CodecError::StateMismatch { field: "e_names", .. }));
    }

    #[test]
    fn dangling_cursor_fields_decode_to_idle() {
        // A state saved right after an insertion: elem/parameter still set,
        // range already cleared.
        let snap = EngineSnapshot {
            p_names: names(&["impact"]),
            e_names: names(&["a", "b", "c"]),
            num_parameters: 1,
            num_elements: 3,
            num_comparisons: 1,
            prioritized: vec![vec![0, 1]],
            next_elem: Some(1),
            next_parameter: Some(0),
            next_range: vec![],
            final_list: vec![],
        };
        let mut resumed = decode(&snap, &snap.p_names, &snap.e_names).unwrap();
        assert_eq!(resumed.cursor(), &Cursor::Idle);
        // The next call selects element 2 against the two placed ones.
        match resumed.next() {
            Step::Ask(q) => assert_eq!((q.elem, q.parameter), (2, 0)),
            Step::Done => panic!("engine is not done"),
        }
    }

    #[test]
    fn corrupt_records_are_rejected() {
        let good = EngineSnapshot {
            p_names: names(&["impact"]),
            e_names: names(&["a", "b", "c"]),
            num_parameters: 1,
            num_elements: 3,
            num_comparisons: 1,
            prioritized: vec![vec![0, 1]],
            next_elem: Some(2),
            next_parameter: Some(0),
            next_range: vec![0, 1],
            final_list: vec![],
        };
        assert!(decode(&good, &good.p_names, &good.e_names).is_ok());

        let mut bad = good.clone();
        bad.num_elements = 7;
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));

        let mut bad = good.clone();
        bad.prioritized = vec![vec![0, 9]];
        bad.next_range = vec![0, 9];
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));

        let mut bad = good.clone();
        bad.prioritized = vec![vec![0, 0]];
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));

        // Candidate already placed in the active order.
        let mut bad = good.clone();
        bad.next_elem = Some(1);
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));

        // Window that is not a contiguous run of the order.
        let mut bad = good.clone();
        bad.prioritized = vec![vec![0, 1, 2]];
        bad.e_names.push("d".to_string());
        bad.num_elements = 4;
        bad.next_elem = Some(3);
        bad.next_range = vec![0, 2];
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));

        // Active window without the element/parameter pair.
        let mut bad = good;
        bad.next_elem = None;
        assert!(matches!(
            decode(&bad, &bad.p_names, &bad.e_names),
            Err(CodecError::Corrupt(_))
        ));
    }

    #[test]
    fn canonical_bytes_are_stable_and_newline_terminated() {
        let e = engine(&["impact"], &["a", "b"]);
        let snap = encode(&e);
        let bytes = crate::to_canonical_bytes(&snap).unwrap();
        assert!(bytes.ends_with(b"\n"));
        assert_eq!(bytes, crate::to_canonical_bytes(&snap).unwrap());
        // Canonical bytes parse back to the same record.
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(from_json(text.trim_end()).unwrap(), snap);
    }
}
