//! The stepwise-comparison ordering engine.
//!
//! One engine instance drives one elicitation: it holds the parameter and
//! element name lists, one working order per parameter, the probe cursor, and
//! the comparison counter. Callers alternate `next()` / `answer()` until
//! `next()` reports [`Step::Done`], then read [`Engine::final_ordering`].
//!
//! Working orders are ascending (highest priority last). The probe window is
//! always a non-empty contiguous run of the active parameter's order, and the
//! comparand is the window median `window[len / 2]` — for a two-element
//! window that is the *higher* element, which is why a HIGHER answer pins the
//! candidate's slot immediately while a LOWER answer only narrows the window.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::combine;
use crate::errors::{EngineError, NameKind};
use crate::trace::TraceSink;

/// A human's verdict on one question: is the candidate's priority lower or
/// higher than the comparand's, under the active parameter?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Choice {
    Lower,
    Higher,
}

/// One question: compare `elem` against `against` under `parameter`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Comparison {
    /// Candidate element being inserted.
    pub elem: usize,
    /// Element it is compared against (the window median).
    pub against: usize,
    /// Parameter the comparison is made under.
    pub parameter: usize,
}

/// Outcome of [`Engine::next`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Ask(Comparison),
    Done,
}

/// The in-flight insertion, if any.
///
/// `Probing` holds the candidate, the active parameter, and the shrinking
/// binary-search window. All-or-nothing by construction — there is no state
/// where an element is pending without a window.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Cursor {
    #[default]
    Idle,
    Probing {
        elem: usize,
        param: usize,
        window: Vec<usize>,
    },
}

/// Stateful ordering machine. See the module docs for the protocol.
pub struct Engine {
    params: Vec<String>,
    elems: Vec<String>,
    /// One ascending working order per parameter; grows one element per
    /// completed insertion until it is a full permutation of `0..n`.
    prioritized: Vec<Vec<usize>>,
    comparisons: u64,
    cursor: Cursor,
    /// Most recently computed final ordering (snapshot-visible).
    last_ordering: Vec<usize>,
    sink: Option<Box<dyn TraceSink>>,
    tracing: bool,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("params", &self.params)
            .field("elems", &self.elems)
            .field("prioritized", &self.prioritized)
            .field("comparisons", &self.comparisons)
            .field("cursor", &self.cursor)
            .field("last_ordering", &self.last_ordering)
            .field("tracing", &self.tracing)
            .finish_non_exhaustive()
    }
}

fn ensure_unique(names: &[String], kind: NameKind) -> Result<(), EngineError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(EngineError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// True when `window` occurs as a contiguous run inside `table`.
fn is_contiguous_run(table: &[usize], window: &[usize]) -> bool {
    !window.is_empty()
        && window.len() <= table.len()
        && table.windows(window.len()).any(|w| w == window)
}

impl Engine {
    /// Create an engine over the given parameter and element names.
    ///
    /// Parameters are ordered most-important first; elements are referenced
    /// by index from here on. Either list may be empty (such an engine is
    /// immediately done).
    pub fn new(
        parameter_names: Vec<String>,
        element_names: Vec<String>,
    ) -> Result<Self, EngineError> {
        ensure_unique(&parameter_names, NameKind::Parameter)?;
        ensure_unique(&element_names, NameKind::Element)?;
        let tables = vec![Vec::new(); parameter_names.len()];
        Ok(Self {
            params: parameter_names,
            elems: element_names,
            prioritized: tables,
            comparisons: 0,
            cursor: Cursor::Idle,
            last_ordering: Vec::new(),
            sink: None,
            tracing: false,
        })
    }

    /// Reconstitute an engine from saved parts, re-validating every invariant.
    ///
    /// This is the codec's entry point; front-ends should not need it.
    pub fn from_saved(
        parameter_names: Vec<String>,
        element_names: Vec<String>,
        prioritized: Vec<Vec<usize>>,
        comparisons: u64,
        cursor: Cursor,
        last_ordering: Vec<usize>,
    ) -> Result<Self, EngineError> {
        ensure_unique(&parameter_names, NameKind::Parameter)?;
        ensure_unique(&element_names, NameKind::Element)?;
        let k = parameter_names.len();
        let n = element_names.len();
        if prioritized.len() != k {
            return Err(EngineError::InvalidState(
                "order-table count differs from parameter count",
            ));
        }
        for table in &prioritized {
            let mut seen = BTreeSet::new();
            for &e in table {
                if e >= n {
                    return Err(EngineError::InvalidState("order entry out of range"));
                }
                if !seen.insert(e) {
                    return Err(EngineError::InvalidState("order entry repeated"));
                }
            }
        }
        if let Cursor::Probing { elem, param, ref window } = cursor {
            if param >= k {
                return Err(EngineError::InvalidState("cursor parameter out of range"));
            }
            if elem >= n {
                return Err(EngineError::InvalidState("cursor element out of range"));
            }
            if prioritized[param].contains(&elem) {
                return Err(EngineError::InvalidState("cursor element already placed"));
            }
            if !is_contiguous_run(&prioritized[param], window) {
                return Err(EngineError::InvalidState(
                    "probe window is not a run of the parameter's order",
                ));
            }
        }
        for &e in &last_ordering {
            if e >= n {
                return Err(EngineError::InvalidState("final entry out of range"));
            }
        }
        Ok(Self {
            params: parameter_names,
            elems: element_names,
            prioritized,
            comparisons,
            cursor,
            last_ordering,
            sink: None,
            tracing: false,
        })
    }

    // ---- read accessors ----

    pub fn parameter_names(&self) -> &[String] {
        &self.params
    }

    pub fn element_names(&self) -> &[String] {
        &self.elems
    }

    /// The per-parameter working orders (ascending priority).
    pub fn tables(&self) -> &[Vec<usize>] {
        &self.prioritized
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Accepted answers so far (window shrinks included).
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// The ordering computed by the last `final_ordering` call, if any.
    pub fn last_ordering(&self) -> &[usize] {
        &self.last_ordering
    }

    /// All orders complete?
    pub fn is_done(&self) -> bool {
        let placed: usize = self.prioritized.iter().map(Vec::len).sum();
        placed == self.params.len() * self.elems.len()
    }

    /// Percentage of order slots filled, in `[0, 100]` (0 for a degenerate
    /// engine with no parameters or no elements).
    pub fn progress(&self) -> f64 {
        let total = self.params.len() * self.elems.len();
        if total == 0 {
            return 0.0;
        }
        let placed: usize = self.prioritized.iter().map(Vec::len).sum();
        100.0 * placed as f64 / total as f64
    }

    // ---- stepping ----

    /// Produce the next question, or report completion.
    ///
    /// Selecting a fresh question mutates: it picks the least-advanced
    /// parameter, may seat that parameter's very first element for free, and
    /// opens a full-width probe window. While a window is active the same
    /// question is returned without mutation. A single-element engine seats
    /// its element into every order on the first call and reports Done.
    pub fn next(&mut self) -> Step {
        if self.is_done() {
            return Step::Done;
        }
        if self.elems.len() == 1 {
            for table in &mut self.prioritized {
                *table = vec![0];
            }
            self.trace_line("seated the only element in every order");
            return Step::Done;
        }
        if let Cursor::Probing { elem, param, ref window } = self.cursor {
            return Step::Ask(Comparison {
                elem,
                against: window[window.len() / 2],
                parameter: param,
            });
        }

        // Fresh cursor: least-advanced parameter, smallest unplaced element.
        let param = self.least_advanced_parameter();
        let remaining = self.remaining_for(param);
        let mut elem = remaining[0];
        if self.prioritized[param].is_empty() {
            // The first element of an order needs no comparison.
            self.prioritized[param].push(elem);
            elem = remaining[1];
        }
        let window = self.prioritized[param].clone();
        let against = window[window.len() / 2];
        self.cursor = Cursor::Probing { elem, param, window };
        Step::Ask(Comparison {
            elem,
            against,
            parameter: param,
        })
    }

    /// Apply the human's verdict for the pending question.
    ///
    /// Either narrows the probe window or inserts the candidate into the
    /// active order (closing the cursor). Errors leave the engine untouched.
    pub fn answer(&mut self, choice: Choice) -> Result<(), EngineError> {
        if self.is_done() {
            return Err(EngineError::AlreadyDone);
        }
        let (elem, param, mut window) = match core::mem::take(&mut self.cursor) {
            Cursor::Idle => return Err(EngineError::NoPendingQuestion),
            Cursor::Probing { elem, param, window } => (elem, param, window),
        };
        self.comparisons += 1;

        let against = window[window.len() / 2];
        match choice {
            Choice::Lower => self.trace_line(&format!("parameter {param}: {elem} < {against}")),
            Choice::Higher => self.trace_line(&format!("parameter {param}: {against} < {elem}")),
        }

        match (window.len(), choice) {
            // Window of one: the slot is known either way.
            (1, _) => self.place(param, elem, against, choice),
            // Window of two: the comparand is the higher element, so HIGHER
            // pins the slot at the top while LOWER still leaves two slots.
            (2, Choice::Lower) => {
                window.truncate(1);
                self.cursor = Cursor::Probing { elem, param, window };
            }
            (2, Choice::Higher) => self.place(param, elem, against, Choice::Higher),
            // Wider window: keep the half the answer selects, pivot excluded.
            (len, Choice::Lower) => {
                window.truncate(len / 2);
                self.cursor = Cursor::Probing { elem, param, window };
            }
            (len, Choice::Higher) => {
                window.drain(..=len / 2);
                self.cursor = Cursor::Probing { elem, param, window };
            }
        }
        Ok(())
    }

    /// Insert `elem` directly below (`Lower`) or above (`Higher`) `anchor` in
    /// the parameter's ascending order. Closes the cursor.
    fn place(&mut self, param: usize, elem: usize, anchor: usize, side: Choice) {
        let table = &mut self.prioritized[param];
        // The anchor is in the table by the cursor invariant.
        let at = table
            .iter()
            .position(|&e| e == anchor)
            .unwrap_or(table.len());
        match side {
            Choice::Lower => table.insert(at, elem),
            Choice::Higher => table.insert(at + 1, elem),
        }
        self.trace_line(&format!("parameter {param}: placed {elem}"));
    }

    fn least_advanced_parameter(&self) -> usize {
        let mut best = 0;
        for (i, table) in self.prioritized.iter().enumerate() {
            if table.len() < self.prioritized[best].len() {
                best = i;
            }
        }
        best
    }

    /// Unplaced elements for `param`, ascending.
    fn remaining_for(&self, param: usize) -> Vec<usize> {
        let placed: BTreeSet<usize> = self.prioritized[param].iter().copied().collect();
        (0..self.elems.len()).filter(|i| !placed.contains(i)).collect()
    }

    /// Combine the completed orders into the global ordering, highest
    /// priority first. Empty unless the engine is done and has at least one
    /// parameter. The result is cached for snapshots.
    pub fn final_ordering(&mut self) -> Vec<usize> {
        if !self.is_done() || self.params.is_empty() {
            return Vec::new();
        }
        self.last_ordering = combine::merge_ordered(&self.prioritized, self.elems.len());
        self.trace_line(&format!("final ordering: {:?}", self.last_ordering));
        self.last_ordering.clone()
    }

    // ---- editing between questions ----

    /// Append a new element. The active cursor (if any) is untouched; the
    /// newcomer simply joins each order's remaining set.
    pub fn add_element(&mut self, name: &str) -> bool {
        if self.elems.iter().any(|n| n == name) {
            return false;
        }
        self.elems.push(name.to_string());
        self.trace_line(&format!("added element {}: {name}", self.elems.len() - 1));
        true
    }

    /// Remove element `idx`, rewriting every order, the probe window, and the
    /// cursor so no stale index survives.
    pub fn remove_element(&mut self, idx: usize) -> bool {
        if idx >= self.elems.len() {
            return false;
        }
        self.trace_line(&format!("removed element {idx}: {}", self.elems[idx]));
        for table in &mut self.prioritized {
            table.retain(|&e| e != idx);
            for e in table.iter_mut() {
                if *e > idx {
                    *e -= 1;
                }
            }
        }
        self.elems.remove(idx);
        self.last_ordering.clear();
        self.cursor = match core::mem::take(&mut self.cursor) {
            Cursor::Idle => Cursor::Idle,
            Cursor::Probing { elem, param, mut window } => {
                window.retain(|&e| e != idx);
                for e in window.iter_mut() {
                    if *e > idx {
                        *e -= 1;
                    }
                }
                if elem == idx || window.is_empty() {
                    Cursor::Idle
                } else {
                    let elem = if elem > idx { elem - 1 } else { elem };
                    Cursor::Probing { elem, param, window }
                }
            }
        };
        true
    }

    /// Append a new parameter with the lowest priority and an empty order.
    pub fn add_parameter(&mut self, name: &str) -> bool {
        if self.params.iter().any(|n| n == name) {
            return false;
        }
        self.params.push(name.to_string());
        self.prioritized.push(Vec::new());
        self.trace_line(&format!(
            "added parameter {} (lowest priority): {name}",
            self.params.len() - 1
        ));
        true
    }

    /// Remove parameter `idx` and its order; a cursor probing it is cleared.
    pub fn remove_parameter(&mut self, idx: usize) -> bool {
        if idx >= self.params.len() {
            return false;
        }
        self.trace_line(&format!("removed parameter {idx}: {}", self.params[idx]));
        self.prioritized.remove(idx);
        self.params.remove(idx);
        self.last_ordering.clear();
        self.cursor = match core::mem::take(&mut self.cursor) {
            Cursor::Idle => Cursor::Idle,
            Cursor::Probing { elem, param, window } => {
                if param == idx {
                    Cursor::Idle
                } else {
                    let param = if param > idx { param - 1 } else { param };
                    Cursor::Probing { elem, param, window }
                }
            }
        };
        true
    }

    pub fn rename_element(&mut self, idx: usize, new_name: &str) -> bool {
        if idx >= self.elems.len() || self.elems.iter().any(|n| n == new_name) {
            return false;
        }
        self.trace_line(&format!("renamed element {idx}: {} -> {new_name}", self.elems[idx]));
        self.elems[idx] = new_name.to_string();
        true
    }

    pub fn rename_parameter(&mut self, idx: usize, new_name: &str) -> bool {
        if idx >= self.params.len() || self.params.iter().any(|n| n == new_name) {
            return false;
        }
        self.trace_line(&format!(
            "renamed parameter {idx}: {} -> {new_name}",
            self.params[idx]
        ));
        self.params[idx] = new_name.to_string();
        true
    }

    /// Swap the importance of two parameters (orders travel with the names).
    pub fn swap_parameter_priorities(&mut self, a: usize, b: usize) -> bool {
        if a >= self.params.len() || b >= self.params.len() || a == b {
            return false;
        }
        self.trace_line(&format!(
            "swapped parameters {a} and {b}: {} <-> {}",
            self.params[a], self.params[b]
        ));
        self.prioritized.swap(a, b);
        self.params.swap(a, b);
        if let Cursor::Probing { ref mut param, .. } = self.cursor {
            if *param == a {
                *param = b;
            } else if *param == b {
                *param = a;
            }
        }
        true
    }

    // ---- tracing ----

    /// Attach a trace sink at construction time and enable tracing.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self.tracing = true;
        self
    }

    /// Toggle tracing without touching the installed sink.
    pub fn set_tracing(&mut self, on: bool) {
        self.tracing = on;
    }

    fn trace_line(&mut self, line: &str) {
        if self.tracing {
            if let Some(sink) = self.sink.as_deref_mut() {
                sink.record(line);
            }
        }
    }

    // ---- status ----

    /// Human-readable state summary, one line per entry.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.params.len() + 5);
        lines.push(format!("Parameters: {:?}", self.params));
        lines.push(format!("Elements: {:?}", self.elems));
        for (i, table) in self.prioritized.iter().enumerate() {
            lines.push(format!("Parameter {i} ({}): {table:?}", self.params[i]));
        }
        match &self.cursor {
            Cursor::Idle => lines.push("No pending question".to_string()),
            Cursor::Probing { elem, param, window } => lines.push(format!(
                "Placing element {elem} under parameter {param}, window {window:?}"
            )),
        }
        lines.push(format!("Comparisons so far: {}", self.comparisons));
        lines.push(format!("Progress: {:.2}%", self.progress()));
        lines
    }
}
