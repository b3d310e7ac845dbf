//! ur_core — Comparison-driven ordering engine.
//!
//! This crate is **I/O-free**. It owns the per-parameter working orders, the
//! probe cursor, and the comparison counter, and answers two questions for the
//! layers above (`ur_io`, `ur_session`, `ur_cli`):
//!
//! - "what should the human be asked next?" (`Engine::next`)
//! - "where does the candidate land, given the answer?" (`Engine::answer`)
//!
//! Working orders are kept **ascending**: lowest priority first, highest last.
//! The final ordering (`Engine::final_ordering`) is emitted highest-first by
//! the lexicographic combination in [`combine`].
//!
//! No clocks, no RNG, no global state. Logging is opt-in through a
//! caller-provided [`trace::TraceSink`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod errors {
    use alloc::string::String;
    use core::fmt;

    /// Which name list an offending name belongs to.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum NameKind {
        Parameter,
        Element,
    }

    impl fmt::Display for NameKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                NameKind::Parameter => f.write_str("parameter"),
                NameKind::Element => f.write_str("element"),
            }
        }
    }

    /// Error set for engine construction, stepping, and reconstitution.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum EngineError {
        /// A parameter or element name repeats within its list.
        DuplicateName { kind: NameKind, name: String },
        /// `answer` was called while no probe window is active.
        NoPendingQuestion,
        /// `answer` was called after every order is complete.
        AlreadyDone,
        /// A saved state violates an engine invariant (reconstitution only).
        InvalidState(&'static str),
    }

    impl fmt::Display for EngineError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                EngineError::DuplicateName { kind, name } => {
                    write!(f, "duplicate {kind} name: {name}")
                }
                EngineError::NoPendingQuestion => {
                    f.write_str("no pending question: call next() before answer()")
                }
                EngineError::AlreadyDone => f.write_str("ordering is already complete"),
                EngineError::InvalidState(what) => write!(f, "invalid saved state: {what}"),
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for EngineError {}
}

pub mod trace {
    //! Opt-in transition logging through a caller-provided sink.
    //!
    //! The engine never opens files or touches a global logger; front-ends
    //! that want a trail install a sink and flip the toggle.

    /// Receives one line per engine transition while tracing is enabled.
    pub trait TraceSink {
        fn record(&mut self, line: &str);
    }
}

pub mod combine;
pub mod engine;

pub use engine::{Choice, Comparison, Cursor, Engine, Step};
pub use errors::{EngineError, NameKind};
