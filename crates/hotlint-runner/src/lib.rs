//! Run orchestration for hotlint.
//!
//! Runs the external lint tool and the hotspot phase, and combines their
//! outcomes into a process exit status. Each phase reports an explicit
//! [`phase::PhaseOutcome`]; nothing is tracked in global state.

pub mod phase;
pub mod tool;
