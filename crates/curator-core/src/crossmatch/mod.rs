//! Cross-identification of homogenized records against the reference
//! catalog.
//!
//! Per record the outcome moves from unresolved to exactly one of
//! [`CIResult::New`], [`CIResult::Existing`] or [`CIResult::Collision`].

mod engine;
mod result;
mod task;

pub use engine::CrossmatchEngine;
pub use result::{CIResult, OutcomeCounts};
pub use task::{cursor_fraction, BatchProgress, CrossmatchTask, CursorRange, StopSignal, TaskOutcome};
