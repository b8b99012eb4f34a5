//! Staged loading
//!
//! A load process is a resumable state machine: `begin` once, then `step`
//! until it reports completion. Each step does a bounded amount of work so
//! a caller can interleave progress reporting.

pub mod prefabs;

pub use prefabs::LoadPrefabs;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where a load process is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStage {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// One resumable loading task
pub trait LoadProcess {
    /// Human-readable description of the current work
    fn message(&self) -> String;

    /// NotStarted -> InProgress
    fn begin(&mut self) -> Result<()>;

    /// Do one unit of work; `true` once the process is complete
    fn step(&mut self) -> Result<bool>;

    fn stage(&self) -> LoadStage;

    /// Completed fraction, 0.0 to 1.0
    fn progress(&self) -> f32;

    /// Relative weight against other load processes
    fn expected_cost(&self) -> u32 {
        1
    }
}

/// Begin `process` and step it until complete, returning the step count
pub fn run_to_completion(process: &mut dyn LoadProcess) -> Result<usize> {
    process.begin()?;
    let mut steps = 0;
    loop {
        steps += 1;
        if process.step()? {
            return Ok(steps);
        }
    }
}
