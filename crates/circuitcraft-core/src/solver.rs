//! # Solver
//!
//! Two-phase execution of a [`CircuitBoard`].
//!
//! The backward phase runs first, then the forward phase. Within a phase
//! every chain is walked from its boundary perch outward; chains are taken
//! in perch insertion order of that boundary perch. Because each perch has
//! at most one incoming mover per direction, this order is topological.
//!
//! A failing mover aborts the solve. Writes made before the failure are kept.

use crate::board::unknown_mover;
use crate::{CircuitBoard, CircuitError, Direction, MoverId, Slots};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Which phases `solve` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMode {
    /// Backward then forward.
    #[default]
    Full,
    #[serde(rename = "backward")]
    BackwardOnly,
    #[serde(rename = "forward")]
    ForwardOnly,
}

impl SolveMode {
    /// Map the `(backward_only, forward_only)` pair onto a mode.
    ///
    /// Asking for both at once is a `Validation` error.
    pub fn from_flags(backward_only: bool, forward_only: bool) -> Result<Self, CircuitError> {
        match (backward_only, forward_only) {
            (false, false) => Ok(SolveMode::Full),
            (true, false) => Ok(SolveMode::BackwardOnly),
            (false, true) => Ok(SolveMode::ForwardOnly),
            (true, true) => Err(CircuitError::Validation(
                "backward_only and forward_only cannot both be set".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn runs(&self, direction: Direction) -> bool {
        match self {
            SolveMode::Full => true,
            SolveMode::BackwardOnly => direction == Direction::Backward,
            SolveMode::ForwardOnly => direction == Direction::Forward,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveMode::Full => "full",
            SolveMode::BackwardOnly => "backward",
            SolveMode::ForwardOnly => "forward",
        }
    }
}

impl fmt::Display for SolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolveMode {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(SolveMode::Full),
            "backward" | "backward_only" => Ok(SolveMode::BackwardOnly),
            "forward" | "forward_only" => Ok(SolveMode::ForwardOnly),
            other => Err(CircuitError::Validation(format!(
                "unrecognized solve mode '{}': use full, backward or forward",
                other
            ))),
        }
    }
}

/// Movers executed by a solve, per phase, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveReport {
    pub backward: Vec<MoverId>,
    pub forward: Vec<MoverId>,
}

impl SolveReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.backward.len() + self.forward.len()
    }

    fn phase_mut(&mut self, direction: Direction) -> &mut Vec<MoverId> {
        match direction {
            Direction::Backward => &mut self.backward,
            Direction::Forward => &mut self.forward,
        }
    }
}

impl CircuitBoard {
    /// Execute the board.
    ///
    /// `NotSolvable` without touching any perch if the requested phases are
    /// not ready; `MoverFailed` naming the mover if a mover fails midway.
    pub fn solve(&mut self, mode: SolveMode) -> Result<SolveReport, CircuitError> {
        self.ensure_ready(mode)?;

        let mut report = SolveReport::default();
        for direction in [Direction::Backward, Direction::Forward] {
            if mode.runs(direction) {
                self.run_phase(direction, &mut report)?;
            }
        }

        info!(
            board = %self.name(),
            %mode,
            movers = report.total(),
            "solve complete"
        );
        Ok(report)
    }

    /// Backward phase only.
    pub fn solve_backward(&mut self) -> Result<SolveReport, CircuitError> {
        self.solve(SolveMode::BackwardOnly)
    }

    /// Forward phase only.
    pub fn solve_forward(&mut self) -> Result<SolveReport, CircuitError> {
        self.solve(SolveMode::ForwardOnly)
    }

    /// Run exactly one mover, regardless of solvability.
    ///
    /// `Structure` if the mover does not exist, `NotReady` if it has no comp.
    /// Returns the slots written into the target perch.
    pub fn execute_mover(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
    ) -> Result<Slots, CircuitError> {
        self.run_mover(&MoverId::new(source, target, direction))
    }

    /// The order in which a phase executes its movers.
    #[must_use]
    pub fn execution_order(&self, direction: Direction) -> Vec<MoverId> {
        let graph = self.graph(direction);
        self.boundary_perches(direction)
            .into_iter()
            .flat_map(|head| graph.chain_from(head))
            .map(|mover| mover.id().clone())
            .collect()
    }

    fn ensure_ready(&self, mode: SolveMode) -> Result<(), CircuitError> {
        let ready = match mode {
            SolveMode::Full => self.is_solvable(),
            SolveMode::BackwardOnly => self.phase_ready(Direction::Backward),
            SolveMode::ForwardOnly => self.phase_ready(Direction::Forward),
        };

        if ready {
            return Ok(());
        }

        let reason = if !self.has_model() && mode == SolveMode::Full {
            "model incomplete: every mover needs a comp"
        } else if [Direction::Backward, Direction::Forward]
            .into_iter()
            .filter(|d| mode.runs(*d))
            .any(|d| !self.boundary_ready(d))
        {
            "boundary data missing on terminal or initial perches"
        } else {
            "a mover of the requested phase has no comp"
        };

        Err(CircuitError::NotSolvable(format!(
            "board '{}' ({} mode): {}",
            self.name(),
            mode,
            reason
        )))
    }

    fn run_phase(
        &mut self,
        direction: Direction,
        report: &mut SolveReport,
    ) -> Result<(), CircuitError> {
        let order = self.execution_order(direction);
        if order.is_empty() {
            debug!(%direction, "phase skipped: no movers");
            return Ok(());
        }

        info!(%direction, movers = order.len(), "phase started");
        for id in order {
            match self.run_mover(&id) {
                Ok(written) => {
                    debug!(mover = %id, slots = written.len(), "mover executed");
                    report.phase_mut(direction).push(id);
                }
                Err(e) => {
                    warn!(mover = %id, error = %e, "mover failed, aborting solve");
                    return Err(CircuitError::MoverFailed {
                        mover: id,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }

    fn run_mover(&mut self, id: &MoverId) -> Result<Slots, CircuitError> {
        let graph = match id.direction {
            Direction::Backward => &self.backward,
            Direction::Forward => &self.forward,
        };
        let mover = graph
            .get(&id.source, &id.target)
            .ok_or_else(|| unknown_mover(id))?;

        let source = self
            .perches
            .get(&id.source)
            .ok_or_else(|| unknown_mover(id))?;
        let input = mover.gather_input(source)?;
        let result = mover.apply(&input)?;

        let target = self
            .perches
            .get_mut(&id.target)
            .ok_or_else(|| unknown_mover(id))?;
        mover.deliver(target, result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
