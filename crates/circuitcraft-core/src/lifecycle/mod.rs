//! # Lifecycle Module
//!
//! Readiness flags and stage assessment for a [`CircuitBoard`].
//!
//! Every flag is derived from the board's current state on demand; nothing
//! is cached. After a failed solve the flags therefore describe exactly the
//! data that was written before the failure.

mod stage;

pub use stage::*;

use crate::{CircuitBoard, Direction};
use serde::{Deserialize, Serialize};

/// Snapshot of all lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecycleFlags {
    pub has_empty_perches: bool,
    pub has_model: bool,
    pub movers_backward_exist: bool,
    pub is_portable: bool,
    pub is_initialized: bool,
    pub is_solvable: bool,
    pub is_solved: bool,
    pub is_simulated: bool,
}

impl LifecycleFlags {
    /// Derive all flags from a board.
    #[must_use]
    pub fn of(board: &CircuitBoard) -> Self {
        Self {
            has_empty_perches: board.has_empty_perches(),
            has_model: board.has_model(),
            movers_backward_exist: board.movers_backward_exist(),
            is_portable: board.is_portable(),
            is_initialized: board.is_initialized(),
            is_solvable: board.is_solvable(),
            is_solved: board.is_solved(),
            is_simulated: board.is_simulated(),
        }
    }

    /// `(name, value)` pairs in a fixed order, for reports.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, bool); 8] {
        [
            ("has_empty_perches", self.has_empty_perches),
            ("has_model", self.has_model),
            ("movers_backward_exist", self.movers_backward_exist),
            ("is_portable", self.is_portable),
            ("is_initialized", self.is_initialized),
            ("is_solvable", self.is_solvable),
            ("is_solved", self.is_solved),
            ("is_simulated", self.is_simulated),
        ]
    }
}

impl CircuitBoard {
    /// All flags at once.
    #[must_use]
    pub fn lifecycle_flags(&self) -> LifecycleFlags {
        LifecycleFlags::of(self)
    }

    /// Some perch has every declared slot unset.
    #[must_use]
    pub fn has_empty_perches(&self) -> bool {
        self.perches().any(|p| p.is_empty())
    }

    /// At least one mover exists and every mover has a comp.
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.mover_count() > 0 && self.movers().all(|m| m.has_comp())
    }

    #[must_use]
    pub fn movers_backward_exist(&self) -> bool {
        !self.graph(Direction::Backward).is_empty()
    }

    /// The board can be stripped of data and re-solved elsewhere.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.has_model()
    }

    /// Every boundary perch has its boundary slot set.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.boundary_ready(Direction::Backward) && self.boundary_ready(Direction::Forward)
    }

    #[must_use]
    pub fn is_solvable(&self) -> bool {
        self.has_model() && self.is_initialized()
    }

    /// Every perch of the backward graph holds a backward value.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.graph_filled(Direction::Backward)
    }

    /// Every perch of the forward graph holds a forward value.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.graph_filled(Direction::Forward)
    }

    /// The boundary perches of `direction` have their boundary slot set.
    pub(crate) fn boundary_ready(&self, direction: Direction) -> bool {
        let slot = self.boundary_slot(direction);
        self.boundary_perches(direction)
            .into_iter()
            .filter_map(|name| self.perch(name))
            .all(|perch| perch.is_initialized([slot]))
    }

    /// One phase can run: its movers all have comps and its boundary is set.
    pub(crate) fn phase_ready(&self, direction: Direction) -> bool {
        self.graph(direction).movers().all(|m| m.has_comp()) && self.boundary_ready(direction)
    }

    fn graph_filled(&self, direction: Direction) -> bool {
        let graph = self.graph(direction);
        if graph.is_empty() {
            return false;
        }

        let slot = self.boundary_slot(direction);
        graph
            .perches()
            .into_iter()
            .filter_map(|name| self.perch(name))
            .all(|perch| perch.is_initialized([slot]))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompOutput, Perch, Slots, SourceKeys, TargetKey, comp_fn};

    fn board() -> CircuitBoard {
        let mut board = CircuitBoard::new("flags");
        board.add_perch(Perch::standard("A").expect("perch")).expect("add");
        board.add_perch(Perch::standard("B").expect("perch")).expect("add");
        board
            .add_mover("B", "A", Direction::Backward, SourceKeys::selected(["up"]), TargetKey::slot("up"))
            .expect("mover");
        board
            .add_mover("A", "B", Direction::Forward, SourceKeys::WholeMapping, TargetKey::slot("down"))
            .expect("mover");
        board
    }

    #[test]
    fn fresh_board_flags() {
        let flags = board().lifecycle_flags();
        assert!(flags.has_empty_perches);
        assert!(!flags.has_model);
        assert!(flags.movers_backward_exist);
        assert!(!flags.is_portable);
        assert!(!flags.is_initialized);
        assert!(!flags.is_solvable);
        assert!(!flags.is_solved);
        assert!(!flags.is_simulated);
    }

    #[test]
    fn empty_board_has_no_model() {
        let board = CircuitBoard::new("empty");
        let flags = board.lifecycle_flags();
        assert!(!flags.has_model);
        assert!(!flags.has_empty_perches);
        assert!(!flags.is_solved);
        assert!(flags.is_initialized);
    }

    #[test]
    fn flags_follow_data() {
        let mut board = board();
        let echo = comp_fn(|input: &Slots| Ok(CompOutput::Mapping(input.clone())));
        board
            .set_mover_comp("B", "A", Direction::Backward, echo.clone())
            .expect("comp");
        board
            .set_mover_comp("A", "B", Direction::Forward, echo)
            .expect("comp");
        assert!(board.has_model());
        assert!(board.is_portable());

        board.set_perch_data("B", "up", 1.0).expect("set");
        assert!(!board.is_initialized());

        board.set_perch_data("A", "down", 1.0).expect("set");
        assert!(board.is_initialized());
        assert!(board.is_solvable());
        assert!(!board.is_solved());

        board.set_perch_data("A", "up", 1.0).expect("set");
        assert!(board.is_solved());
        assert!(!board.is_simulated());

        board.set_perch_data("B", "down", 1.0).expect("set");
        assert!(board.is_simulated());
        assert!(!board.has_empty_perches());
    }

    #[test]
    fn entries_are_stable() {
        let names: Vec<_> = LifecycleFlags::default()
            .entries()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names.first(), Some(&"has_empty_perches"));
        assert_eq!(names.last(), Some(&"is_simulated"));
        assert_eq!(names.len(), 8);
    }
}
