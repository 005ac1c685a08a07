//! # Stage Assessment
//!
//! A coarse summary of how far a board has progressed through its
//! lifecycle.
//!
//! **Stages are informational only.** The solver gates on the individual
//! flags, never on the stage.
//!
//! | Stage | Reached when |
//! |-------|--------------|
//! | Empty | no perches |
//! | Assembled | perches (and possibly movers) exist, model incomplete |
//! | Modeled | every mover has a comp |
//! | Initialized | boundary data supplied, ready to solve |
//! | Solved | backward graph filled |
//! | Simulated | forward graph filled (after the backward graph, if any) |

use crate::{CircuitBoard, Direction, LifecycleFlags};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Empty,
    Assembled,
    Modeled,
    Initialized,
    Solved,
    Simulated,
}

impl Stage {
    /// Assess the stage of a board.
    #[must_use]
    pub fn of(board: &CircuitBoard) -> Self {
        Self::from_flags(&board.lifecycle_flags(), board.perch_count())
    }

    /// Assess the stage from pre-computed flags.
    #[must_use]
    pub fn from_flags(flags: &LifecycleFlags, perch_count: usize) -> Self {
        if flags.is_simulated && (flags.is_solved || !flags.movers_backward_exist) {
            Stage::Simulated
        } else if flags.is_solved {
            Stage::Solved
        } else if flags.is_solvable {
            Stage::Initialized
        } else if flags.has_model {
            Stage::Modeled
        } else if perch_count > 0 {
            Stage::Assembled
        } else {
            Stage::Empty
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Empty => "Empty",
            Stage::Assembled => "Assembled",
            Stage::Modeled => "Modeled",
            Stage::Initialized => "Initialized",
            Stage::Solved => "Solved",
            Stage::Simulated => "Simulated",
        }
    }

    /// What the user needs to do to move on.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Stage::Empty => "add perches",
            Stage::Assembled => "add movers and finalize the model",
            Stage::Modeled => "set boundary data on terminal and initial perches",
            Stage::Initialized => "solve",
            Stage::Solved => "simulate the forward graph",
            Stage::Simulated => "done",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Empty => Some(Stage::Assembled),
            Stage::Assembled => Some(Stage::Modeled),
            Stage::Modeled => Some(Stage::Initialized),
            Stage::Initialized => Some(Stage::Solved),
            Stage::Solved => Some(Stage::Simulated),
            Stage::Simulated => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Simulated)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// BOARD METRICS
// =============================================================================

/// Size and fill metrics of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMetrics {
    pub perch_count: usize,
    pub backward_movers: usize,
    pub forward_movers: usize,
    /// Perches with at least one slot set.
    pub populated_perches: usize,
    /// Movers with a comp.
    pub movers_with_comp: usize,
    /// Longest chain across both graphs, in movers.
    pub longest_chain: usize,
}

impl BoardMetrics {
    #[must_use]
    pub fn of(board: &CircuitBoard) -> Self {
        let longest_chain = [Direction::Backward, Direction::Forward]
            .into_iter()
            .flat_map(|direction| {
                let graph = board.graph(direction);
                graph
                    .heads()
                    .into_iter()
                    .map(|head| graph.chain_from(head).len())
                    .collect::<Vec<_>>()
            })
            .max()
            .unwrap_or(0);

        Self {
            perch_count: board.perch_count(),
            backward_movers: board.graph(Direction::Backward).len(),
            forward_movers: board.graph(Direction::Forward).len(),
            populated_perches: board.perches().filter(|p| !p.is_empty()).count(),
            movers_with_comp: board.movers().filter(|m| m.has_comp()).count(),
            longest_chain,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Perch, SourceKeys, TargetKey};

    #[test]
    fn stage_progression() {
        assert_eq!(Stage::Empty.next(), Some(Stage::Assembled));
        assert_eq!(Stage::Solved.next(), Some(Stage::Simulated));
        assert_eq!(Stage::Simulated.next(), None);
        assert!(Stage::Simulated.is_terminal());
        assert!(Stage::Modeled < Stage::Solved);
    }

    #[test]
    fn stage_from_flags() {
        let mut flags = LifecycleFlags::default();
        assert_eq!(Stage::from_flags(&flags, 0), Stage::Empty);
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Assembled);

        flags.has_model = true;
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Modeled);

        flags.is_solvable = true;
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Initialized);

        flags.movers_backward_exist = true;
        flags.is_simulated = true;
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Initialized);

        flags.is_solved = true;
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Simulated);
    }

    #[test]
    fn forward_only_board_reaches_simulated() {
        let flags = LifecycleFlags {
            has_model: true,
            is_solvable: true,
            is_simulated: true,
            ..LifecycleFlags::default()
        };
        assert_eq!(Stage::from_flags(&flags, 2), Stage::Simulated);
    }

    #[test]
    fn metrics_count_chains() {
        let mut board = CircuitBoard::new("metrics");
        for name in ["A", "B", "C"] {
            board.add_perch(Perch::standard(name).expect("perch")).expect("add");
        }
        board
            .add_mover("C", "B", Direction::Backward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
            .expect("mover");
        board
            .add_mover("B", "A", Direction::Backward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
            .expect("mover");
        board
            .add_mover("A", "B", Direction::Forward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
            .expect("mover");

        let metrics = BoardMetrics::of(&board);
        assert_eq!(metrics.perch_count, 3);
        assert_eq!(metrics.backward_movers, 2);
        assert_eq!(metrics.forward_movers, 1);
        assert_eq!(metrics.longest_chain, 2);
        assert_eq!(metrics.movers_with_comp, 0);
        assert_eq!(metrics.populated_perches, 0);
        assert_eq!(Stage::of(&board), Stage::Assembled);
    }
}
