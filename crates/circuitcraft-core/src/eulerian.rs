//! # Eulerian Verifier
//!
//! Checks whether the backward and forward graphs of a board close into a
//! single circuit: from a terminal perch down the backward movers and back
//! up through the forward movers.
//!
//! Both graphs are combined in data-flow orientation into one directed
//! multigraph whose edges remember their direction.

use crate::{CircuitBoard, Direction};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// One edge of an Eulerian tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EulerStep {
    pub from: String,
    pub to: String,
    pub direction: Direction,
}

impl fmt::Display for EulerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.direction)
    }
}

/// Both graphs merged: adjacency in both orientations.
struct CombinedGraph<'a> {
    perches: Vec<&'a str>,
    outgoing: BTreeMap<&'a str, Vec<(&'a str, Direction)>>,
    incoming: BTreeMap<&'a str, Vec<&'a str>>,
    edge_count: usize,
}

impl<'a> CombinedGraph<'a> {
    fn of(board: &'a CircuitBoard) -> Self {
        let mut outgoing: BTreeMap<&str, Vec<(&str, Direction)>> = BTreeMap::new();
        let mut incoming: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for mover in board.movers() {
            outgoing
                .entry(mover.source())
                .or_default()
                .push((mover.target(), mover.direction()));
            incoming
                .entry(mover.target())
                .or_default()
                .push(mover.source());
        }

        Self {
            perches: board.perches().map(|p| p.name()).collect(),
            outgoing,
            incoming,
            edge_count: board.mover_count(),
        }
    }

    fn is_balanced(&self) -> bool {
        self.perches.iter().all(|p| {
            let out = self.outgoing.get(p).map_or(0, Vec::len);
            let inc = self.incoming.get(p).map_or(0, Vec::len);
            out == inc
        })
    }

    fn is_strongly_connected(&self) -> bool {
        let Some(&start) = self.perches.first() else {
            return false;
        };

        let forward = self.visit(start, |p| {
            self.outgoing
                .get(p)
                .map(|edges| edges.iter().map(|(to, _)| *to).collect())
                .unwrap_or_default()
        });
        let backward = self.visit(start, |p| self.incoming.get(p).cloned().unwrap_or_default());

        forward.len() == self.perches.len() && backward.len() == self.perches.len()
    }

    fn visit<F>(&self, start: &'a str, neighbors: F) -> BTreeSet<&'a str>
    where
        F: Fn(&'a str) -> Vec<&'a str>,
    {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for next in neighbors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }
}

impl CircuitBoard {
    /// True if the two graphs form one Eulerian circuit through a terminal
    /// perch.
    ///
    /// Requires both graphs to be non-empty, a backward-terminal perch, equal
    /// in- and out-degree everywhere, strong connectivity over all perches,
    /// and a perch reachable from a terminal perch through backward movers
    /// that leads back to it through forward movers.
    #[must_use]
    pub fn is_eulerian_circuit(&self) -> bool {
        if self.backward.is_empty() || self.forward.is_empty() {
            return false;
        }
        if self.backward_terminal_perches().is_empty() {
            return false;
        }

        let combined = CombinedGraph::of(self);
        if !combined.is_balanced() || !combined.is_strongly_connected() {
            return false;
        }

        self.closing_pair().is_some()
    }

    /// True if both graphs carry movers but do not close into an Eulerian
    /// circuit. A full backward-then-forward solve of such a board may leave
    /// the forward results inconsistent with the backward ones.
    #[must_use]
    pub fn is_open_circuit(&self) -> bool {
        !self.backward.is_empty() && !self.forward.is_empty() && !self.is_eulerian_circuit()
    }

    /// A witness for the circuit: the backward path from a terminal perch to
    /// a turning perch followed by the forward path back to the terminal.
    ///
    /// The turning perch appears once. This is not an edge-complete tour; see
    /// [`CircuitBoard::eulerian_tour`] for that.
    #[must_use]
    pub fn find_eulerian_path(&self) -> Option<Vec<String>> {
        if self.backward.is_empty() || self.forward.is_empty() {
            return None;
        }

        let (terminal, turn) = self.closing_pair()?;
        let mut path = self.backward.path(&terminal, &turn)?;
        let back = self.forward.path(&turn, &terminal)?;
        path.extend(back.into_iter().skip(1));
        Some(path)
    }

    /// Every mover exactly once, as a closed walk starting at the first
    /// backward-terminal perch and preferring backward movers.
    ///
    /// `None` unless the combined graph is balanced and strongly connected.
    #[must_use]
    pub fn eulerian_tour(&self) -> Option<Vec<EulerStep>> {
        let start = *self.backward_terminal_perches().first()?;

        let combined = CombinedGraph::of(self);
        if !combined.is_balanced() || !combined.is_strongly_connected() {
            return None;
        }

        // Forward edges first so that `pop` yields backward edges first.
        let mut remaining = combined.outgoing.clone();
        for edges in remaining.values_mut() {
            edges.sort_by_key(|(to, direction)| (Reverse(*direction), Reverse(*to)));
        }

        let mut stack: Vec<(&str, Option<(&str, Direction)>)> = vec![(start, None)];
        let mut tour = Vec::with_capacity(combined.edge_count);

        while let Some(&(current, _)) = stack.last() {
            match remaining.get_mut(current).and_then(Vec::pop) {
                Some((next, direction)) => stack.push((next, Some((current, direction)))),
                None => {
                    if let Some((to, Some((from, direction)))) = stack.pop() {
                        tour.push(EulerStep {
                            from: from.to_string(),
                            to: to.to_string(),
                            direction,
                        });
                    }
                }
            }
        }

        if tour.len() != combined.edge_count {
            return None;
        }
        tour.reverse();
        Some(tour)
    }

    /// First `(terminal, turn)` such that `turn` is reachable from
    /// `terminal` through backward movers and leads back to it through
    /// forward movers.
    fn closing_pair(&self) -> Option<(String, String)> {
        self.backward_terminal_perches()
            .into_iter()
            .find_map(|terminal| {
                self.backward
                    .reachable(terminal)
                    .into_iter()
                    .find(|turn| self.forward.reaches(turn, terminal))
                    .map(|turn| (terminal.to_string(), turn))
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Perch, SourceKeys, TargetKey};

    fn board(backward: &[(&str, &str)], forward: &[(&str, &str)]) -> CircuitBoard {
        let mut board = CircuitBoard::new("euler");
        for name in ["A", "B", "C"] {
            board.add_perch(Perch::standard(name).expect("perch")).expect("add");
        }
        for (s, t) in backward {
            board
                .add_mover(s, t, Direction::Backward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
                .expect("backward");
        }
        for (s, t) in forward {
            board
                .add_mover(s, t, Direction::Forward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
                .expect("forward");
        }
        board
    }

    fn matched() -> CircuitBoard {
        board(&[("C", "B"), ("B", "A")], &[("A", "B"), ("B", "C")])
    }

    #[test]
    fn matched_circuit_is_eulerian() {
        let board = matched();
        assert!(board.is_eulerian_circuit());
        assert_eq!(
            board.find_eulerian_path(),
            Some(vec!["C".to_string(), "B".to_string(), "C".to_string()])
        );
    }

    #[test]
    fn missing_closing_edge_is_not_eulerian() {
        let board = board(&[("C", "B"), ("B", "A")], &[("A", "B")]);
        assert!(!board.is_eulerian_circuit());
        assert!(board.eulerian_tour().is_none());
    }

    #[test]
    fn single_graph_is_not_eulerian() {
        let board = board(&[("C", "B"), ("B", "A")], &[]);
        assert!(!board.is_eulerian_circuit());
        assert!(board.find_eulerian_path().is_none());
    }

    #[test]
    fn open_circuit_needs_both_graphs() {
        assert!(!matched().is_open_circuit());
        assert!(board(&[("C", "B"), ("B", "A")], &[("A", "B")]).is_open_circuit());
        // One-sided boards are not circuits at all, open or closed.
        assert!(!board(&[("C", "B"), ("B", "A")], &[]).is_open_circuit());
        assert!(!board(&[], &[("A", "B")]).is_open_circuit());
    }

    #[test]
    fn isolated_perch_breaks_connectivity() {
        // C is never touched by a mover.
        let board = board(&[("B", "A")], &[("A", "B")]);
        assert!(!board.is_eulerian_circuit());
        assert!(board.eulerian_tour().is_none());
        assert!(board.find_eulerian_path().is_some());

        let mut two = CircuitBoard::new("two");
        two.add_perch(Perch::standard("A").expect("perch")).expect("add");
        two.add_perch(Perch::standard("B").expect("perch")).expect("add");
        two.add_mover("B", "A", Direction::Backward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
            .expect("backward");
        two.add_mover("A", "B", Direction::Forward, SourceKeys::WholeMapping, TargetKey::WholeMapping)
            .expect("forward");
        assert!(two.is_eulerian_circuit());
    }

    #[test]
    fn tour_uses_every_mover_once() {
        let tour = matched().eulerian_tour().expect("tour");

        let rendered: Vec<String> = tour.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "C -> B (backward)",
                "B -> A (backward)",
                "A -> B (forward)",
                "B -> C (forward)",
            ]
        );
    }
}
