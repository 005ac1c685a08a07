//! # Mover Graph
//!
//! Storage for the movers of one direction.
//!
//! Each perch has at most one outgoing and one incoming mover per direction,
//! and the graph is kept acyclic, so every component is a simple chain.
//! Movers are keyed by their source perch; a reverse index maps each target
//! to its source. All data structures use `BTreeMap` for deterministic
//! ordering. No `HashMap` allowed.

use crate::{CircuitError, Direction, Mover, MoverId};
use std::collections::{BTreeMap, BTreeSet};

/// The movers of one direction, in data-flow orientation (source -> target).
#[derive(Debug, Clone)]
pub struct MoverGraph {
    direction: Direction,

    /// Outgoing edges: source -> mover
    movers: BTreeMap<String, Mover>,

    /// Reverse lookup: target -> source
    incoming: BTreeMap<String, String>,
}

impl MoverGraph {
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            movers: BTreeMap::new(),
            incoming: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of movers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }

    /// Movers ordered by source perch name.
    pub fn movers(&self) -> impl Iterator<Item = &Mover> {
        self.movers.values()
    }

    pub(crate) fn movers_mut(&mut self) -> impl Iterator<Item = &mut Mover> {
        self.movers.values_mut()
    }

    #[must_use]
    pub fn get(&self, source: &str, target: &str) -> Option<&Mover> {
        self.movers.get(source).filter(|m| m.target() == target)
    }

    pub fn get_mut(&mut self, source: &str, target: &str) -> Option<&mut Mover> {
        self.movers.get_mut(source).filter(|m| m.target() == target)
    }

    /// The mover reading from `perch`, if any.
    #[must_use]
    pub fn outgoing(&self, perch: &str) -> Option<&Mover> {
        self.movers.get(perch)
    }

    /// The mover writing into `perch`, if any.
    #[must_use]
    pub fn incoming(&self, perch: &str) -> Option<&Mover> {
        self.incoming
            .get(perch)
            .and_then(|source| self.movers.get(source))
    }

    #[must_use]
    pub fn successor(&self, perch: &str) -> Option<&str> {
        self.movers.get(perch).map(Mover::target)
    }

    #[must_use]
    pub fn predecessor(&self, perch: &str) -> Option<&str> {
        self.incoming.get(perch).map(String::as_str)
    }

    /// Every perch touched by a mover of this graph.
    #[must_use]
    pub fn perches(&self) -> BTreeSet<&str> {
        self.movers
            .keys()
            .chain(self.incoming.keys())
            .map(String::as_str)
            .collect()
    }

    /// Perches no mover writes into: where data enters each chain.
    #[must_use]
    pub fn heads(&self) -> BTreeSet<&str> {
        self.movers
            .keys()
            .filter(|p| !self.incoming.contains_key(*p))
            .map(String::as_str)
            .collect()
    }

    /// True if `to` is reachable from `from` following movers (zero steps included).
    #[must_use]
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        self.path(from, to).is_some()
    }

    /// The perch sequence from `from` to `to`, both included.
    ///
    /// Walks at most `len()` edges, so the search is bounded even if the
    /// graph were corrupted into a cycle.
    #[must_use]
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut path = vec![from.to_string()];
        let mut current = from;

        for _ in 0..=self.movers.len() {
            if current == to {
                return Some(path);
            }
            current = self.successor(current)?;
            path.push(current.to_string());
        }

        None
    }

    /// Perches reachable from `from` in chain order, excluding `from`.
    #[must_use]
    pub fn reachable(&self, from: &str) -> Vec<String> {
        let mut reached = Vec::new();
        let mut current = from;

        while reached.len() < self.movers.len() {
            match self.successor(current) {
                Some(next) if next != from => {
                    reached.push(next.to_string());
                    current = next;
                }
                _ => break,
            }
        }

        reached
    }

    /// Movers of the chain starting at `head`, in execution order.
    #[must_use]
    pub fn chain_from(&self, head: &str) -> Vec<&Mover> {
        let mut chain = Vec::new();
        let mut current = head;

        while chain.len() < self.movers.len() {
            match self.movers.get(current) {
                Some(mover) => {
                    chain.push(mover);
                    current = mover.target();
                }
                None => break,
            }
        }

        chain
    }

    /// Check whether `source -> target` may be inserted.
    ///
    /// `Structure` for a duplicate or a degree violation, `Cycle` if
    /// `target` already reaches `source` (self-loops included).
    pub fn check_insert(&self, source: &str, target: &str) -> Result<(), CircuitError> {
        let id = MoverId::new(source, target, self.direction);

        if self.get(source, target).is_some() {
            return Err(CircuitError::Structure(format!("mover {} already exists", id)));
        }

        if let Some(existing) = self.outgoing(source) {
            return Err(CircuitError::Structure(format!(
                "perch '{}' already has an outgoing {} mover to '{}'",
                source,
                self.direction,
                existing.target()
            )));
        }

        if let Some(existing) = self.predecessor(target) {
            return Err(CircuitError::Structure(format!(
                "perch '{}' already has an incoming {} mover from '{}'",
                target, self.direction, existing
            )));
        }

        if self.reaches(target, source) {
            return Err(CircuitError::Cycle(id));
        }

        Ok(())
    }

    /// Insert a mover. The graph is unchanged if this fails.
    pub fn insert(&mut self, mover: Mover) -> Result<(), CircuitError> {
        if mover.direction() != self.direction {
            return Err(CircuitError::Structure(format!(
                "mover {} does not belong in the {} graph",
                mover.id(),
                self.direction
            )));
        }

        self.check_insert(mover.source(), mover.target())?;

        self.incoming
            .insert(mover.target().to_string(), mover.source().to_string());
        self.movers.insert(mover.source().to_string(), mover);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, SourceKeys, TargetKey};

    fn mover(source: &str, target: &str) -> Mover {
        Mover::new(
            MoverId::new(source, target, Direction::Forward),
            SourceKeys::WholeMapping,
            TargetKey::WholeMapping,
        )
    }

    fn chain(edges: &[(&str, &str)]) -> MoverGraph {
        let mut graph = MoverGraph::new(Direction::Forward);
        for (s, t) in edges {
            graph.insert(mover(s, t)).expect("insert");
        }
        graph
    }

    #[test]
    fn insert_and_lookup() {
        let graph = chain(&[("a", "b")]);

        assert_eq!(graph.len(), 1);
        assert!(graph.get("a", "b").is_some());
        assert!(graph.get("b", "a").is_none());
        assert_eq!(graph.successor("a"), Some("b"));
        assert_eq!(graph.predecessor("b"), Some("a"));
        assert!(graph.perches().contains("b"));
        assert!(!graph.perches().contains("c"));
    }

    #[test]
    fn duplicate_is_structure_error() {
        let mut graph = chain(&[("a", "b")]);
        let err = graph.insert(mover("a", "b")).expect_err("duplicate");
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn degree_limits_are_enforced() {
        let mut graph = chain(&[("a", "b")]);

        let err = graph.insert(mover("a", "c")).expect_err("second outgoing");
        assert_eq!(err.kind(), ErrorKind::Structure);

        let err = graph.insert(mover("c", "b")).expect_err("second incoming");
        assert_eq!(err.kind(), ErrorKind::Structure);

        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn cycle_is_rejected_and_graph_unchanged() {
        let mut graph = chain(&[("a", "b"), ("b", "c")]);

        let err = graph.insert(mover("c", "a")).expect_err("cycle");
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert_eq!(graph.len(), 2);
        assert!(graph.incoming("a").is_none());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = MoverGraph::new(Direction::Forward);
        let err = graph.insert(mover("a", "a")).expect_err("self loop");
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(graph.is_empty());
    }

    #[test]
    fn wrong_direction_is_rejected() {
        let mut graph = MoverGraph::new(Direction::Backward);
        let err = graph.insert(mover("a", "b")).expect_err("forward mover");
        assert_eq!(err.kind(), ErrorKind::Structure);
    }

    #[test]
    fn heads_and_chains() {
        let graph = chain(&[("b", "c"), ("a", "b"), ("x", "y")]);

        assert_eq!(graph.heads().into_iter().collect::<Vec<_>>(), vec!["a", "x"]);

        let order: Vec<_> = graph.chain_from("a").iter().map(|m| m.target()).collect();
        assert_eq!(order, vec!["b", "c"]);
    }

    #[test]
    fn path_and_reachable() {
        let graph = chain(&[("a", "b"), ("b", "c")]);

        assert_eq!(
            graph.path("a", "c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(graph.path("c", "a"), None);
        assert_eq!(graph.path("b", "b"), Some(vec!["b".to_string()]));
        assert_eq!(graph.reachable("a"), vec!["b".to_string(), "c".to_string()]);
        assert!(graph.reachable("c").is_empty());
    }
}
