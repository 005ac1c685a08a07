//! # Circuit Board
//!
//! The container tying perches and the two mover graphs together.
//!
//! Perches are kept in insertion order; that order decides which chain runs
//! first during a solve and which terminal perch the Eulerian checks start
//! from. Solving lives in [`crate::solver`], readiness flags in
//! [`crate::lifecycle`].

use crate::{
    BoardConfig, CircuitError, CompFactory, CompRef, Direction, Mover, MoverGraph, MoverId,
    MoverMap, Perch, Slots, SourceKeys, TargetKey, Value,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Perches plus a backward and a forward mover graph.
#[derive(Debug, Clone)]
pub struct CircuitBoard {
    name: String,
    config: BoardConfig,
    pub(crate) perches: IndexMap<String, Perch>,
    pub(crate) backward: MoverGraph,
    pub(crate) forward: MoverGraph,
}

impl CircuitBoard {
    /// An empty board with the default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, BoardConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: BoardConfig) -> Self {
        Self {
            name: name.into(),
            config,
            perches: IndexMap::new(),
            backward: MoverGraph::new(Direction::Backward),
            forward: MoverGraph::new(Direction::Forward),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Slot holding the boundary value for `direction`.
    #[must_use]
    pub fn boundary_slot(&self, direction: Direction) -> &str {
        match direction {
            Direction::Backward => &self.config.backward_slot,
            Direction::Forward => &self.config.forward_slot,
        }
    }

    // =========================================================================
    // PERCHES
    // =========================================================================

    /// Add a perch. Perch names are unique within a board.
    pub fn add_perch(&mut self, mut perch: Perch) -> Result<(), CircuitError> {
        if self.perches.contains_key(perch.name()) {
            return Err(CircuitError::Structure(format!(
                "perch '{}' already exists",
                perch.name()
            )));
        }

        if self.config.permissive_updates {
            perch.set_permissive(true);
        }

        debug!(perch = perch.name(), "perch added");
        self.perches.insert(perch.name().to_string(), perch);
        Ok(())
    }

    /// Create and add a perch in one step.
    pub fn create_perch<I, S>(&mut self, name: &str, declared_slots: I) -> Result<(), CircuitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_perch(Perch::new(name, declared_slots)?)
    }

    #[must_use]
    pub fn perch(&self, name: &str) -> Option<&Perch> {
        self.perches.get(name)
    }

    /// Perches in insertion order.
    pub fn perches(&self) -> impl Iterator<Item = &Perch> {
        self.perches.values()
    }

    #[must_use]
    pub fn perch_count(&self) -> usize {
        self.perches.len()
    }

    fn perch_mut(&mut self, name: &str) -> Result<&mut Perch, CircuitError> {
        self.perches
            .get_mut(name)
            .ok_or_else(|| unknown_perch(name))
    }

    pub fn set_perch_data(
        &mut self,
        perch: &str,
        slot: &str,
        value: impl Into<Value>,
    ) -> Result<(), CircuitError> {
        self.perch_mut(perch)?.set_data(slot, value)
    }

    pub fn get_perch_data(&self, perch: &str, slot: &str) -> Result<Option<&Value>, CircuitError> {
        self.perches
            .get(perch)
            .ok_or_else(|| unknown_perch(perch))?
            .get_data(slot)
    }

    /// Merge several slots into one perch.
    pub fn update_perch_data(&mut self, perch: &str, partial: &Slots) -> Result<(), CircuitError> {
        self.perch_mut(perch)?.update_data(partial)
    }

    /// Unset every slot of every perch.
    pub fn reset_data(&mut self) {
        for perch in self.perches.values_mut() {
            perch.clear_data();
        }
    }

    // =========================================================================
    // MOVERS
    // =========================================================================

    /// Add a mover between two existing perches.
    ///
    /// `Structure` if a perch is unknown, the mover exists, or a degree limit
    /// would be exceeded; `Cycle` if it would close a cycle. The board is
    /// unchanged on failure.
    pub fn add_mover(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
        source_keys: SourceKeys,
        target_key: TargetKey,
    ) -> Result<(), CircuitError> {
        for perch in [source, target] {
            if !self.perches.contains_key(perch) {
                return Err(unknown_perch(perch));
            }
        }

        let mover = Mover::new(
            MoverId::new(source, target, direction),
            source_keys,
            target_key,
        );
        self.graph_mut(direction).insert(mover)?;

        debug!(source, target, %direction, "mover added");
        Ok(())
    }

    #[must_use]
    pub fn graph(&self, direction: Direction) -> &MoverGraph {
        match direction {
            Direction::Backward => &self.backward,
            Direction::Forward => &self.forward,
        }
    }

    fn graph_mut(&mut self, direction: Direction) -> &mut MoverGraph {
        match direction {
            Direction::Backward => &mut self.backward,
            Direction::Forward => &mut self.forward,
        }
    }

    #[must_use]
    pub fn mover(&self, source: &str, target: &str, direction: Direction) -> Option<&Mover> {
        self.graph(direction).get(source, target)
    }

    fn mover_mut(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
    ) -> Result<&mut Mover, CircuitError> {
        self.graph_mut(direction)
            .get_mut(source, target)
            .ok_or_else(|| unknown_mover(&MoverId::new(source, target, direction)))
    }

    /// Backward movers first, then forward movers.
    pub fn movers(&self) -> impl Iterator<Item = &Mover> {
        self.backward.movers().chain(self.forward.movers())
    }

    #[must_use]
    pub fn mover_count(&self) -> usize {
        self.backward.len() + self.forward.len()
    }

    pub fn set_mover_map(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
        map: MoverMap,
    ) -> Result<(), CircuitError> {
        self.mover_mut(source, target, direction)?.set_map(map);
        Ok(())
    }

    pub fn set_mover_comp(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
        comp: CompRef,
    ) -> Result<(), CircuitError> {
        self.mover_mut(source, target, direction)?.set_comp(comp);
        Ok(())
    }

    pub fn set_mover_parameters(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
        parameters: BTreeMap<String, Value>,
    ) -> Result<(), CircuitError> {
        self.mover_mut(source, target, direction)?
            .set_parameters(parameters);
        Ok(())
    }

    pub fn set_mover_numerical_hyperparameters(
        &mut self,
        source: &str,
        target: &str,
        direction: Direction,
        hyperparameters: BTreeMap<String, Value>,
    ) -> Result<(), CircuitError> {
        self.mover_mut(source, target, direction)?
            .set_numerical_hyperparameters(hyperparameters);
        Ok(())
    }

    // =========================================================================
    // BOUNDARY PERCHES
    // =========================================================================

    /// Perches of the backward graph no backward mover writes into, in perch
    /// order. Their backward slot must be supplied before solving.
    #[must_use]
    pub fn backward_terminal_perches(&self) -> Vec<&str> {
        self.boundary_perches(Direction::Backward)
    }

    /// Perches of the forward graph no forward mover writes into, in perch
    /// order. Their forward slot must be supplied before simulating.
    #[must_use]
    pub fn forward_initial_perches(&self) -> Vec<&str> {
        self.boundary_perches(Direction::Forward)
    }

    pub(crate) fn boundary_perches(&self, direction: Direction) -> Vec<&str> {
        let heads = self.graph(direction).heads();
        self.perches
            .keys()
            .map(String::as_str)
            .filter(|name| heads.contains(name))
            .collect()
    }

    // =========================================================================
    // MODEL FINALIZATION
    // =========================================================================

    /// Build comps from maps for every mover that has a map but no comp.
    ///
    /// No validation; movers without a map are skipped.
    pub fn build_comps(&mut self, factory: &dyn CompFactory) -> Result<usize, CircuitError> {
        let mut built = 0usize;
        for graph in [&mut self.backward, &mut self.forward] {
            for mover in graph.movers_mut() {
                if mover.has_map() && !mover.has_comp() {
                    mover.build_comp_from_map(factory)?;
                    built += 1;
                }
            }
        }
        debug!(board = %self.name, built, "comps built from maps");
        Ok(built)
    }

    /// Complete the model so the board can be solved.
    ///
    /// Builds missing comps when a factory is given, then checks that the
    /// board has movers, every mover has a comp, and every mover's key
    /// selection fits its perches. Fails with `Configuration` naming the
    /// first offending mover.
    pub fn finalize_model(&mut self, factory: Option<&dyn CompFactory>) -> Result<(), CircuitError> {
        if self.mover_count() == 0 {
            return Err(CircuitError::Configuration(format!(
                "board '{}' has no movers",
                self.name
            )));
        }

        if let Some(factory) = factory {
            self.build_comps(factory)?;
        }

        for mover in self.movers() {
            if !mover.has_comp() {
                return Err(CircuitError::Configuration(format!(
                    "mover {} has no comp",
                    mover.id()
                )));
            }

            let source = self
                .perches
                .get(mover.source())
                .ok_or_else(|| unknown_perch(mover.source()))?;
            let target = self
                .perches
                .get(mover.target())
                .ok_or_else(|| unknown_perch(mover.target()))?;
            mover.validate_keys(source, target)?;
        }

        for direction in [Direction::Backward, Direction::Forward] {
            let slot = self.boundary_slot(direction);
            let missing = self
                .boundary_perches(direction)
                .into_iter()
                .find(|name| self.perches.get(*name).is_some_and(|p| !p.has_slot(slot)));
            if let Some(name) = missing {
                return Err(CircuitError::Configuration(format!(
                    "{} boundary perch '{}' does not declare slot '{}'",
                    direction, name, slot
                )));
            }
        }

        if self.is_open_circuit() {
            warn!(
                board = %self.name,
                "movers do not close into an Eulerian circuit; a full solve may give inconsistent results"
            );
        }

        debug!(board = %self.name, movers = self.mover_count(), "model finalized");
        Ok(())
    }

    // =========================================================================
    // PORTABILITY
    // =========================================================================

    /// A structurally identical board with every slot unset.
    ///
    /// Maps, comps and parameters are kept, so the copy can be
    /// reinitialized and solved again.
    #[must_use]
    pub fn to_portable(&self) -> Self {
        let mut portable = self.clone();
        portable.reset_data();
        portable
    }
}

impl fmt::Display for CircuitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CircuitBoard({})", self.name)?;
        writeln!(f, "  perches:")?;
        for perch in self.perches.values() {
            writeln!(f, "    {}", perch)?;
        }
        writeln!(f, "  movers:")?;
        for mover in self.movers() {
            writeln!(f, "    {}", mover)?;
        }
        Ok(())
    }
}

fn unknown_perch(name: &str) -> CircuitError {
    CircuitError::Structure(format!("perch '{}' does not exist", name))
}

pub(crate) fn unknown_mover(id: &MoverId) -> CircuitError {
    CircuitError::Structure(format!("mover {} does not exist", id))
}

// =============================================================================
// TESTS
// =============================================================================
