//! # Formats Module
//!
//! The serializable snapshot of a board and its binary persistence format.
//!
//! Comps are code and cannot be stored. A snapshot keeps each mover's map,
//! parameters and hyperparameters so that a [`crate::CompFactory`] can rebuild
//! the comps on load.

mod persistence;

pub use persistence::{PersistenceHeader, board_from_bytes, board_to_bytes};

use crate::{
    BoardConfig, CircuitBoard, CircuitError, CompFactory, MoverId, MoverMap, Perch, SourceKeys,
    TargetKey, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mover without its comp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableMover {
    pub id: MoverId,
    pub source_keys: SourceKeys,
    pub target_key: TargetKey,
    pub map: Option<MoverMap>,
    pub parameters: BTreeMap<String, Value>,
    pub numerical_hyperparameters: BTreeMap<String, Value>,
}

/// Everything about a board except its comps.
///
/// Perches are stored in insertion order, movers backward first and then
/// forward, each ordered by source perch. Two equal boards therefore
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableBoard {
    pub name: String,
    pub config: BoardConfig,
    pub perches: Vec<Perch>,
    pub movers: Vec<SerializableMover>,
}

impl TryFrom<&CircuitBoard> for SerializableBoard {
    type Error = CircuitError;

    /// Fails with `Configuration` if a mover has a comp but no map, since
    /// that comp could not be rebuilt.
    fn try_from(board: &CircuitBoard) -> Result<Self, Self::Error> {
        let movers = board
            .movers()
            .map(|mover| {
                if mover.has_comp() && !mover.has_map() {
                    return Err(CircuitError::Configuration(format!(
                        "mover {} has a comp but no map; it cannot be persisted",
                        mover.id()
                    )));
                }
                Ok(SerializableMover {
                    id: mover.id().clone(),
                    source_keys: mover.source_keys().clone(),
                    target_key: mover.target_key().clone(),
                    map: mover.map().cloned(),
                    parameters: mover.parameters().clone(),
                    numerical_hyperparameters: mover.numerical_hyperparameters().clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: board.name().to_string(),
            config: board.config().clone(),
            perches: board.perches().cloned().collect(),
            movers,
        })
    }
}

impl SerializableBoard {
    /// Rebuild a board.
    ///
    /// Perches are rebuilt through `Perch::new` and structure is re-validated
    /// through the normal `add_perch`/`add_mover` path. With a factory, comps are rebuilt from maps; without one, movers
    /// come back without comps.
    pub fn into_board(self, factory: Option<&dyn CompFactory>) -> Result<CircuitBoard, CircuitError> {
        let mut board = CircuitBoard::with_config(self.name, self.config);

        for stored in self.perches {
            let mut perch = Perch::new(stored.name(), stored.declared_slots())?;
            for (slot, value) in stored.data() {
                perch.write_slot(slot, value.clone())?;
            }
            if stored.is_permissive() {
                perch = perch.permissive();
            }
            board.add_perch(perch)?;
        }

        for mover in self.movers {
            let MoverId {
                source,
                target,
                direction,
            } = mover.id;
            board.add_mover(&source, &target, direction, mover.source_keys, mover.target_key)?;
            if let Some(map) = mover.map {
                board.set_mover_map(&source, &target, direction, map)?;
            }
            board.set_mover_parameters(&source, &target, direction, mover.parameters)?;
            board.set_mover_numerical_hyperparameters(
                &source,
                &target,
                direction,
                mover.numerical_hyperparameters,
            )?;
        }

        if let Some(factory) = factory {
            board.build_comps(factory)?;
        }

        Ok(board)
    }
}
