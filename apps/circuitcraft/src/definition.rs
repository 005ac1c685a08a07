//! # Circuit Definitions
//!
//! TOML description of a circuit, turned into a [`CircuitSpec`] for the
//! quick workflow.
//!
//! ```toml
//! [board]
//! name = "minimal"
//!
//! [[perch]]
//! id = "A"
//!
//! [[perch]]
//! id = "B"
//! slots = ["up", "down"]
//!
//! [[mover]]
//! source = "B"
//! target = "A"
//! direction = "backward"
//! source_keys = ["up"]
//! target_key = "up"
//! op = "square"
//!
//! [initial.B]
//! up = 4.0
//! ```
//!
//! Omitting `source_keys` or `target_key` selects the whole mapping.

use circuitcraft_core::{
    BoardConfig, CircuitError, CircuitSpec, Direction, MoverMap, MoverSpec, Operation, PerchSpec,
    Slots, SourceKeys, TargetKey, Value,
    primitives::{DOWN_SLOT, UP_SLOT},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Maximum definition file size (1 MB).
const MAX_DEFINITION_FILE_SIZE: u64 = 1024 * 1024;

/// A value as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueDef {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ValueDef>),
    Map(BTreeMap<String, ValueDef>),
}

impl From<ValueDef> for Value {
    fn from(def: ValueDef) -> Self {
        match def {
            ValueDef::Bool(v) => Value::Bool(v),
            ValueDef::Int(v) => Value::Int(v),
            ValueDef::Float(v) => Value::Float(v),
            ValueDef::Text(v) => Value::Text(v),
            ValueDef::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            ValueDef::Map(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

fn convert(values: BTreeMap<String, ValueDef>) -> BTreeMap<String, Value> {
    values.into_iter().map(|(k, v)| (k, v.into())).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardSection {
    pub name: String,
    #[serde(default)]
    pub backward_slot: Option<String>,
    #[serde(default)]
    pub forward_slot: Option<String>,
    #[serde(default)]
    pub permissive: bool,
}

fn default_slots() -> Vec<String> {
    vec![UP_SLOT.to_string(), DOWN_SLOT.to_string()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerchDef {
    pub id: String,
    #[serde(default = "default_slots")]
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoverDef {
    pub source: String,
    pub target: String,
    pub direction: Direction,
    #[serde(default)]
    pub source_keys: Option<Vec<String>>,
    #[serde(default)]
    pub target_key: Option<String>,
    /// Operation kind understood by the comp factory.
    pub op: String,
    /// Operation arguments, stored in the mover map.
    #[serde(default)]
    pub params: BTreeMap<String, ValueDef>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ValueDef>,
    #[serde(default)]
    pub hyperparameters: BTreeMap<String, ValueDef>,
}

/// A full circuit definition file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitDefinition {
    pub board: BoardSection,
    #[serde(default, rename = "perch")]
    pub perches: Vec<PerchDef>,
    #[serde(default, rename = "mover")]
    pub movers: Vec<MoverDef>,
    /// Perch id -> slot -> value.
    #[serde(default)]
    pub initial: BTreeMap<String, BTreeMap<String, ValueDef>>,
}

impl CircuitDefinition {
    /// Parse a definition from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, CircuitError> {
        toml::from_str(text)
            .map_err(|e| CircuitError::Configuration(format!("invalid circuit definition: {}", e)))
    }

    /// Read and parse a definition file.
    pub fn from_path(path: &Path) -> Result<Self, CircuitError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| CircuitError::Io(format!("{}: {}", path.display(), e)))?;
        if metadata.len() > MAX_DEFINITION_FILE_SIZE {
            return Err(CircuitError::Configuration(format!(
                "definition {} is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_DEFINITION_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| CircuitError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Convert into a quick-workflow spec. Every mover becomes a map.
    #[must_use]
    pub fn into_spec(self) -> CircuitSpec {
        let defaults = BoardConfig::default();
        let config = BoardConfig {
            backward_slot: self.board.backward_slot.unwrap_or(defaults.backward_slot),
            forward_slot: self.board.forward_slot.unwrap_or(defaults.forward_slot),
            permissive_updates: self.board.permissive,
        };

        let perches = self
            .perches
            .into_iter()
            .map(|p| PerchSpec::new(p.id, p.slots))
            .collect();

        let movers = self
            .movers
            .into_iter()
            .map(|m| {
                let source_keys = m
                    .source_keys
                    .map_or(SourceKeys::WholeMapping, SourceKeys::Selected);
                let target_key = m.target_key.map_or(TargetKey::WholeMapping, TargetKey::Slot);
                let map = MoverMap {
                    kind: m.op,
                    params: convert(m.params),
                };

                let mut spec = MoverSpec::new(m.source, m.target, m.direction, Operation::Map(map))
                    .keys(source_keys, target_key);
                spec.parameters = convert(m.parameters);
                spec.numerical_hyperparameters = convert(m.hyperparameters);
                spec
            })
            .collect();

        let initial_values = self
            .initial
            .into_iter()
            .map(|(perch, values)| {
                let slots: Slots = values
                    .into_iter()
                    .map(|(k, v)| (k, Some(v.into())))
                    .collect();
                (perch, slots)
            })
            .collect();

        CircuitSpec {
            name: self.board.name,
            config,
            perches,
            movers,
            initial_values,
        }
    }
}
