//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the circuit engine:
//! - Opaque perch data (`Value`, `Slots`)
//! - Mover orientation and identity (`Direction`, `MoverId`)
//! - Error types (`CircuitError`, `ErrorKind`)
//!
//! ## Determinism Guarantees
//!
//! Mappings use `BTreeMap` so that comp inputs, comp outputs and serialized
//! perch data always iterate in the same order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// VALUES
// =============================================================================

/// An opaque value stored in a perch slot.
///
/// The engine never interprets values; it only moves them between perches
/// and user comps. An unset slot is `None`, never a `Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Numeric view of the value. Integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{:?}", v),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Slot name -> optional value.
///
/// Used for perch data as well as for comp inputs and outputs.
pub type Slots = BTreeMap<String, Option<Value>>;

/// Build a [`Slots`] mapping from `(slot, value)` pairs, every slot set.
pub fn slots<I, K, V>(pairs: I) -> Slots
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Some(v.into())))
        .collect()
}

// =============================================================================
// DIRECTION & MOVER IDENTITY
// =============================================================================

/// Which of the two subgraphs a mover belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Backward solving (e.g. Coleman-style operators), terminal perch inward.
    Backward,
    /// Forward simulation (e.g. push-forward operators), initial perch outward.
    Forward,
}

impl Direction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Backward => "backward",
            Direction::Forward => "forward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backward" => Ok(Direction::Backward),
            "forward" => Ok(Direction::Forward),
            other => Err(CircuitError::Validation(format!(
                "unrecognized direction '{}': use backward or forward",
                other
            ))),
        }
    }
}

/// Identity of a mover: `(source, target, direction)`.
///
/// The direction is part of the identity because a backward and a forward
/// mover may connect the same two perches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MoverId {
    pub source: String,
    pub target: String,
    pub direction: Direction,
}

impl MoverId {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, direction: Direction) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            direction,
        }
    }
}

impl fmt::Display for MoverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.direction)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Structure,
    Cycle,
    Configuration,
    NotReady,
    NotSolvable,
    DataKey,
    Comp,
    Serialization,
}

/// Errors that can occur while building, finalizing or solving a circuit.
///
/// - No silent failures
/// - Use `Result<T, CircuitError>` for fallible operations
/// - The engine never panics; a failing comp aborts the current solve
#[derive(Debug, Error)]
pub enum CircuitError {
    /// Malformed construction arguments (empty name, empty slot set, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal graph mutation (unknown perch, duplicate mover, degree limit).
    #[error("Structure error: {0}")]
    Structure(String),

    /// Inserting the mover would close a cycle in its direction's graph.
    #[error("Cycle error: {0} would close a cycle")]
    Cycle(MoverId),

    /// Finalization failed (missing comp, factory failure, bad key selection).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The mover has no comp to execute.
    #[error("Mover not ready: {0} has no comp")]
    NotReady(MoverId),

    /// `solve` was called before the boundary data and model were in place.
    #[error("Circuit not solvable: {0}")]
    NotSolvable(String),

    /// Access to a slot the perch does not declare.
    #[error("Slot '{slot}' is not declared on perch '{perch}'")]
    UndeclaredSlot { perch: String, slot: String },

    /// A comp result lacks the slot the mover was configured to write.
    #[error("Result of {mover} has no '{slot}' entry")]
    MissingResultKey { mover: MoverId, slot: String },

    /// A comp returned a bare scalar where a mapping was required.
    #[error("Result of {0} is a scalar but a mapping was required")]
    UnexpectedScalar(MoverId),

    /// A user comp reported a failure.
    #[error("Comp failed: {0}")]
    Comp(String),

    /// A mover failed during `solve`; wraps the originating error.
    #[error("Mover {mover} failed: {source}")]
    MoverFailed {
        mover: MoverId,
        #[source]
        source: Box<CircuitError>,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl CircuitError {
    /// Convenience constructor for user comps.
    pub fn comp(message: impl Into<String>) -> Self {
        CircuitError::Comp(message.into())
    }

    /// The semantic category of this error.
    ///
    /// `MoverFailed` reports the category of the error it wraps.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CircuitError::Validation(_) => ErrorKind::Validation,
            CircuitError::Structure(_) => ErrorKind::Structure,
            CircuitError::Cycle(_) => ErrorKind::Cycle,
            CircuitError::Configuration(_) => ErrorKind::Configuration,
            CircuitError::NotReady(_) => ErrorKind::NotReady,
            CircuitError::NotSolvable(_) => ErrorKind::NotSolvable,
            CircuitError::UndeclaredSlot { .. }
            | CircuitError::MissingResultKey { .. }
            | CircuitError::UnexpectedScalar(_) => ErrorKind::DataKey,
            CircuitError::Comp(_) => ErrorKind::Comp,
            CircuitError::MoverFailed { source, .. } => source.kind(),
            CircuitError::Serialization(_) | CircuitError::Io(_) => ErrorKind::Serialization,
        }
    }

    /// The mover a `solve` failure originated from, if any.
    #[must_use]
    pub fn failed_mover(&self) -> Option<&MoverId> {
        match self {
            CircuitError::MoverFailed { mover, .. } => Some(mover),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
