//! # circuitcraft-core
//!
//! The dual-graph circuit engine for CircuitCraft - THE LOGIC.
//!
//! A circuit board holds named **perches** (data containers with a fixed set
//! of slots) connected by **movers** (directed edges carrying a user comp).
//! Movers live in two acyclic graphs over the same perches:
//! - the **backward** graph, solved first, starting from terminal perches
//! - the **forward** graph, simulated second, starting from initial perches
//!
//! Together the two graphs may close into a single Eulerian circuit.
//!
//! ## Lifecycle
//!
//! create perches and movers -> finalize the model (maps become comps) ->
//! set boundary data -> solve. Readiness is tracked by flags that are always
//! derived from the board, never stored.
//!
//! ## Architectural Constraints
//!
//! - Orchestration only: all numerical work happens inside user comps
//! - Single-threaded and synchronous, NO async, NO network dependencies
//! - Deterministic: `BTreeMap` everywhere, `IndexMap` for perch insertion order

// =============================================================================
// MODULES
// =============================================================================

pub mod board;
pub mod config;
pub mod eulerian;
pub mod formats;
pub mod graph;
pub mod lifecycle;
pub mod mover;
pub mod perch;
pub mod primitives;
pub mod solver;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CircuitError, Direction, ErrorKind, MoverId, Slots, Value, slots};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use board::CircuitBoard;
pub use config::BoardConfig;
pub use eulerian::EulerStep;
pub use graph::MoverGraph;
pub use mover::{
    Comp, CompFactory, CompOutput, CompRef, CompSpec, Mover, MoverMap, SourceKeys, TargetKey,
    comp_fn,
};
pub use perch::Perch;
pub use solver::{SolveMode, SolveReport};
pub use workflow::{
    CircuitSpec, MoverSpec, Operation, PerchSpec, build_circuit, create_and_solve_circuit,
};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    PersistenceHeader, SerializableBoard, SerializableMover, board_from_bytes, board_to_bytes,
};

// =============================================================================
// RE-EXPORTS: Lifecycle (from lifecycle module)
// =============================================================================

pub use lifecycle::{BoardMetrics, LifecycleFlags, Stage};
