//! # circuitcraft
//!
//! Application layer for the CircuitCraft engine: TOML circuit definitions,
//! the standard comp factory and JSON rendering shared by the CLI.

pub mod definition;
pub mod ops;
pub mod output;

pub use definition::CircuitDefinition;
pub use ops::StandardFactory;
