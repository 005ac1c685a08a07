//! # CircuitCraft CLI Module
//!
//! This module implements the CLI interface for CircuitCraft.
//!
//! ## Available Commands
//!
//! - `solve` - Build a circuit from a definition and solve it
//! - `status` - Show lifecycle flags, stage and metrics
//! - `euler` - Check whether the movers close into an Eulerian circuit
//! - `save` - Persist a solved or portable board
//! - `inspect` - Show a persisted board
//! - `ops` - List the standard operations

mod commands;

use circuitcraft_core::{CircuitError, SolveMode};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// CircuitCraft - dual-graph circuit engine
///
/// Perches hold data, movers carry operations. Backward movers are solved
/// first, forward movers simulated second.
#[derive(Parser, Debug)]
#[command(name = "circuitcraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a circuit from a TOML definition and solve it
    Solve {
        /// Path to the circuit definition
        definition: PathBuf,

        /// Phases to run (full, backward, forward)
        #[arg(short, long, default_value = "full")]
        mode: SolveMode,
    },

    /// Show lifecycle flags, stage and metrics of a definition
    Status {
        /// Path to the circuit definition
        definition: PathBuf,
    },

    /// Check whether backward and forward movers form an Eulerian circuit
    Euler {
        /// Path to the circuit definition
        definition: PathBuf,
    },

    /// Build and solve a board from a definition, then persist it
    Save {
        /// Path to the circuit definition
        definition: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Save an unsolved copy with every slot unset instead
        #[arg(short, long)]
        portable: bool,
    },

    /// Show a persisted board
    Inspect {
        /// Path to a file written by `save`
        file: PathBuf,
    },

    /// List the standard operations usable in definitions
    Ops,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CircuitError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Solve { definition, mode }) => {
            cmd_solve(&definition, mode, json_mode, cli.verbose)
        }
        Some(Commands::Status { definition }) => cmd_status(&definition, json_mode),
        Some(Commands::Euler { definition }) => cmd_euler(&definition, json_mode, cli.verbose),
        Some(Commands::Save {
            definition,
            output,
            portable,
        }) => cmd_save(&definition, &output, portable),
        Some(Commands::Inspect { file }) => cmd_inspect(&file, json_mode),
        Some(Commands::Ops) => cmd_ops(json_mode),
        None => {
            println!("No command given. Run `circuitcraft --help` for usage.");
            Ok(())
        }
    }
}
