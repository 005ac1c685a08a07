//! # CircuitCraft
//!
//! The command-line front end for the CircuitCraft dual-graph engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  apps/circuitcraft (THE BINARY)                 │
//! │                                                                 │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌──────────────┐   │
//! │  │   CLI       │    │   Definitions    │    │  Standard    │   │
//! │  │  (clap)     │    │   (toml)         │    │  operations  │   │
//! │  └──────┬──────┘    └────────┬─────────┘    └──────┬───────┘   │
//! │         │                    │                     │           │
//! │         └────────────────────┼─────────────────────┘           │
//! │                              ▼                                 │
//! │                   ┌───────────────────┐                        │
//! │                   │ circuitcraft-core │                        │
//! │                   │    (THE LOGIC)    │                        │
//! │                   └───────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! circuitcraft solve demos/minimal.toml
//! circuitcraft --json-mode status demos/minimal.toml
//! circuitcraft euler demos/three_perch.toml --verbose
//! circuitcraft save demos/minimal.toml -o minimal.circ --portable
//! circuitcraft inspect minimal.circ
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // CIRCUITCRAFT_LOG_FORMAT=json enables machine-parseable logs on stderr.
    let log_format =
        std::env::var("CIRCUITCRAFT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "circuitcraft=info,circuitcraft_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the CircuitCraft startup banner.
fn print_banner() {
    println!(
        r#"
   ___ _                _ _    ___           __ _
  / __(_)_ _ __ _  _ (_) |_ / __|_ _ __ _ / _| |_
 | (__| | '_/ _| || || |  _| (__| '_/ _` |  _|  _|
  \___|_|_| \__|\_,_||_|\__|\___|_| \__,_|_|  \__|

  Dual-Graph Circuit Engine v{}

  Backward solve • Forward simulate • Close the loop
"#,
        env!("CARGO_PKG_VERSION")
    );
}
