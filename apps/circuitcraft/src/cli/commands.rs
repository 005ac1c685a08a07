//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use circuitcraft::definition::CircuitDefinition;
use circuitcraft::ops::{OPERATIONS, StandardFactory};
use circuitcraft::output::{perches_json, report_json, status_json, to_pretty};
use circuitcraft_core::{
    BoardMetrics, CircuitBoard, CircuitError, LifecycleFlags, SolveMode, Stage, build_circuit,
    create_and_solve_circuit,
    primitives::MAX_PERSISTED_FILE_SIZE,
};
use std::path::{Path, PathBuf};

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CircuitError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CircuitError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CircuitError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CircuitError> {
    let canonical = path.canonicalize().map_err(|e| {
        CircuitError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CircuitError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, CircuitError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CircuitError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CircuitError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CircuitError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Parse a definition file and build its board, ready to solve.
fn load_definition(path: &Path) -> Result<CircuitBoard, CircuitError> {
    let validated = validate_file_path(path)?;
    let spec = CircuitDefinition::from_path(&validated)?.into_spec();
    build_circuit(spec, Some(&StandardFactory))
}

fn print_json(value: &serde_json::Value) -> Result<(), CircuitError> {
    println!("{}", to_pretty(value)?);
    Ok(())
}

fn print_perch_data(board: &CircuitBoard) {
    println!("Perch Data:");
    for perch in board.perches() {
        let cells: Vec<String> = perch
            .data()
            .iter()
            .map(|(slot, value)| match value {
                Some(v) => format!("{}={}", slot, v),
                None => format!("{}=-", slot),
            })
            .collect();
        println!("  {:<12} {}", perch.name(), cells.join(", "));
    }
}

// =============================================================================
// SOLVE COMMAND
// =============================================================================

/// Build a circuit from a definition, solve it and print the perch data.
pub fn cmd_solve(
    definition: &Path,
    mode: SolveMode,
    json_mode: bool,
    verbose: bool,
) -> Result<(), CircuitError> {
    let validated = validate_file_path(definition)?;
    let spec = CircuitDefinition::from_path(&validated)?.into_spec();

    tracing::info!("Solving {:?} (mode: {})", definition, mode);
    let (board, report) = create_and_solve_circuit(spec, Some(&StandardFactory), mode)?;

    if json_mode {
        print_json(&serde_json::json!({
            "board": board.name(),
            "mode": mode.as_str(),
            "stage": Stage::of(&board).name(),
            "report": report_json(&report),
            "perches": perches_json(&board),
        }))?;
        return Ok(());
    }

    println!("CircuitCraft Solve: {}", board.name());
    println!("==================");
    println!("Mode:            {}", mode);
    println!("Backward movers: {}", report.backward.len());
    println!("Forward movers:  {}", report.forward.len());
    println!("Stage:           {}", Stage::of(&board));
    println!();

    if verbose {
        println!("Execution Order:");
        for id in report.backward.iter().chain(&report.forward) {
            println!("  {}", id);
        }
        println!();
    }

    print_perch_data(&board);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show lifecycle flags, stage and metrics.
pub fn cmd_status(definition: &Path, json_mode: bool) -> Result<(), CircuitError> {
    let board = load_definition(definition)?;
    print_status(&board, json_mode)
}

fn print_status(board: &CircuitBoard, json_mode: bool) -> Result<(), CircuitError> {
    if json_mode {
        return print_json(&status_json(board));
    }

    let stage = Stage::of(board);
    let flags = LifecycleFlags::of(board);
    let metrics = BoardMetrics::of(board);

    println!("CircuitCraft Board Status: {}", board.name());
    println!("==========================");
    println!("Stage: {}", stage);
    if stage.is_terminal() {
        println!("Terminal stage reached");
    } else if let Some(next) = stage.next() {
        println!("Next:  {} ({})", next, stage.hint());
    }
    println!();
    println!("Perches:          {}", metrics.perch_count);
    println!("Backward Movers:  {}", metrics.backward_movers);
    println!("Forward Movers:   {}", metrics.forward_movers);
    println!("Populated:        {}", metrics.populated_perches);
    println!("Movers with Comp: {}", metrics.movers_with_comp);
    println!("Longest Chain:    {}", metrics.longest_chain);
    println!();
    println!("Backward Terminal: [{}]", board.backward_terminal_perches().join(", "));
    println!("Forward Initial:   [{}]", board.forward_initial_perches().join(", "));
    println!();
    println!("Flags:");
    for (name, value) in flags.entries() {
        println!("  {:<22} {}", name, value);
    }
    Ok(())
}

// =============================================================================
// EULER COMMAND
// =============================================================================

/// Check whether the movers close into an Eulerian circuit.
pub fn cmd_euler(definition: &Path, json_mode: bool, verbose: bool) -> Result<(), CircuitError> {
    let board = load_definition(definition)?;

    let is_circuit = board.is_eulerian_circuit();
    let path = board.find_eulerian_path();
    let tour = board.eulerian_tour();

    if json_mode {
        print_json(&serde_json::json!({
            "board": board.name(),
            "is_eulerian_circuit": is_circuit,
            "path": path,
            "tour": tour.as_ref().map(|steps| {
                steps.iter().map(ToString::to_string).collect::<Vec<_>>()
            }),
        }))?;
        return Ok(());
    }

    println!("CircuitCraft Eulerian Check: {}", board.name());
    println!("============================");
    println!("Eulerian circuit: {}", if is_circuit { "yes" } else { "no" });

    match path {
        Some(path) => println!("Closing path:     {}", path.join(" -> ")),
        None => println!("Closing path:     none"),
    }

    if let Some(tour) = tour.filter(|_| verbose) {
        println!();
        println!("Tour:");
        for step in tour {
            println!("  {}", step);
        }
    }

    Ok(())
}

// =============================================================================
// SAVE COMMAND
// =============================================================================

/// Persist a solved board, or a portable copy with every slot unset.
pub fn cmd_save(definition: &Path, output: &Path, portable: bool) -> Result<(), CircuitError> {
    let mut board = load_definition(definition)?;
    let board = if portable {
        board.to_portable()
    } else {
        board.solve(SolveMode::Full)?;
        board
    };

    let output = validate_output_path(output)?;
    board.save(&output)?;

    println!(
        "Saved {} board '{}' to {:?}",
        if portable { "portable" } else { "solved" },
        board.name(),
        output
    );
    Ok(())
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Show a persisted board. Comps are rebuilt with the standard operations.
pub fn cmd_inspect(file: &Path, json_mode: bool) -> Result<(), CircuitError> {
    let validated = validate_file_path(file)?;
    validate_file_size(&validated, MAX_PERSISTED_FILE_SIZE as u64)?;

    let board = CircuitBoard::load(&validated, Some(&StandardFactory))?;

    if json_mode {
        print_json(&serde_json::json!({
            "status": status_json(&board),
            "perches": perches_json(&board),
        }))?;
        return Ok(());
    }

    print_status(&board, false)?;
    println!();
    print_perch_data(&board);
    Ok(())
}

// =============================================================================
// OPS COMMAND
// =============================================================================

/// List the standard operations.
pub fn cmd_ops(json_mode: bool) -> Result<(), CircuitError> {
    if json_mode {
        print_json(&serde_json::json!({ "operations": OPERATIONS }))?;
        return Ok(());
    }

    println!("Standard Operations");
    println!("===================");
    for op in OPERATIONS {
        println!("  {}", op);
    }
    Ok(())
}
