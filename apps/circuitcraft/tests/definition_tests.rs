//! Integration tests for circuit definitions and the standard operations.

#![allow(clippy::unwrap_used, clippy::panic)]

use circuitcraft::output::{perches_json, status_json};
use circuitcraft::{CircuitDefinition, StandardFactory};
use circuitcraft_core::{
    CircuitBoard, Direction, ErrorKind, SolveMode, SourceKeys, Stage, TargetKey, Value,
    build_circuit, create_and_solve_circuit,
};

const MINIMAL: &str = include_str!("../../../demos/minimal.toml");
const THREE_PERCH: &str = include_str!("../../../demos/three_perch.toml");

fn build(text: &str) -> CircuitBoard {
    let spec = CircuitDefinition::from_toml(text).unwrap().into_spec();
    build_circuit(spec, Some(&StandardFactory)).unwrap()
}

// =============================================================================
// PARSING
// =============================================================================

#[test]
fn test_minimal_definition_parses() {
    let def = CircuitDefinition::from_toml(MINIMAL).unwrap();
    assert_eq!(def.board.name, "minimal");
    assert_eq!(def.perches.len(), 2);
    assert_eq!(def.movers.len(), 2);
    assert_eq!(def.perches[0].slots, vec!["up", "down"]);
    assert_eq!(def.movers[0].direction, Direction::Backward);
}

#[test]
fn test_key_selection_defaults_to_whole_mapping() {
    let spec = CircuitDefinition::from_toml(
        r#"
        [board]
        name = "whole"

        [[perch]]
        id = "A"

        [[perch]]
        id = "B"

        [[mover]]
        source = "A"
        target = "B"
        direction = "forward"
        op = "identity"
        "#,
    )
    .unwrap()
    .into_spec();

    assert_eq!(spec.movers[0].source_keys, SourceKeys::WholeMapping);
    assert_eq!(spec.movers[0].target_key, TargetKey::WholeMapping);
}

#[test]
fn test_custom_boundary_slots() {
    let spec = CircuitDefinition::from_toml(
        r#"
        [board]
        name = "custom"
        backward_slot = "comp"
        forward_slot = "sim"
        permissive = true
        "#,
    )
    .unwrap()
    .into_spec();

    assert_eq!(spec.config.backward_slot, "comp");
    assert_eq!(spec.config.forward_slot, "sim");
    assert!(spec.config.permissive_updates);
}

#[test]
fn test_invalid_direction_is_configuration_error() {
    let err = CircuitDefinition::from_toml(
        r#"
        [board]
        name = "bad"

        [[mover]]
        source = "A"
        target = "B"
        direction = "sideways"
        op = "identity"
        "#,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.toml");
    std::fs::write(&path, MINIMAL).unwrap();

    let def = CircuitDefinition::from_path(&path).unwrap();
    assert_eq!(def.board.name, "minimal");

    let missing = CircuitDefinition::from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Serialization);
}

// =============================================================================
// BUILD AND SOLVE
// =============================================================================

#[test]
fn test_minimal_solves_to_known_values() {
    let spec = CircuitDefinition::from_toml(MINIMAL).unwrap().into_spec();
    let (board, report) =
        create_and_solve_circuit(spec, Some(&StandardFactory), SolveMode::Full).unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(board.get_perch_data("A", "up").unwrap(), Some(&Value::Float(16.0)));
    assert_eq!(board.get_perch_data("B", "down").unwrap(), Some(&Value::Float(11.0)));
    assert_eq!(Stage::of(&board), Stage::Simulated);
}

#[test]
fn test_backward_only_leaves_forward_unsolved() {
    let spec = CircuitDefinition::from_toml(MINIMAL).unwrap().into_spec();
    let (board, report) =
        create_and_solve_circuit(spec, Some(&StandardFactory), SolveMode::BackwardOnly).unwrap();

    assert!(report.forward.is_empty());
    assert!(board.is_solved());
    assert!(!board.is_simulated());
    assert_eq!(board.get_perch_data("B", "down").unwrap(), None);
}

#[test]
fn test_unknown_operation_fails_finalization() {
    let text = MINIMAL.replace("op = \"square\"", "op = \"cube\"");
    let spec = CircuitDefinition::from_toml(&text).unwrap().into_spec();
    let err = build_circuit(spec, Some(&StandardFactory)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("cube"));
}

#[test]
fn test_three_perch_chain_solves_in_order() {
    let spec = CircuitDefinition::from_toml(THREE_PERCH).unwrap().into_spec();
    let (board, report) =
        create_and_solve_circuit(spec, Some(&StandardFactory), SolveMode::Full).unwrap();

    let backward: Vec<String> = report.backward.iter().map(ToString::to_string).collect();
    assert_eq!(
        backward,
        vec!["C -> B (backward)", "B -> A (backward)"]
    );
    assert!(board.get_perch_data("C", "down").unwrap().is_some());
}

#[test]
fn test_three_perch_is_eulerian() {
    let board = build(THREE_PERCH);
    assert!(board.is_eulerian_circuit());

    let tour = board.eulerian_tour().unwrap();
    assert_eq!(tour.len(), 4);
    assert_eq!(tour.first().map(|s| s.from.as_str()), Some("C"));
}

// =============================================================================
// JSON RENDERING
// =============================================================================

#[test]
fn test_status_json_reports_stage_and_boundaries() {
    let board = build(MINIMAL);
    let status = status_json(&board);

    assert_eq!(status["board"], "minimal");
    assert_eq!(status["stage"], Stage::Initialized.name());
    assert_eq!(status["flags"]["is_solvable"], true);
    assert_eq!(status["backward_terminal"], serde_json::json!(["B"]));
    assert_eq!(status["forward_initial"], serde_json::json!(["A"]));
}

#[test]
fn test_solve_mode_serializes_as_cli_name() {
    for mode in [SolveMode::Full, SolveMode::BackwardOnly, SolveMode::ForwardOnly] {
        let json = serde_json::to_value(mode).unwrap();
        assert_eq!(json, mode.as_str());
        assert_eq!(serde_json::from_value::<SolveMode>(json).unwrap(), mode);
        assert_eq!(mode.as_str().parse::<SolveMode>().unwrap(), mode);
    }
}

#[test]
fn test_perches_json_keeps_unset_slots() {
    let board = build(MINIMAL);
    let perches = perches_json(&board);

    assert_eq!(perches["B"]["up"], 4.0);
    assert!(perches["B"]["down"].is_null());
}
