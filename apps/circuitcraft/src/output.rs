//! JSON rendering of boards for `--json-mode` output.

use circuitcraft_core::{
    BoardMetrics, CircuitBoard, CircuitError, LifecycleFlags, Perch, SolveReport, Stage, Value,
};
use serde_json::{Map, Value as Json, json};

/// Convert a perch value to JSON. Non-finite floats become `null`.
pub fn value_json(value: &Value) -> Json {
    match value {
        Value::Bool(v) => Json::Bool(*v),
        Value::Int(v) => Json::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Text(v) => Json::String(v.clone()),
        Value::List(items) => Json::Array(items.iter().map(value_json).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_json(v)))
                .collect(),
        ),
    }
}

/// Slot -> value, unset slots as `null`.
pub fn perch_json(perch: &Perch) -> Json {
    let data: Map<String, Json> = perch
        .data()
        .iter()
        .map(|(slot, value)| (slot.clone(), value.as_ref().map_or(Json::Null, value_json)))
        .collect();
    Json::Object(data)
}

pub fn perches_json(board: &CircuitBoard) -> Json {
    let perches: Map<String, Json> = board
        .perches()
        .map(|p| (p.name().to_string(), perch_json(p)))
        .collect();
    Json::Object(perches)
}

pub fn report_json(report: &SolveReport) -> Json {
    let ids = |ids: &[circuitcraft_core::MoverId]| -> Vec<String> {
        ids.iter().map(ToString::to_string).collect()
    };
    json!({
        "backward": ids(&report.backward),
        "forward": ids(&report.forward),
        "total": report.total(),
    })
}

/// Stage, flags and metrics of a board.
pub fn status_json(board: &CircuitBoard) -> Json {
    let stage = Stage::of(board);
    let flags = LifecycleFlags::of(board);
    let metrics = BoardMetrics::of(board);

    json!({
        "board": board.name(),
        "stage": stage.name(),
        "hint": stage.hint(),
        "flags": flags,
        "metrics": {
            "perches": metrics.perch_count,
            "backward_movers": metrics.backward_movers,
            "forward_movers": metrics.forward_movers,
            "populated_perches": metrics.populated_perches,
            "movers_with_comp": metrics.movers_with_comp,
            "longest_chain": metrics.longest_chain,
        },
        "backward_terminal": board.backward_terminal_perches(),
        "forward_initial": board.forward_initial_perches(),
    })
}

/// Pretty-print a JSON document for stdout.
pub fn to_pretty(value: &Json) -> Result<String, CircuitError> {
    serde_json::to_string_pretty(value).map_err(|e| CircuitError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn values_map_onto_json() {
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), Value::Int(1));
        let value = Value::List(vec![Value::Bool(true), Value::Float(0.5), Value::Map(entries)]);
        assert_eq!(value_json(&value), json!([true, 0.5, {"k": 1}]));
    }

    #[test]
    fn non_finite_float_is_null() {
        assert_eq!(value_json(&Value::Float(f64::NAN)), Json::Null);
    }

    #[test]
    fn unset_slots_are_null() {
        let mut perch = Perch::standard("A").expect("perch");
        perch.set_data("up", 2i64).expect("set");
        assert_eq!(perch_json(&perch), json!({"down": null, "up": 2}));
    }

    #[test]
    fn pretty_output_is_parseable() {
        let doc = json!({"board": "minimal", "stage": "solved", "path": ["B", "A", "B"]});
        let text = to_pretty(&doc).expect("pretty");
        assert!(text.contains('\n'));
        assert_eq!(serde_json::from_str::<Json>(&text).expect("parse"), doc);
    }
}
