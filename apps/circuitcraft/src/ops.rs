//! # Standard Operations
//!
//! The comp factory used by definition files. Every mover map names one of
//! these operations in its `kind`:
//!
//! | kind       | params                                  | result                              |
//! |------------|-----------------------------------------|-------------------------------------|
//! | `identity` | none                                    | the input mapping                   |
//! | `square`   | none                                    | every input slot squared            |
//! | `scale`    | `factor`                                | every input slot times `factor`     |
//! | `affine`   | `weights`, `into`, optional `constant`  | `constant + sum(w * x)` in `into`   |
//! | `sum`      | `into`                                  | sum of the input slots in `into`    |
//!
//! Numeric arguments may also come from the mover's numerical
//! hyperparameters, which take precedence over the map.

#![allow(clippy::float_arithmetic)]

use circuitcraft_core::{
    CircuitError, CompFactory, CompOutput, CompRef, CompSpec, Slots, Value, comp_fn,
};
use std::collections::BTreeMap;

/// Names of the operations [`StandardFactory`] understands.
pub const OPERATIONS: [&str; 5] = ["identity", "square", "scale", "affine", "sum"];

/// Factory for the standard operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFactory;

impl CompFactory for StandardFactory {
    fn build(&self, spec: &CompSpec<'_>) -> Result<CompRef, CircuitError> {
        match spec.map.kind.as_str() {
            "identity" => Ok(comp_fn(|input: &Slots| Ok(CompOutput::Mapping(input.clone())))),
            "square" => Ok(comp_fn(|input: &Slots| {
                elementwise(input, |x| x * x).map(CompOutput::Mapping)
            })),
            "scale" => {
                let factor = numeric_arg(spec, "factor")?;
                Ok(comp_fn(move |input: &Slots| {
                    elementwise(input, |x| x * factor).map(CompOutput::Mapping)
                }))
            }
            "affine" => {
                let weights = weights_arg(spec)?;
                let constant = optional_numeric_arg(spec, "constant")?.unwrap_or(0.0);
                let into = text_arg(spec, "into")?;
                Ok(comp_fn(move |input: &Slots| {
                    let mut total = constant;
                    for (key, weight) in &weights {
                        total += weight * number(input, key)?;
                    }
                    Ok(CompOutput::mapping([(into.as_str(), total)]))
                }))
            }
            "sum" => {
                let into = text_arg(spec, "into")?;
                Ok(comp_fn(move |input: &Slots| {
                    let mut total = 0.0;
                    for key in input.keys() {
                        total += number(input, key)?;
                    }
                    Ok(CompOutput::mapping([(into.as_str(), total)]))
                }))
            }
            other => Err(CircuitError::Configuration(format!(
                "unknown operation '{}', expected one of: {}",
                other,
                OPERATIONS.join(", ")
            ))),
        }
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

fn lookup<'a>(spec: &'a CompSpec<'_>, name: &str) -> Option<&'a Value> {
    spec.numerical_hyperparameters
        .get(name)
        .or_else(|| spec.map.params.get(name))
}

fn optional_numeric_arg(spec: &CompSpec<'_>, name: &str) -> Result<Option<f64>, CircuitError> {
    match lookup(spec, name) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            CircuitError::Configuration(format!(
                "'{}' argument '{}' must be a number, got {}",
                spec.map.kind, name, value
            ))
        }),
    }
}

fn numeric_arg(spec: &CompSpec<'_>, name: &str) -> Result<f64, CircuitError> {
    optional_numeric_arg(spec, name)?.ok_or_else(|| missing_arg(spec, name))
}

fn text_arg(spec: &CompSpec<'_>, name: &str) -> Result<String, CircuitError> {
    let value = lookup(spec, name).ok_or_else(|| missing_arg(spec, name))?;
    value.as_str().map(str::to_string).ok_or_else(|| {
        CircuitError::Configuration(format!(
            "'{}' argument '{}' must be a string, got {}",
            spec.map.kind, name, value
        ))
    })
}

fn weights_arg(spec: &CompSpec<'_>) -> Result<BTreeMap<String, f64>, CircuitError> {
    let value = lookup(spec, "weights").ok_or_else(|| missing_arg(spec, "weights"))?;
    let entries = value.as_map().ok_or_else(|| {
        CircuitError::Configuration(format!(
            "'{}' argument 'weights' must be a table of numbers",
            spec.map.kind
        ))
    })?;

    entries
        .iter()
        .map(|(key, weight)| {
            weight.as_f64().map(|w| (key.clone(), w)).ok_or_else(|| {
                CircuitError::Configuration(format!("weight '{}' must be a number", key))
            })
        })
        .collect()
}

fn missing_arg(spec: &CompSpec<'_>, name: &str) -> CircuitError {
    CircuitError::Configuration(format!(
        "operation '{}' requires argument '{}'",
        spec.map.kind, name
    ))
}

// =============================================================================
// EVALUATION
// =============================================================================

fn number(input: &Slots, key: &str) -> Result<f64, CircuitError> {
    match input.get(key) {
        Some(Some(value)) => value
            .as_f64()
            .ok_or_else(|| CircuitError::comp(format!("slot '{}' is not numeric: {}", key, value))),
        Some(None) => Err(CircuitError::comp(format!("slot '{}' is unset", key))),
        None => Err(CircuitError::comp(format!("input has no slot '{}'", key))),
    }
}

fn elementwise(input: &Slots, f: impl Fn(f64) -> f64) -> Result<Slots, CircuitError> {
    input
        .keys()
        .map(|key| Ok((key.clone(), Some(Value::Float(f(number(input, key)?))))))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use circuitcraft_core::{Direction, MoverMap, slots};

    fn build(map: &MoverMap, hyper: &BTreeMap<String, Value>) -> Result<CompRef, CircuitError> {
        let parameters = BTreeMap::new();
        StandardFactory.build(&CompSpec {
            direction: Direction::Forward,
            map,
            parameters: &parameters,
            numerical_hyperparameters: hyper,
        })
    }

    fn output(comp: &CompRef, input: &Slots) -> Slots {
        match comp.apply(input).expect("apply") {
            CompOutput::Mapping(m) => m,
            CompOutput::Scalar(v) => panic!("unexpected scalar {}", v),
        }
    }

    #[test]
    fn square_and_scale() {
        let none = BTreeMap::new();
        let square = build(&MoverMap::new("square"), &none).expect("square");
        assert_eq!(output(&square, &slots([("up", 4.0)])), slots([("up", 16.0)]));

        let scale = build(&MoverMap::new("scale").with_param("factor", 3i64), &none).expect("scale");
        assert_eq!(output(&scale, &slots([("up", 2i64)])), slots([("up", 6.0)]));
    }

    #[test]
    fn hyperparameters_override_map_params() {
        let mut hyper = BTreeMap::new();
        hyper.insert("factor".to_string(), Value::Float(10.0));
        let scale = build(&MoverMap::new("scale").with_param("factor", 3i64), &hyper).expect("scale");
        assert_eq!(output(&scale, &slots([("x", 1.5)])), slots([("x", 15.0)]));
    }

    #[test]
    fn affine_combines_weighted_inputs() {
        let mut weights = BTreeMap::new();
        weights.insert("down".to_string(), Value::Float(1.0));
        weights.insert("up".to_string(), Value::Float(0.5));
        let map = MoverMap::new("affine")
            .with_param("weights", Value::Map(weights))
            .with_param("into", "down");

        let affine = build(&map, &BTreeMap::new()).expect("affine");
        let result = output(&affine, &slots([("down", 3.0), ("up", 16.0)]));
        assert_eq!(result, slots([("down", 11.0)]));
    }

    #[test]
    fn sum_requires_into() {
        let err = build(&MoverMap::new("sum"), &BTreeMap::new())
            .err()
            .expect("missing into");
        assert!(matches!(err, CircuitError::Configuration(_)));
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = build(&MoverMap::new("cube"), &BTreeMap::new())
            .err()
            .expect("unknown");
        assert!(err.to_string().contains("cube"));
    }

    #[test]
    fn non_numeric_input_fails_the_comp() {
        let square = build(&MoverMap::new("square"), &BTreeMap::new()).expect("square");
        let err = square.apply(&slots([("up", "four")])).expect_err("text");
        assert!(matches!(err, CircuitError::Comp(_)));
    }
}
