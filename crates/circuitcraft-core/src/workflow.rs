//! # Quick Workflow
//!
//! One-call construction of a board from a declarative [`CircuitSpec`]:
//! create perches, add movers, finalize the model, apply initial values and
//! optionally solve.

use crate::{
    BoardConfig, CircuitBoard, CircuitError, CompFactory, CompRef, Direction, MoverMap, Perch,
    Slots, SolveMode, SolveReport, SourceKeys, TargetKey, Value,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// How a mover gets its comp.
#[derive(Clone)]
pub enum Operation {
    /// A ready comp.
    Comp(CompRef),
    /// A map for the factory to build from.
    Map(MoverMap),
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Comp(_) => f.write_str("Comp(..)"),
            Operation::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerchSpec {
    pub id: String,
    pub slots: Vec<String>,
}

impl PerchSpec {
    pub fn new<I, S>(id: impl Into<String>, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            slots: slots.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoverSpec {
    pub source: String,
    pub target: String,
    pub direction: Direction,
    pub source_keys: SourceKeys,
    pub target_key: TargetKey,
    pub operation: Operation,
    pub parameters: BTreeMap<String, Value>,
    pub numerical_hyperparameters: BTreeMap<String, Value>,
}

impl MoverSpec {
    /// A mover reading and writing whole mappings, without parameters.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        direction: Direction,
        operation: Operation,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            direction,
            source_keys: SourceKeys::WholeMapping,
            target_key: TargetKey::WholeMapping,
            operation,
            parameters: BTreeMap::new(),
            numerical_hyperparameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn keys(mut self, source_keys: SourceKeys, target_key: TargetKey) -> Self {
        self.source_keys = source_keys;
        self.target_key = target_key;
        self
    }

    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn hyperparameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.numerical_hyperparameters
            .insert(key.into(), value.into());
        self
    }
}

/// A complete circuit description.
#[derive(Debug, Clone, Default)]
pub struct CircuitSpec {
    pub name: String,
    pub config: BoardConfig,
    pub perches: Vec<PerchSpec>,
    pub movers: Vec<MoverSpec>,
    /// Perch id -> slots to set before solving.
    pub initial_values: BTreeMap<String, Slots>,
}

impl CircuitSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn perch(mut self, perch: PerchSpec) -> Self {
        self.perches.push(perch);
        self
    }

    #[must_use]
    pub fn mover(mut self, mover: MoverSpec) -> Self {
        self.movers.push(mover);
        self
    }

    #[must_use]
    pub fn initial(mut self, perch: impl Into<String>, values: Slots) -> Self {
        self.initial_values.entry(perch.into()).or_default().extend(values);
        self
    }
}

/// Build, finalize and initialize a board without solving it.
pub fn build_circuit(
    spec: CircuitSpec,
    factory: Option<&dyn CompFactory>,
) -> Result<CircuitBoard, CircuitError> {
    let mut board = CircuitBoard::with_config(spec.name, spec.config);

    for perch in spec.perches {
        board.add_perch(Perch::new(perch.id, perch.slots)?)?;
    }

    for mover in spec.movers {
        let (source, target, direction) = (&mover.source, &mover.target, mover.direction);
        board.add_mover(source, target, direction, mover.source_keys, mover.target_key)?;
        match mover.operation {
            Operation::Comp(comp) => board.set_mover_comp(source, target, direction, comp)?,
            Operation::Map(map) => board.set_mover_map(source, target, direction, map)?,
        }
        board.set_mover_parameters(source, target, direction, mover.parameters)?;
        board.set_mover_numerical_hyperparameters(
            source,
            target,
            direction,
            mover.numerical_hyperparameters,
        )?;
    }

    board.finalize_model(factory)?;

    for (perch, values) in &spec.initial_values {
        board.update_perch_data(perch, values)?;
    }

    Ok(board)
}

/// Build a board and solve it in one call.
pub fn create_and_solve_circuit(
    spec: CircuitSpec,
    factory: Option<&dyn CompFactory>,
    mode: SolveMode,
) -> Result<(CircuitBoard, SolveReport), CircuitError> {
    let mut board = build_circuit(spec, factory)?;
    let report = board.solve(mode)?;
    info!(board = %board.name(), %mode, "circuit created and solved");
    Ok((board, report))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::float_arithmetic)]
mod tests {
    use super::*;
    use crate::{CompOutput, CompSpec, ErrorKind, comp_fn, slots};

    fn doubler() -> CompRef {
        comp_fn(|input: &Slots| {
            let up = input
                .get("up")
                .and_then(|v| v.as_ref())
                .and_then(Value::as_f64)
                .ok_or_else(|| CircuitError::comp("up missing"))?;
            Ok(CompOutput::mapping([("up", up * 2.0)]))
        })
    }

    fn spec(operation: Operation) -> CircuitSpec {
        CircuitSpec::new("quick")
            .perch(PerchSpec::new("A", ["up", "down"]))
            .perch(PerchSpec::new("B", ["up", "down"]))
            .mover(
                MoverSpec::new("B", "A", Direction::Backward, operation)
                    .keys(SourceKeys::selected(["up"]), TargetKey::slot("up")),
            )
            .initial("B", slots([("up", 3.0)]))
    }

    #[test]
    fn create_and_solve_with_comp() {
        let (board, report) =
            create_and_solve_circuit(spec(Operation::Comp(doubler())), None, SolveMode::Full)
                .expect("solve");

        assert_eq!(board.get_perch_data("A", "up").expect("get"), Some(&Value::Float(6.0)));
        assert_eq!(report.backward.len(), 1);
    }

    #[test]
    fn create_and_solve_with_map() {
        let factory = |spec: &CompSpec<'_>| -> Result<CompRef, CircuitError> {
            match spec.map.kind.as_str() {
                "double" => Ok(doubler()),
                other => Err(CircuitError::comp(format!("unknown op '{}'", other))),
            }
        };

        let (board, _) = create_and_solve_circuit(
            spec(Operation::Map(MoverMap::new("double"))),
            Some(&factory),
            SolveMode::BackwardOnly,
        )
        .expect("solve");
        assert_eq!(board.get_perch_data("A", "up").expect("get"), Some(&Value::Float(6.0)));
    }

    #[test]
    fn map_without_factory_fails_finalization() {
        let err = build_circuit(spec(Operation::Map(MoverMap::new("double"))), None)
            .expect_err("no factory");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn build_circuit_does_not_solve() {
        let board = build_circuit(spec(Operation::Comp(doubler())), None).expect("build");
        assert!(board.is_solvable());
        assert_eq!(board.get_perch_data("A", "up").expect("get"), None);
    }
}
