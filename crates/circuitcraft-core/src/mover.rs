//! # Mover
//!
//! A directed edge between two perches carrying a computation.
//!
//! A mover knows which source slots feed its comp, which target slot (or the
//! whole target mapping) receives the result, and how to rebuild its comp
//! from a declarative [`MoverMap`] through a [`CompFactory`].
//!
//! Execution is split into three steps so that the board can hold the
//! source perch immutably and the target perch mutably at different times:
//! [`Mover::gather_input`], [`Mover::apply`], [`Mover::deliver`].

use crate::{CircuitError, Direction, MoverId, Perch, Slots, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// KEY SELECTION
// =============================================================================

/// Which source slots a mover hands to its comp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKeys {
    /// Only these slots, in this order.
    Selected(Vec<String>),
    /// The full source mapping.
    WholeMapping,
}

impl SourceKeys {
    pub fn selected<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceKeys::Selected(keys.into_iter().map(Into::into).collect())
    }
}

/// Where a mover writes its comp result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKey {
    /// Write `result[key]` into the target's `key` slot.
    Slot(String),
    /// Merge the entire result into the target.
    WholeMapping,
}

impl TargetKey {
    pub fn slot(key: impl Into<String>) -> Self {
        TargetKey::Slot(key.into())
    }
}

// =============================================================================
// MAPS, COMPS & FACTORIES
// =============================================================================

/// Serializable description of a mover's operation.
///
/// `kind` selects the operation in a [`CompFactory`]; `params` are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoverMap {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl MoverMap {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// What a comp returns.
#[derive(Debug, Clone, PartialEq)]
pub enum CompOutput {
    /// Bare value. Only accepted for backward movers writing a single slot.
    Scalar(Value),
    /// Slot mapping.
    Mapping(Slots),
}

impl CompOutput {
    /// A mapping with every listed slot set.
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        CompOutput::Mapping(crate::slots(pairs))
    }
}

impl From<Slots> for CompOutput {
    fn from(slots: Slots) -> Self {
        CompOutput::Mapping(slots)
    }
}

impl From<Value> for CompOutput {
    fn from(value: Value) -> Self {
        CompOutput::Scalar(value)
    }
}

/// A user-supplied transformation: one mapping in, one mapping out.
pub trait Comp: Send + Sync {
    fn apply(&self, input: &Slots) -> Result<CompOutput, CircuitError>;
}

impl<F> Comp for F
where
    F: Fn(&Slots) -> Result<CompOutput, CircuitError> + Send + Sync,
{
    fn apply(&self, input: &Slots) -> Result<CompOutput, CircuitError> {
        self(input)
    }
}

/// Shared handle to a comp. Cloning a board shares its comps.
pub type CompRef = Arc<dyn Comp>;

/// Wrap a closure as a [`CompRef`].
pub fn comp_fn<F>(f: F) -> CompRef
where
    F: Fn(&Slots) -> Result<CompOutput, CircuitError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Everything a factory sees when building a comp.
#[derive(Debug, Clone, Copy)]
pub struct CompSpec<'a> {
    pub direction: Direction,
    pub map: &'a MoverMap,
    pub parameters: &'a BTreeMap<String, Value>,
    pub numerical_hyperparameters: &'a BTreeMap<String, Value>,
}

/// Builds comps from maps.
pub trait CompFactory {
    fn build(&self, spec: &CompSpec<'_>) -> Result<CompRef, CircuitError>;
}

impl<F> CompFactory for F
where
    F: Fn(&CompSpec<'_>) -> Result<CompRef, CircuitError>,
{
    fn build(&self, spec: &CompSpec<'_>) -> Result<CompRef, CircuitError> {
        self(spec)
    }
}

// =============================================================================
// MOVER
// =============================================================================

/// A directed, operation-bearing edge.
#[derive(Clone)]
pub struct Mover {
    id: MoverId,
    source_keys: SourceKeys,
    target_key: TargetKey,
    map: Option<MoverMap>,
    comp: Option<CompRef>,
    parameters: BTreeMap<String, Value>,
    numerical_hyperparameters: BTreeMap<String, Value>,
}

impl Mover {
    /// A mover with no map and no comp.
    #[must_use]
    pub fn new(id: MoverId, source_keys: SourceKeys, target_key: TargetKey) -> Self {
        Self {
            id,
            source_keys,
            target_key,
            map: None,
            comp: None,
            parameters: BTreeMap::new(),
            numerical_hyperparameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &MoverId {
        &self.id
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.id.source
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.id.target
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.id.direction
    }

    #[must_use]
    pub fn source_keys(&self) -> &SourceKeys {
        &self.source_keys
    }

    #[must_use]
    pub fn target_key(&self) -> &TargetKey {
        &self.target_key
    }

    #[must_use]
    pub fn map(&self) -> Option<&MoverMap> {
        self.map.as_ref()
    }

    /// Store the description. Does not build the comp.
    pub fn set_map(&mut self, map: MoverMap) {
        self.map = Some(map);
    }

    #[must_use]
    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    #[must_use]
    pub fn comp(&self) -> Option<&CompRef> {
        self.comp.as_ref()
    }

    pub fn set_comp(&mut self, comp: CompRef) {
        self.comp = Some(comp);
    }

    #[must_use]
    pub fn has_comp(&self) -> bool {
        self.comp.is_some()
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.parameters = parameters;
    }

    #[must_use]
    pub fn numerical_hyperparameters(&self) -> &BTreeMap<String, Value> {
        &self.numerical_hyperparameters
    }

    pub fn set_numerical_hyperparameters(&mut self, hyperparameters: BTreeMap<String, Value>) {
        self.numerical_hyperparameters = hyperparameters;
    }

    /// Build the comp from the stored map.
    ///
    /// Fails with `Configuration` if no map is set or the factory fails.
    pub fn build_comp_from_map(&mut self, factory: &dyn CompFactory) -> Result<(), CircuitError> {
        let map = self.map.as_ref().ok_or_else(|| {
            CircuitError::Configuration(format!("mover {} has no map to build from", self.id))
        })?;

        let spec = CompSpec {
            direction: self.id.direction,
            map,
            parameters: &self.parameters,
            numerical_hyperparameters: &self.numerical_hyperparameters,
        };

        let comp = factory.build(&spec).map_err(|e| {
            CircuitError::Configuration(format!(
                "building comp '{}' for mover {} failed: {}",
                map.kind, self.id, e
            ))
        })?;

        self.comp = Some(comp);
        Ok(())
    }

    /// Check that the key selection fits the two perches.
    ///
    /// Every selected source key must be declared on `source` and a slot
    /// target must be declared on `target`.
    pub fn validate_keys(&self, source: &Perch, target: &Perch) -> Result<(), CircuitError> {
        if let SourceKeys::Selected(keys) = &self.source_keys
            && let Some(missing) = keys.iter().find(|k| !source.has_slot(k))
        {
            return Err(CircuitError::Configuration(format!(
                "mover {} reads slot '{}' which perch '{}' does not declare",
                self.id,
                missing,
                source.name()
            )));
        }

        if let TargetKey::Slot(key) = &self.target_key
            && !target.has_slot(key)
        {
            return Err(CircuitError::Configuration(format!(
                "mover {} writes slot '{}' which perch '{}' does not declare",
                self.id,
                key,
                target.name()
            )));
        }

        Ok(())
    }

    /// Collect the comp input from the source perch.
    pub fn gather_input(&self, source: &Perch) -> Result<Slots, CircuitError> {
        match &self.source_keys {
            SourceKeys::WholeMapping => Ok(source.data().clone()),
            SourceKeys::Selected(keys) => keys
                .iter()
                .map(|key| Ok((key.clone(), source.get_data(key)?.cloned())))
                .collect(),
        }
    }

    /// Run the comp and normalize its output to a mapping.
    pub fn apply(&self, input: &Slots) -> Result<Slots, CircuitError> {
        let comp = self
            .comp
            .as_ref()
            .ok_or_else(|| CircuitError::NotReady(self.id.clone()))?;

        match comp.apply(input)? {
            CompOutput::Mapping(result) => Ok(result),
            CompOutput::Scalar(value) => match (&self.target_key, self.id.direction) {
                (TargetKey::Slot(key), Direction::Backward) => {
                    let mut result = Slots::new();
                    result.insert(key.clone(), Some(value));
                    Ok(result)
                }
                _ => Err(CircuitError::UnexpectedScalar(self.id.clone())),
            },
        }
    }

    /// Write a normalized result into the target perch.
    ///
    /// Returns the slots actually written.
    pub fn deliver(&self, target: &mut Perch, result: Slots) -> Result<Slots, CircuitError> {
        match &self.target_key {
            TargetKey::WholeMapping => {
                target.update_data(&result)?;
                Ok(result
                    .into_iter()
                    .filter(|(k, _)| target.has_slot(k))
                    .collect())
            }
            TargetKey::Slot(key) => {
                let value = result.get(key).cloned().ok_or_else(|| {
                    CircuitError::MissingResultKey {
                        mover: self.id.clone(),
                        slot: key.clone(),
                    }
                })?;
                target.write_slot(key, value.clone())?;

                let mut written = Slots::new();
                written.insert(key.clone(), value);
                Ok(written)
            }
        }
    }

    /// Read from `source`, run the comp, write into `target`.
    ///
    /// Only `target` is mutated.
    pub fn execute(&self, source: &Perch, target: &mut Perch) -> Result<Slots, CircuitError> {
        let input = self.gather_input(source)?;
        let result = self.apply(&input)?;
        self.deliver(target, result)
    }
}

impl fmt::Debug for Mover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mover")
            .field("id", &self.id)
            .field("source_keys", &self.source_keys)
            .field("target_key", &self.target_key)
            .field("map", &self.map)
            .field("has_comp", &self.comp.is_some())
            .field("parameters", &self.parameters)
            .field("numerical_hyperparameters", &self.numerical_hyperparameters)
            .finish()
    }
}

impl fmt::Display for Mover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.map.as_ref().map_or("-", |m| m.kind.as_str());
        write!(
            f,
            "Mover({}, map={}, comp={})",
            self.id,
            kind,
            if self.has_comp() { "set" } else { "unset" }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::float_arithmetic)]
mod tests {
    use super::*;
    use crate::{ErrorKind, slots};

    fn square() -> CompRef {
        comp_fn(|input: &Slots| {
            let up = input
                .get("up")
                .and_then(|v| v.as_ref())
                .and_then(Value::as_f64)
                .ok_or_else(|| CircuitError::comp("up missing"))?;
            Ok(CompOutput::mapping([("up", up * up)]))
        })
    }

    fn backward_up() -> Mover {
        Mover::new(
            MoverId::new("B", "A", Direction::Backward),
            SourceKeys::selected(["up"]),
            TargetKey::slot("up"),
        )
    }

    #[test]
    fn execute_without_comp_is_not_ready() {
        let mover = backward_up();
        let mut source = Perch::standard("B").expect("perch");
        source.set_data("up", 4.0).expect("set");
        let mut target = Perch::standard("A").expect("perch");

        let err = mover.execute(&source, &mut target).expect_err("no comp");
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert!(target.is_empty());
    }

    #[test]
    fn execute_writes_selected_slot() {
        let mut mover = backward_up();
        mover.set_comp(square());

        let mut source = Perch::standard("B").expect("perch");
        source.set_data("up", 4.0).expect("set");
        let mut target = Perch::standard("A").expect("perch");

        let written = mover.execute(&source, &mut target).expect("execute");
        assert_eq!(written, slots([("up", 16.0)]));
        assert_eq!(target.get_data("up").expect("get"), Some(&Value::Float(16.0)));
        assert_eq!(target.get_data("down").expect("get"), None);
        assert_eq!(source.get_data("up").expect("get"), Some(&Value::Float(4.0)));
    }

    #[test]
    fn backward_scalar_is_normalized() {
        let mut mover = backward_up();
        mover.set_comp(comp_fn(|_: &Slots| Ok(CompOutput::Scalar(Value::Int(7)))));

        let source = Perch::standard("B").expect("perch");
        let mut target = Perch::standard("A").expect("perch");

        mover.execute(&source, &mut target).expect("scalar accepted");
        assert_eq!(target.get_data("up").expect("get"), Some(&Value::Int(7)));
    }

    #[test]
    fn forward_scalar_is_rejected() {
        let mut mover = Mover::new(
            MoverId::new("A", "B", Direction::Forward),
            SourceKeys::WholeMapping,
            TargetKey::slot("down"),
        );
        mover.set_comp(comp_fn(|_: &Slots| Ok(CompOutput::Scalar(Value::Int(7)))));

        let source = Perch::standard("A").expect("perch");
        let mut target = Perch::standard("B").expect("perch");

        let err = mover.execute(&source, &mut target).expect_err("scalar");
        assert!(matches!(err, CircuitError::UnexpectedScalar(_)));
        assert_eq!(err.kind(), ErrorKind::DataKey);
    }

    #[test]
    fn missing_result_key_is_data_key_error() {
        let mut mover = backward_up();
        mover.set_comp(comp_fn(|_: &Slots| Ok(CompOutput::mapping([("down", 1.0)]))));

        let source = Perch::standard("B").expect("perch");
        let mut target = Perch::standard("A").expect("perch");

        let err = mover.execute(&source, &mut target).expect_err("missing key");
        assert!(matches!(err, CircuitError::MissingResultKey { .. }));
        assert!(target.is_empty());
    }

    #[test]
    fn whole_mapping_merges_result() {
        let mut mover = Mover::new(
            MoverId::new("A", "B", Direction::Forward),
            SourceKeys::WholeMapping,
            TargetKey::WholeMapping,
        );
        mover.set_comp(comp_fn(|input: &Slots| Ok(CompOutput::Mapping(input.clone()))));

        let mut source = Perch::standard("A").expect("perch");
        source.set_data("up", 1.0).expect("set");
        source.set_data("down", 2.0).expect("set");
        let mut target = Perch::standard("B").expect("perch");

        mover.execute(&source, &mut target).expect("execute");
        assert_eq!(target.data(), source.data());
    }

    #[test]
    fn selected_undeclared_source_key_fails() {
        let mut mover = Mover::new(
            MoverId::new("B", "A", Direction::Backward),
            SourceKeys::selected(["missing"]),
            TargetKey::slot("up"),
        );
        mover.set_comp(square());

        let source = Perch::standard("B").expect("perch");
        let mut target = Perch::standard("A").expect("perch");

        let err = mover.execute(&source, &mut target).expect_err("undeclared");
        assert_eq!(err.kind(), ErrorKind::DataKey);
    }

    #[test]
    fn build_comp_requires_map() {
        let mut mover = backward_up();
        let factory = |_: &CompSpec<'_>| -> Result<CompRef, CircuitError> { Ok(square()) };

        let err = mover.build_comp_from_map(&factory).expect_err("no map");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        mover.set_map(MoverMap::new("square"));
        mover.build_comp_from_map(&factory).expect("built");
        assert!(mover.has_comp());
    }

    #[test]
    fn factory_failure_is_configuration_error() {
        let mut mover = backward_up();
        mover.set_map(MoverMap::new("unknown"));
        let factory = |spec: &CompSpec<'_>| -> Result<CompRef, CircuitError> {
            Err(CircuitError::comp(format!("no op '{}'", spec.map.kind)))
        };

        let err = mover.build_comp_from_map(&factory).expect_err("factory fails");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!mover.has_comp());
    }

    #[test]
    fn factory_sees_parameters() {
        let mut mover = backward_up();
        mover.set_map(MoverMap::new("square").with_param("factor", 2.0));
        let mut params = BTreeMap::new();
        params.insert("beta".to_string(), Value::Float(0.96));
        mover.set_parameters(params);

        let factory = |spec: &CompSpec<'_>| -> Result<CompRef, CircuitError> {
            assert_eq!(spec.direction, Direction::Backward);
            assert_eq!(spec.map.params.get("factor"), Some(&Value::Float(2.0)));
            assert_eq!(spec.parameters.get("beta"), Some(&Value::Float(0.96)));
            Ok(square())
        };
        mover.build_comp_from_map(&factory).expect("built");
    }

    #[test]
    fn validate_keys_checks_both_perches() {
        let source = Perch::standard("B").expect("perch");
        let target = Perch::new("A", ["value"]).expect("perch");

        let err = backward_up()
            .validate_keys(&source, &target)
            .expect_err("target lacks up");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let ok = Mover::new(
            MoverId::new("B", "A", Direction::Backward),
            SourceKeys::selected(["up"]),
            TargetKey::slot("value"),
        );
        ok.validate_keys(&source, &target).expect("valid");
    }
}
