//! # Perch
//!
//! A named container with a fixed set of declared slots.
//!
//! Slots are declared once, at creation. Writes to an undeclared slot fail;
//! the only way to grow a perch is to build a new one.

use crate::primitives::{DOWN_SLOT, UP_SLOT};
use crate::{CircuitError, Slots, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A data-holding node of a circuit board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perch {
    name: String,
    data: Slots,
    #[serde(default)]
    permissive: bool,
}

impl Perch {
    /// Create a perch with the given declared slots, all unset.
    ///
    /// Fails with `Validation` if the name is empty or no slot is declared.
    pub fn new<I, S>(name: impl Into<String>, declared_slots: I) -> Result<Self, CircuitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(CircuitError::Validation(
                "perch name must not be empty".to_string(),
            ));
        }

        let mut data = Slots::new();
        for slot in declared_slots {
            let slot = slot.into();
            if slot.is_empty() {
                return Err(CircuitError::Validation(format!(
                    "perch '{}' declares an empty slot name",
                    name
                )));
            }
            data.insert(slot, None);
        }

        if data.is_empty() {
            return Err(CircuitError::Validation(format!(
                "perch '{}' must declare at least one slot",
                name
            )));
        }

        Ok(Self {
            name,
            data,
            permissive: false,
        })
    }

    /// Create a perch with the conventional `up`/`down` slots.
    pub fn standard(name: impl Into<String>) -> Result<Self, CircuitError> {
        Self::new(name, [UP_SLOT, DOWN_SLOT])
    }

    /// Let `update_data` ignore undeclared keys instead of failing.
    #[must_use]
    pub fn permissive(mut self) -> Self {
        self.permissive = true;
        self
    }

    pub(crate) fn set_permissive(&mut self, permissive: bool) {
        self.permissive = permissive;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_permissive(&self) -> bool {
        self.permissive
    }

    /// The full slot mapping, declared slots only.
    #[must_use]
    pub fn data(&self) -> &Slots {
        &self.data
    }

    pub fn declared_slots(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_slot(&self, slot: &str) -> bool {
        self.data.contains_key(slot)
    }

    /// Read a slot. `Ok(None)` means declared but unset.
    pub fn get_data(&self, slot: &str) -> Result<Option<&Value>, CircuitError> {
        self.data
            .get(slot)
            .map(Option::as_ref)
            .ok_or_else(|| self.undeclared(slot))
    }

    /// Set a declared slot.
    pub fn set_data(&mut self, slot: &str, value: impl Into<Value>) -> Result<(), CircuitError> {
        self.write_slot(slot, Some(value.into()))
    }

    /// Write a slot, `None` unsets it.
    pub fn write_slot(&mut self, slot: &str, value: Option<Value>) -> Result<(), CircuitError> {
        let name = &self.name;
        let entry = self
            .data
            .get_mut(slot)
            .ok_or_else(|| CircuitError::UndeclaredSlot {
                perch: name.clone(),
                slot: slot.to_string(),
            })?;
        *entry = value;
        Ok(())
    }

    /// Merge a partial mapping into the perch.
    ///
    /// Strict perches reject the whole update if any key is undeclared, so a
    /// failed update writes nothing. Permissive perches skip unknown keys.
    pub fn update_data(&mut self, partial: &Slots) -> Result<(), CircuitError> {
        if !self.permissive
            && let Some(unknown) = partial.keys().find(|k| !self.data.contains_key(*k))
        {
            return Err(self.undeclared(unknown));
        }

        for (slot, value) in partial {
            if let Some(entry) = self.data.get_mut(slot) {
                *entry = value.clone();
            }
        }
        Ok(())
    }

    /// Reset every slot to unset.
    pub fn clear_data(&mut self) {
        for value in self.data.values_mut() {
            *value = None;
        }
    }

    /// True if every listed slot is declared and set.
    #[must_use]
    pub fn is_initialized<'a>(&self, slots: impl IntoIterator<Item = &'a str>) -> bool {
        slots
            .into_iter()
            .all(|slot| matches!(self.data.get(slot), Some(Some(_))))
    }

    /// Slots currently holding a value.
    #[must_use]
    pub fn initialized_keys(&self) -> BTreeSet<&str> {
        self.data
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// True if every declared slot is unset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.values().all(Option::is_none)
    }

    fn undeclared(&self, slot: &str) -> CircuitError {
        CircuitError::UndeclaredSlot {
            perch: self.name.clone(),
            slot: slot.to_string(),
        }
    }
}

impl fmt::Display for Perch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let initialized: Vec<_> = self.initialized_keys().into_iter().collect();
        write!(
            f,
            "Perch({}, initialized=[{}])",
            self.name,
            initialized.join(", ")
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
