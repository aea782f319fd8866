// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver-description model: the host-facing key/value view of a printer's
// capabilities, independent of which backend supplied it.
//
// A `DriverDescription` is shared behind an `Arc`; an `OptionContext` holds
// the values explicitly chosen against one particular description.

use std::sync::Arc;

/// One selectable value of a capability key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityValue {
    name: String,
}

impl CapabilityValue {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named capability with its ordered values and optional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityKey {
    name: String,
    ui_option: bool,
    values: Vec<CapabilityValue>,
    /// Index into `values`; never out of range.
    default: Option<usize>,
}

impl CapabilityKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ui_option: false,
            values: Vec::new(),
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the key should be offered in a print dialog.
    pub fn is_ui_option(&self) -> bool {
        self.ui_option
    }

    pub fn set_ui_option(&mut self, ui_option: bool) {
        self.ui_option = ui_option;
    }

    /// Append a value, returning its index. Duplicate names are rejected.
    pub fn insert_value(&mut self, name: impl Into<String>) -> Option<usize> {
        let name = name.into();
        if self.values.iter().any(|v| v.name == name) {
            return None;
        }
        self.values.push(CapabilityValue { name });
        Some(self.values.len() - 1)
    }

    pub fn values(&self) -> &[CapabilityValue] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&CapabilityValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Make the value at `index` the default. Returns `false` when out of range.
    pub fn set_default(&mut self, index: usize) -> bool {
        if index < self.values.len() {
            self.default = Some(index);
            true
        } else {
            false
        }
    }

    pub fn default_value(&self) -> Option<&CapabilityValue> {
        self.default.map(|i| &self.values[i])
    }
}

/// Normalized capability model for one printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDescription {
    name: String,
    keys: Vec<CapabilityKey>,
}

impl DriverDescription {
    pub fn new(name: impl Into<String>, keys: Vec<CapabilityKey>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// Built-in generic description used when a backend reports nothing.
    pub fn generic() -> Self {
        let mut page_size = CapabilityKey::new("PageSize");
        page_size.set_ui_option(true);
        for media in ["iso_a4_210x297mm", "na_letter_8.5x11in", "na_legal_8.5x14in"] {
            page_size.insert_value(media);
        }
        page_size.set_default(0);

        let mut duplex = CapabilityKey::new("Duplex");
        duplex.insert_value("None");
        duplex.set_default(0);

        let mut model = CapabilityKey::new("ModelName");
        model.insert_value("Generic Printer");
        model.set_default(0);

        let mut nick = CapabilityKey::new("NickName");
        nick.insert_value("Generic Printer");
        nick.set_default(0);

        Self::new("Generic Printer", vec![page_size, duplex, model, nick])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[CapabilityKey] {
        &self.keys
    }

    pub fn key(&self, name: &str) -> Option<&CapabilityKey> {
        self.keys.iter().find(|k| k.name == name)
    }
}

/// Option values chosen against one driver description.
#[derive(Debug, Clone, Default)]
pub struct OptionContext {
    driver: Option<Arc<DriverDescription>>,
    /// Explicit modifications as (key, value) names, in the order they were set.
    modified: Vec<(String, String)>,
}

impl OptionContext {
    pub fn new(driver: Arc<DriverDescription>) -> Self {
        Self {
            driver: Some(driver),
            modified: Vec::new(),
        }
    }

    pub fn driver(&self) -> Option<&Arc<DriverDescription>> {
        self.driver.as_ref()
    }

    /// Record `value` as an explicit choice for `key`.
    ///
    /// Returns `false` (and records nothing) when the bound description has no
    /// such key or value.
    pub fn set_value(&mut self, key: &str, value: &str) -> bool {
        let known = self
            .driver
            .as_ref()
            .and_then(|d| d.key(key))
            .is_some_and(|k| k.value(value).is_some());
        if !known {
            return false;
        }
        match self.modified.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.modified.push((key.to_owned(), value.to_owned())),
        }
        true
    }

    /// The effective value for `key`: the explicit choice or the key default.
    pub fn value(&self, key: &str) -> Option<&CapabilityValue> {
        let cap = self.driver.as_ref()?.key(key)?;
        match self.modified.iter().find(|(k, _)| k == key) {
            Some((_, v)) => cap.value(v),
            None => cap.default_value(),
        }
    }

    pub fn is_modified(&self, key: &str) -> bool {
        self.modified.iter().any(|(k, _)| k == key)
    }

    pub fn count_modified(&self) -> usize {
        self.modified.len()
    }

    /// Explicitly modified keys with their chosen values, in set order.
    pub fn modified(&self) -> impl Iterator<Item = (&CapabilityKey, &CapabilityValue)> {
        let driver = self.driver.as_deref();
        self.modified.iter().filter_map(move |(k, v)| {
            let key = driver?.key(k)?;
            Some((key, key.value(v)?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duplex_driver() -> Arc<DriverDescription> {
        let mut duplex = CapabilityKey::new("Duplex");
        duplex.insert_value("None");
        duplex.insert_value("DuplexNoTumble");
        duplex.set_default(0);
        Arc::new(DriverDescription::new("test", vec![duplex]))
    }

    #[test]
    fn duplicate_values_are_rejected() {
        let mut key = CapabilityKey::new("PageSize");
        assert_eq!(key.insert_value("A4"), Some(0));
        assert_eq!(key.insert_value("A4"), None);
        assert_eq!(key.values().len(), 1);
    }

    #[test]
    fn default_must_point_at_own_value() {
        let mut key = CapabilityKey::new("PageSize");
        key.insert_value("A4");
        assert!(!key.set_default(3));
        assert!(key.default_value().is_none());
        assert!(key.set_default(0));
        assert_eq!(key.default_value().map(CapabilityValue::name), Some("A4"));
    }

    #[test]
    fn context_falls_back_to_key_default() {
        let ctx = OptionContext::new(duplex_driver());
        assert_eq!(ctx.value("Duplex").map(CapabilityValue::name), Some("None"));
        assert_eq!(ctx.count_modified(), 0);
    }

    #[test]
    fn context_records_modifications_in_order() {
        let mut ctx = OptionContext::new(duplex_driver());
        assert!(ctx.set_value("Duplex", "DuplexNoTumble"));
        assert!(ctx.is_modified("Duplex"));
        let modified: Vec<_> = ctx.modified().map(|(k, v)| (k.name(), v.name())).collect();
        assert_eq!(modified, [("Duplex", "DuplexNoTumble")]);
    }

    #[test]
    fn context_rejects_unknown_values() {
        let mut ctx = OptionContext::new(duplex_driver());
        assert!(!ctx.set_value("Duplex", "Sideways"));
        assert!(!ctx.set_value("Staple", "None"));
        assert_eq!(ctx.count_modified(), 0);
        assert!(!OptionContext::default().set_value("Duplex", "None"));
    }

    #[test]
    fn generic_description_carries_identity_keys() {
        let generic = DriverDescription::generic();
        assert!(generic.key("ModelName").is_some());
        assert!(generic.key("NickName").is_some());
        assert!(generic.key("PageSize").is_some_and(CapabilityKey::is_ui_option));
    }
}
