// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend capability list -> driver description translation.
//
// Backends report free-form options (`media`, `sides`, ...) with a default
// and a list of supported values. Hosts expect the historical driver key
// names (`PageSize`, `Duplex`, `Resolution`), so three option names and the
// three duplex values are remapped on the way in. The same tables drive the
// inverse mapping when a job is submitted.

use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use cpdlink_bridge::traits::BackendTransport;
use cpdlink_core::driver::{CapabilityKey, DriverDescription, OptionContext};
use cpdlink_core::error::{CpdError, Result};
use cpdlink_core::types::{BackendOption, BackendPrinter, PrinterIdentity};

/// Default value backends report for options that do not apply.
pub const NOT_APPLICABLE: &str = "NA";

pub const DUPLEX_KEY: &str = "Duplex";
pub const MODEL_NAME_KEY: &str = "ModelName";
pub const NICK_NAME_KEY: &str = "NickName";

/// (backend option name, driver key name)
const OPTION_NAMES: [(&str, &str); 3] = [
    ("sides", DUPLEX_KEY),
    ("printer-resolution", "Resolution"),
    ("media", "PageSize"),
];

/// (backend `sides` value, driver `Duplex` value)
const DUPLEX_VALUES: [(&str, &str); 3] = [
    ("one-sided", "None"),
    ("two-sided-long-edge", "DuplexNoTumble"),
    ("two-sided-short-edge", "DuplexTumble"),
];

/// Driver key name for a backend option name.
pub fn driver_option_name(backend_name: &str) -> &str {
    OPTION_NAMES
        .iter()
        .find(|(backend, _)| *backend == backend_name)
        .map_or(backend_name, |(_, driver)| *driver)
}

/// Backend option name for a driver key name.
pub fn backend_option_name(driver_name: &str) -> &str {
    OPTION_NAMES
        .iter()
        .find(|(_, driver)| *driver == driver_name)
        .map_or(driver_name, |(backend, _)| *backend)
}

/// Driver value name for a backend value of `driver_key`.
pub fn driver_value_name<'a>(driver_key: &str, backend_value: &'a str) -> &'a str {
    if driver_key != DUPLEX_KEY {
        return backend_value;
    }
    DUPLEX_VALUES
        .iter()
        .find(|(backend, _)| *backend == backend_value)
        .map_or(backend_value, |(_, driver)| *driver)
}

/// Backend value for a driver value of `driver_key`.
pub fn backend_value_name<'a>(driver_key: &str, driver_value: &'a str) -> &'a str {
    if driver_key != DUPLEX_KEY {
        return driver_value;
    }
    DUPLEX_VALUES
        .iter()
        .find(|(_, driver)| *driver == driver_value)
        .map_or(driver_value, |(backend, _)| *backend)
}

/// A translated capability model plus the backend's default choices.
#[derive(Debug, Clone)]
pub struct Translation {
    pub driver: Arc<DriverDescription>,
    /// Context bound to `driver`, marking backend defaults that differ from
    /// the key defaults as modifications.
    pub defaults: OptionContext,
}

/// Query a printer's capabilities and translate them.
///
/// Fails with [`CpdError::CapabilityQuery`] or [`CpdError::NoCapabilities`];
/// callers degrade the printer to the generic driver.
#[instrument(skip_all, fields(identity = %printer.identity()))]
pub fn query_and_translate(
    transport: &dyn BackendTransport,
    printer: &BackendPrinter,
) -> Result<Translation> {
    let options = transport.query_capabilities(printer)?;
    debug!(count = options.len(), "received backend options");
    translate(&printer.identity(), &printer.name, &options)
}

/// Translate a backend option list into a driver description.
pub fn translate(
    identity: &PrinterIdentity,
    nick_name: &str,
    options: &[BackendOption],
) -> Result<Translation> {
    if options.is_empty() {
        return Err(CpdError::NoCapabilities(identity.to_string()));
    }

    let mut keys = Vec::with_capacity(options.len() + 2);
    // Backend default per key, post-remap, parallel to `keys`.
    let mut backend_defaults = Vec::with_capacity(options.len() + 2);

    for option in options {
        let name = driver_option_name(&option.name);
        let default = driver_value_name(name, &option.default_value);

        let mut key = CapabilityKey::new(name);
        key.set_ui_option(
            !option.supported_values.is_empty() && option.default_value != NOT_APPLICABLE,
        );
        for value in &option.supported_values {
            let value = driver_value_name(name, value);
            let Some(index) = key.insert_value(value) else {
                continue;
            };
            if value == default {
                key.set_default(index);
            }
        }
        // No default is invented when the backend's default is not one of
        // its supported values.
        if key.default_value().is_none() {
            trace!(key = name, default, "backend default not among supported values");
        }

        keys.push(key);
        backend_defaults.push(default.to_owned());
    }

    keys.push(single_value_key(MODEL_NAME_KEY, ""));
    backend_defaults.push(String::new());
    keys.push(single_value_key(NICK_NAME_KEY, nick_name));
    backend_defaults.push(nick_name.to_owned());

    let driver = Arc::new(DriverDescription::new(identity.as_str(), keys));
    let mut defaults = OptionContext::new(Arc::clone(&driver));
    for (key, default) in driver.keys().iter().zip(&backend_defaults) {
        let Some(value) = key.value(default) else {
            continue;
        };
        // Keys above take the backend default as their own default, so this
        // only fires once a key's default is chosen some other way.
        if key.default_value() != Some(value) {
            defaults.set_value(key.name(), value.name());
            debug!(key = key.name(), value = value.name(), "backend default set");
        } else {
            trace!(key = key.name(), value = value.name(), "backend default matches key default");
        }
    }

    info!(
        identity = %identity,
        keys = driver.keys().len(),
        modified = defaults.count_modified(),
        "translated backend capabilities"
    );
    Ok(Translation { driver, defaults })
}

fn single_value_key(name: &str, value: &str) -> CapabilityKey {
    let mut key = CapabilityKey::new(name);
    if let Some(index) = key.insert_value(value) {
        key.set_default(index);
    }
    key
}
