// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cpdlink — Core types, the driver-description model and error definitions
// shared across all crates.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{ChangeDetection, CpdConfig, PrinterDefaults};
pub use driver::{CapabilityKey, CapabilityValue, DriverDescription, OptionContext};
pub use error::{CpdError, ErrorClass};
pub use types::*;
