// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cpdlink print — printer registry, capability translation, change detection
// and job spooling on top of the print-backend transport. `CpdManager` is the
// entry point; the other modules are usable on their own.

pub mod change;
pub mod job_options;
pub mod manager;
pub mod registry;
pub mod spool;
pub mod translator;

pub use change::{ChangeDetector, CountPolling, EventDriven};
pub use manager::{CpdManager, ManagerState};
pub use registry::{PrinterRecord, PrinterRegistry, RecordOrigin};
pub use spool::SpoolCoordinator;
pub use translator::Translation;
