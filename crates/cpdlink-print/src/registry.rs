// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local view of the printers exposed by the print backends.
//
// The registry owns one `PrinterRecord` per `PrinterIdentity`, together with
// the record's cached driver description. Backend notifications and full
// resync sweeps mutate it; every effective mutation raises the dirty flag,
// which the manager's `check_printers_changed` reads and clears.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use cpdlink_core::config::PrinterDefaults;
use cpdlink_core::driver::{DriverDescription, OptionContext};
use cpdlink_core::types::{
    BackendPrinter, FallbackPrinter, Orientation, PrinterEvent, PrinterIdentity,
};

/// Which manager contributed a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Owned by a print backend; holds the backend's printer object.
    Backend(BackendPrinter),
    /// Supplied by the fallback printer-info manager.
    Fallback,
}

/// One printer known to the registry.
#[derive(Debug, Clone)]
pub struct PrinterRecord {
    pub identity: PrinterIdentity,
    pub display_name: String,
    pub info: String,
    pub location: String,
    pub state: String,
    pub accepting_jobs: bool,
    /// Non-empty for special purpose printers that sweeps must keep.
    pub features: String,
    /// `CPD:<identity>` for backend printers, empty otherwise.
    pub driver_tag: String,
    pub copies: u32,
    pub orientation: Orientation,
    pub origin: RecordOrigin,
    /// Translated capabilities, filled on first query.
    pub driver: Option<Arc<DriverDescription>>,
    /// Backend default choices bound to `driver`.
    pub context: Option<OptionContext>,
    pub discovered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrinterRecord {
    fn seeded(identity: PrinterIdentity, defaults: &PrinterDefaults) -> Self {
        let now = Utc::now();
        Self {
            display_name: identity.to_string(),
            identity,
            info: String::new(),
            location: String::new(),
            state: String::new(),
            accepting_jobs: true,
            features: defaults.features.clone(),
            driver_tag: String::new(),
            copies: defaults.copies,
            orientation: defaults.orientation,
            origin: RecordOrigin::Fallback,
            driver: None,
            context: None,
            discovered_at: now,
            updated_at: now,
        }
    }

    pub fn backend_printer(&self) -> Option<&BackendPrinter> {
        match &self.origin {
            RecordOrigin::Backend(printer) => Some(printer),
            RecordOrigin::Fallback => None,
        }
    }

    pub fn is_backend_owned(&self) -> bool {
        matches!(self.origin, RecordOrigin::Backend(_))
    }

    /// Special purpose printers (PDF, fax) are never swept away.
    pub fn has_other_features(&self) -> bool {
        !self.features.is_empty()
    }
}

/// Identity -> record map with a change flag.
#[derive(Debug, Default)]
pub struct PrinterRegistry {
    records: HashMap<PrinterIdentity, PrinterRecord>,
    defaults: PrinterDefaults,
    changed: bool,
}

impl PrinterRegistry {
    pub fn new(defaults: PrinterDefaults) -> Self {
        Self {
            records: HashMap::new(),
            defaults,
            changed: false,
        }
    }

    /// Apply one backend notification.
    pub fn apply(&mut self, event: PrinterEvent) {
        match event {
            PrinterEvent::Added(printer) => self.on_printer_added(printer),
            PrinterEvent::Removed { id, backend_name } => {
                self.on_printer_removed(&PrinterIdentity::new(&id, &backend_name));
            }
            PrinterEvent::StateChanged {
                id,
                backend_name,
                state,
                accepting_jobs,
            } => {
                self.on_printer_state_changed(
                    &PrinterIdentity::new(&id, &backend_name),
                    &state,
                    accepting_jobs,
                );
            }
        }
    }

    /// Create or refresh the record of a backend printer.
    ///
    /// New records start from the global defaults; a cached driver
    /// description survives re-adding. Re-announcing a printer exactly as
    /// recorded is not a change.
    pub fn on_printer_added(&mut self, printer: BackendPrinter) {
        let identity = printer.identity();
        if self
            .records
            .get(&identity)
            .and_then(PrinterRecord::backend_printer)
            .is_some_and(|known| *known == printer)
        {
            trace!(identity = %identity, "printer re-announced unchanged");
            return;
        }
        let defaults = &self.defaults;
        let record = self
            .records
            .entry(identity.clone())
            .or_insert_with(|| PrinterRecord::seeded(identity.clone(), defaults));

        record.display_name = printer.display_name();
        record.info = printer.info.clone();
        record.location = printer.location.clone();
        record.state = printer.state.clone();
        record.accepting_jobs = printer.accepting_jobs;
        record.driver_tag = identity.driver_tag();
        record.origin = RecordOrigin::Backend(printer);
        record.updated_at = Utc::now();

        info!(identity = %identity, "printer added");
        self.changed = true;
    }

    /// Drop a backend printer and its cached capabilities.
    ///
    /// Returns `false` for identities the backend does not own.
    pub fn on_printer_removed(&mut self, identity: &PrinterIdentity) -> bool {
        if !self.is_backend_owned(identity) {
            warn!(identity = %identity, "remove notification for unknown printer");
            return false;
        }
        self.records.remove(identity);
        info!(identity = %identity, "printer removed");
        self.changed = true;
        true
    }

    /// Update state and accepting-jobs in place.
    pub fn on_printer_state_changed(
        &mut self,
        identity: &PrinterIdentity,
        state: &str,
        accepting_jobs: bool,
    ) -> bool {
        let Some(record) = self
            .records
            .get_mut(identity)
            .filter(|r| r.is_backend_owned())
        else {
            warn!(identity = %identity, "state notification for unknown printer");
            return false;
        };

        record.state = state.to_owned();
        record.accepting_jobs = accepting_jobs;
        if let RecordOrigin::Backend(printer) = &mut record.origin {
            printer.state = state.to_owned();
            printer.accepting_jobs = accepting_jobs;
        }
        record.updated_at = Utc::now();

        debug!(identity = %identity, state, accepting_jobs, "printer state changed");
        self.changed = true;
        true
    }

    /// Bring the registry in line with a full backend snapshot.
    ///
    /// Adds what is missing, then removes every record that is neither in
    /// the snapshot nor a special purpose printer.
    pub fn reconcile(&mut self, snapshot: &[BackendPrinter]) {
        let added = self.add_missing(snapshot);

        let present: HashSet<PrinterIdentity> =
            snapshot.iter().map(BackendPrinter::identity).collect();
        let stale: Vec<PrinterIdentity> = self
            .records
            .values()
            .filter(|r| !present.contains(&r.identity) && !r.has_other_features())
            .map(|r| r.identity.clone())
            .collect();
        for identity in &stale {
            self.records.remove(identity);
            info!(identity = %identity, "printer dropped by resync");
        }
        if !stale.is_empty() {
            self.changed = true;
        }

        debug!(added, removed = stale.len(), total = self.records.len(), "registry reconciled");
    }

    /// Add every snapshot printer the backend does not own yet. Never removes.
    ///
    /// Returns the number of printers added.
    pub fn add_missing(&mut self, snapshot: &[BackendPrinter]) -> usize {
        let mut added = 0;
        for printer in snapshot {
            if !self.is_backend_owned(&printer.identity()) {
                self.on_printer_added(printer.clone());
                added += 1;
            }
        }
        added
    }

    /// Remove every record that is neither backend-owned nor feature-tagged.
    pub fn prune_foreign(&mut self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, r| r.is_backend_owned() || r.has_other_features());
        let pruned = before - self.records.len();
        if pruned > 0 {
            debug!(pruned, "dropped printers not owned by a backend");
            self.changed = true;
        }
        pruned
    }

    /// Register a fallback-manager printer unless the identity is taken.
    pub fn insert_fallback(&mut self, printer: FallbackPrinter) -> bool {
        let identity = PrinterIdentity::from_raw(printer.name.clone());
        if self.records.contains_key(&identity) {
            return false;
        }
        let mut record = PrinterRecord::seeded(identity.clone(), &self.defaults);
        record.display_name = printer.name;
        record.info = printer.info;
        record.location = printer.location;
        record.features = printer.features;
        self.records.insert(identity, record);
        self.changed = true;
        true
    }

    /// Cache a translated driver description on a record.
    pub fn cache_driver(
        &mut self,
        identity: &PrinterIdentity,
        driver: Arc<DriverDescription>,
        context: OptionContext,
    ) -> bool {
        match self.records.get_mut(identity) {
            Some(record) => {
                record.driver = Some(driver);
                record.context = Some(context);
                true
            }
            None => false,
        }
    }

    /// Read and clear the dirty flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn get(&self, identity: &PrinterIdentity) -> Option<&PrinterRecord> {
        self.records.get(identity)
    }

    /// Look up a printer by name or by `CPD:`-prefixed driver tag.
    pub fn resolve(&self, name_or_tag: &str) -> Option<&PrinterRecord> {
        self.records
            .get(&PrinterIdentity::from_name_or_tag(name_or_tag))
    }

    pub fn is_backend_owned(&self, identity: &PrinterIdentity) -> bool {
        self.records
            .get(identity)
            .is_some_and(PrinterRecord::is_backend_owned)
    }

    pub fn backend_count(&self) -> usize {
        self.records.values().filter(|r| r.is_backend_owned()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrinterRecord> {
        self.records.values()
    }
}
