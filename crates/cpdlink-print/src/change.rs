// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer-set change detection.
//
// Two backend generations report changes differently: newer ones push
// add/remove/state notifications, older ones only expose their current
// printer list. Both sit behind `ChangeDetector`, which answers "may the
// printer set have changed since the last call?" and leaves the registry
// consistent with the backend afterwards.

use tracing::{debug, trace};

use cpdlink_bridge::traits::BackendTransport;
use cpdlink_core::config::ChangeDetection;

use crate::registry::PrinterRegistry;

/// Strategy behind `CpdManager::check_printers_changed`.
pub trait ChangeDetector {
    /// Record the baseline right after initialization.
    fn prime(&mut self, registry: &PrinterRegistry, transport: &dyn BackendTransport);

    /// Report and clear pending changes.
    fn check(&mut self, registry: &mut PrinterRegistry, transport: &mut dyn BackendTransport)
    -> bool;

    fn name(&self) -> &'static str;
}

/// Apply every queued transport notification to the registry, oldest first.
///
/// Returns the number of notifications applied.
pub fn pump_events(registry: &mut PrinterRegistry, transport: &mut dyn BackendTransport) -> usize {
    let events = transport.take_events();
    let count = events.len();
    for event in events {
        trace!(identity = %event.identity(), "applying backend notification");
        registry.apply(event);
    }
    count
}

/// Consumes the dirty flag raised by pushed notifications.
#[derive(Debug, Default)]
pub struct EventDriven;

impl ChangeDetector for EventDriven {
    fn prime(&mut self, _registry: &PrinterRegistry, _transport: &dyn BackendTransport) {}

    fn check(
        &mut self,
        registry: &mut PrinterRegistry,
        transport: &mut dyn BackendTransport,
    ) -> bool {
        let applied = pump_events(registry, transport);
        let changed = registry.take_changed();
        transport.refresh();
        debug!(applied, changed, "event-driven change check");
        changed
    }

    fn name(&self) -> &'static str {
        "events"
    }
}

/// Compares the backend's printer count with the one seen last time.
///
/// On a difference the missing printers are added; nothing is removed.
#[derive(Debug, Default)]
pub struct CountPolling {
    last_count: Option<usize>,
}

impl ChangeDetector for CountPolling {
    fn prime(&mut self, _registry: &PrinterRegistry, transport: &dyn BackendTransport) {
        self.last_count = Some(transport.printers().len());
    }

    fn check(
        &mut self,
        registry: &mut PrinterRegistry,
        transport: &mut dyn BackendTransport,
    ) -> bool {
        let dirty = registry.take_changed();
        let snapshot = transport.printers();
        if self.last_count == Some(snapshot.len()) {
            return dirty;
        }

        let added = registry.add_missing(&snapshot);
        registry.take_changed();
        debug!(
            previous = ?self.last_count,
            current = snapshot.len(),
            added,
            "backend printer count changed"
        );
        self.last_count = Some(snapshot.len());
        true
    }

    fn name(&self) -> &'static str {
        "polling"
    }
}

/// Pick the detector for a transport.
pub fn detector_for(
    mode: ChangeDetection,
    transport: &dyn BackendTransport,
) -> Box<dyn ChangeDetector> {
    match mode {
        ChangeDetection::Events => Box::new(EventDriven),
        ChangeDetection::Polling => Box::new(CountPolling::default()),
        ChangeDetection::Auto if transport.supports_events() => Box::new(EventDriven),
        ChangeDetection::Auto => Box::new(CountPolling::default()),
    }
}
