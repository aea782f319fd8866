// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the collaborators behind the print-backend manager.

use std::path::Path;

use cpdlink_core::error::Result;
use cpdlink_core::types::{
    BackendJobId, BackendOption, BackendPrinter, FallbackPrinter, JobData, JobOptionSet,
    PrinterEvent, SpoolFile,
};

/// Live connection to the print-backend service.
///
/// Implementations keep a local cache of backend printer objects and queue
/// the service's notifications until the owner drains them with
/// [`take_events`](BackendTransport::take_events). Capability queries and job
/// submission are blocking round-trips; a missing reply is reported as an
/// error.
pub trait BackendTransport {
    /// Whether the service pushes add/remove/state notifications.
    fn supports_events(&self) -> bool;

    /// Snapshot of the printers currently known to the transport.
    fn printers(&self) -> Vec<BackendPrinter>;

    /// Drain queued notifications, oldest first.
    fn take_events(&mut self) -> Vec<PrinterEvent>;

    /// Ask every backend to re-announce its printers.
    fn refresh(&mut self) {}

    /// Full capability list of one printer, in backend order.
    fn query_capabilities(&self, printer: &BackendPrinter) -> Result<Vec<BackendOption>>;

    /// Submit a staged job file with its options.
    ///
    /// Returns the backend job id, which may be [`BackendJobId::INVALID`].
    fn submit_job(
        &mut self,
        printer: &BackendPrinter,
        file: &Path,
        options: &JobOptionSet,
    ) -> Result<BackendJobId>;
}

/// The generic printer-info manager that handles every printer the backend
/// does not own.
pub trait FallbackManager {
    /// Build the baseline printer set (queues, PDF export, fax).
    fn initialize(&mut self) -> Vec<FallbackPrinter>;

    fn start_spool(&mut self, printer_name: &str, quick_command: bool) -> Option<SpoolFile>;

    fn end_spool(
        &mut self,
        printer_name: &str,
        job_title: &str,
        file: SpoolFile,
        job: &JobData,
        banner: bool,
        fax_number: &str,
    ) -> bool;

    /// Fill in the job's driver description and option context.
    fn setup_job_context_data(&mut self, job: &mut JobData);

    fn check_printers_changed(&mut self) -> bool {
        false
    }
}
