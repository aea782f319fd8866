// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print-backend manager facade.
//
// `CpdManager` owns the backend connection, the printer registry, the staging
// files and the change detector. Every operation on a printer the backend
// does not own is handed to the fallback manager unchanged, and so is every
// operation when the backend is disabled or could not be loaded.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use cpdlink_bridge::traits::{BackendTransport, FallbackManager};
use cpdlink_core::config::CpdConfig;
use cpdlink_core::driver::{DriverDescription, OptionContext};
use cpdlink_core::error::Result;
use cpdlink_core::types::{BackendPrinter, JobData, PrinterIdentity, SpoolFile};

use crate::change::{self, ChangeDetector};
use crate::job_options::{job_name, submission_options};
use crate::registry::{PrinterRecord, PrinterRegistry};
use crate::spool::SpoolCoordinator;
use crate::translator::{self, Translation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initialized,
}

/// Everything that only exists while a backend is connected.
struct CpdBackend {
    transport: Box<dyn BackendTransport>,
    registry: PrinterRegistry,
    spool: SpoolCoordinator,
    detector: Box<dyn ChangeDetector>,
}

impl CpdBackend {
    fn owned_printer(&self, name: &str) -> Option<BackendPrinter> {
        self.registry
            .resolve(name)
            .and_then(PrinterRecord::backend_printer)
            .cloned()
    }

    /// The cached driver and default context of a backend printer,
    /// translating on first use.
    fn ensure_driver(
        &mut self,
        identity: &PrinterIdentity,
    ) -> Option<(Arc<DriverDescription>, OptionContext)> {
        let record = self.registry.get(identity)?;
        if let (Some(driver), Some(context)) = (&record.driver, &record.context) {
            return Some((Arc::clone(driver), context.clone()));
        }
        let printer = record.backend_printer()?.clone();

        let Translation { driver, defaults } =
            match translator::query_and_translate(self.transport.as_ref(), &printer) {
                Ok(translation) => translation,
                Err(e) => {
                    warn!(identity = %identity, error = %e, "using generic driver");
                    let driver = Arc::new(DriverDescription::generic());
                    Translation {
                        defaults: OptionContext::new(Arc::clone(&driver)),
                        driver,
                    }
                }
            };
        debug!(
            identity = %identity,
            keys = driver.keys().len(),
            modified = defaults.count_modified(),
            "driver description cached"
        );
        self.registry
            .cache_driver(identity, Arc::clone(&driver), defaults.clone());
        Some((driver, defaults))
    }
}

/// Printer-info manager for printers exposed by print backends.
pub struct CpdManager {
    fallback: Box<dyn FallbackManager>,
    backend: Option<CpdBackend>,
    state: ManagerState,
}

impl CpdManager {
    /// Build the manager, connecting to the backend service with `connect`.
    ///
    /// A disabled config, missing backends or a failed connection leave a
    /// manager that defers everything to `fallback`.
    pub fn load<F>(config: CpdConfig, fallback: Box<dyn FallbackManager>, connect: F) -> Self
    where
        F: FnOnce(&CpdConfig) -> Result<Box<dyn BackendTransport>>,
    {
        if !config.enabled {
            info!("print backends disabled, using fallback manager only");
            return Self::fallback_only(fallback);
        }

        let connected = config
            .validate()
            .and_then(|()| config.check_backends())
            .and_then(|()| connect(&config));
        match connected {
            Ok(transport) => Self::with_transport(&config, fallback, transport),
            Err(e) => {
                error!(error = %e, class = ?e.class(), "print backends unavailable");
                Self::fallback_only(fallback)
            }
        }
    }

    /// Build the manager around an already connected transport.
    pub fn with_transport(
        config: &CpdConfig,
        fallback: Box<dyn FallbackManager>,
        transport: Box<dyn BackendTransport>,
    ) -> Self {
        let detector = change::detector_for(config.change_detection, transport.as_ref());
        info!(detector = detector.name(), "print backend connected");
        Self {
            fallback,
            backend: Some(CpdBackend {
                transport,
                registry: PrinterRegistry::new(config.defaults.clone()),
                spool: SpoolCoordinator::from_config(config),
                detector,
            }),
            state: ManagerState::Uninitialized,
        }
    }

    pub fn fallback_only(fallback: Box<dyn FallbackManager>) -> Self {
        Self {
            fallback,
            backend: None,
            state: ManagerState::Uninitialized,
        }
    }

    /// Whether a backend is connected.
    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Load the baseline printers from the fallback manager, sync with the
    /// backend snapshot and drop everything that is neither a backend printer
    /// nor a special purpose one.
    #[instrument(skip(self))]
    pub fn initialize(&mut self) {
        if self.state == ManagerState::Initialized {
            warn!("manager already initialized");
            return;
        }

        let baseline = self.fallback.initialize();
        if let Some(backend) = self.backend.as_mut() {
            for printer in baseline {
                backend.registry.insert_fallback(printer);
            }
            change::pump_events(&mut backend.registry, backend.transport.as_mut());
            let snapshot = backend.transport.printers();
            backend.registry.reconcile(&snapshot);
            backend.registry.prune_foreign();
            backend
                .detector
                .prime(&backend.registry, backend.transport.as_ref());
            info!(
                printers = backend.registry.len(),
                backend_printers = backend.registry.backend_count(),
                "printer registry initialized"
            );
        }
        self.state = ManagerState::Initialized;
    }

    /// Driver description of a backend printer, by name or `CPD:` tag.
    ///
    /// Returns `None` for printers the backend does not own.
    #[instrument(skip(self))]
    pub fn create_driver_description(&mut self, name: &str) -> Option<Arc<DriverDescription>> {
        let backend = self.backend.as_mut()?;
        let identity = backend.owned_printer(name)?.identity();
        backend.ensure_driver(&identity).map(|(driver, _)| driver)
    }

    /// Fill in the job's driver description and option context.
    #[instrument(skip(self, job), fields(printer = %job.printer_name))]
    pub fn setup_job_context_data(&mut self, job: &mut JobData) {
        let owned = self
            .backend
            .as_ref()
            .and_then(|b| b.owned_printer(&job.printer_name));
        let (Some(backend), Some(printer)) = (self.backend.as_mut(), owned) else {
            debug!("deferring job setup to fallback manager");
            self.fallback.setup_job_context_data(job);
            return;
        };

        if let Some((driver, context)) = backend.ensure_driver(&printer.identity()) {
            job.driver = Some(driver);
            job.context = context;
        }
    }

    /// A job settings object for `name`, seeded from the printer's defaults.
    pub fn default_job_data(&mut self, name: &str) -> JobData {
        let mut job = JobData::new(name);
        if let Some(record) = self.printer(name) {
            job.copies = record.copies;
            job.orientation = Some(record.orientation);
        }
        self.setup_job_context_data(&mut job);
        job
    }

    /// Open a staging file for a job.
    #[instrument(skip(self))]
    pub fn start_spool(&mut self, printer_name: &str, quick_command: bool) -> Option<SpoolFile> {
        let owned = self
            .backend
            .as_ref()
            .and_then(|b| b.owned_printer(printer_name));
        let (Some(backend), Some(_)) = (self.backend.as_mut(), owned) else {
            debug!("deferring spool start to fallback manager");
            return self.fallback.start_spool(printer_name, quick_command);
        };
        backend.spool.start()
    }

    /// Submit a staged job. The staging file is gone afterwards whatever the
    /// outcome.
    #[instrument(skip(self, file, job), fields(spool_id = %file.id()))]
    pub fn end_spool(
        &mut self,
        printer_name: &str,
        job_title: &str,
        file: SpoolFile,
        job: &JobData,
        banner: bool,
        fax_number: &str,
    ) -> bool {
        let owned = self
            .backend
            .as_ref()
            .and_then(|b| b.owned_printer(printer_name));
        let (Some(backend), Some(printer)) = (self.backend.as_mut(), owned) else {
            debug!("deferring spool end to fallback manager");
            return self
                .fallback
                .end_spool(printer_name, job_title, file, job, banner, fax_number);
        };

        debug!(copies = job.copies, "ending spool");
        let options = submission_options(job_name(job_title, fax_number), job, banner);
        match backend
            .spool
            .finish(file, backend.transport.as_mut(), &printer, &options)
        {
            Ok(job_id) => {
                info!(printer = %printer.identity(), job_id = %job_id, "print job accepted");
                true
            }
            Err(e) => {
                warn!(printer = %printer.identity(), error = %e, "print job not submitted");
                false
            }
        }
    }

    /// Whether the printer set may have changed since the previous call.
    pub fn check_printers_changed(&mut self) -> bool {
        match self.backend.as_mut() {
            Some(backend) => backend
                .detector
                .check(&mut backend.registry, backend.transport.as_mut()),
            None => self.fallback.check_printers_changed(),
        }
    }

    /// Apply queued backend notifications without consuming the change flag.
    pub fn pump_events(&mut self) -> usize {
        match self.backend.as_mut() {
            Some(backend) => change::pump_events(&mut backend.registry, backend.transport.as_mut()),
            None => 0,
        }
    }

    /// Look up a registered printer by name or `CPD:` tag.
    pub fn printer(&self, name: &str) -> Option<&PrinterRecord> {
        self.backend.as_ref()?.registry.resolve(name)
    }

    /// All registered printers, ordered by identity.
    pub fn printers(&self) -> Vec<&PrinterRecord> {
        let mut records: Vec<_> = self
            .backend
            .iter()
            .flat_map(|b| b.registry.iter())
            .collect();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        records
    }
}
