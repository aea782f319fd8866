// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory collaborators for hosts without a backend service and for tests.
//
// `MemoryTransport` behaves like a connected backend: it keeps a printer
// cache, queues notifications posted from any thread, answers capability
// queries from a table and records submitted jobs. Clones share state, so a
// test can keep a handle after moving the transport into the manager.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use cpdlink_core::driver::{DriverDescription, OptionContext};
use cpdlink_core::error::{CpdError, Result};
use cpdlink_core::types::{
    BackendJobId, BackendOption, BackendPrinter, FallbackPrinter, JobData, JobOptionSet,
    PrinterEvent, PrinterIdentity, SpoolFile,
};

use crate::traits::{BackendTransport, FallbackManager};

/// Cloneable handle for posting backend notifications from another thread.
#[derive(Debug, Clone)]
pub struct EventSender(UnboundedSender<PrinterEvent>);

impl EventSender {
    /// Queue an event. Returns `false` once the transport is gone.
    pub fn send(&self, event: PrinterEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

/// A job received by the in-memory backend.
#[derive(Debug, Clone)]
pub struct Submission {
    pub printer: PrinterIdentity,
    pub path: PathBuf,
    pub options: JobOptionSet,
    /// Staging file content at submission time.
    pub content: Vec<u8>,
    pub job_id: BackendJobId,
}

struct State {
    printers: Vec<BackendPrinter>,
    capabilities: HashMap<PrinterIdentity, Vec<BackendOption>>,
    failing: HashSet<PrinterIdentity>,
    events: UnboundedReceiver<PrinterEvent>,
    reject_jobs: bool,
    next_job_id: i32,
    submissions: Vec<Submission>,
    refreshes: usize,
    capability_queries: usize,
}

impl State {
    fn apply(&mut self, event: &PrinterEvent) {
        match event {
            PrinterEvent::Added(printer) => {
                let identity = printer.identity();
                match self.printers.iter_mut().find(|p| p.identity() == identity) {
                    Some(existing) => *existing = printer.clone(),
                    None => self.printers.push(printer.clone()),
                }
            }
            PrinterEvent::Removed { .. } => {
                let identity = event.identity();
                self.printers.retain(|p| p.identity() != identity);
            }
            PrinterEvent::StateChanged {
                state,
                accepting_jobs,
                ..
            } => {
                let identity = event.identity();
                if let Some(p) = self.printers.iter_mut().find(|p| p.identity() == identity) {
                    p.state = state.clone();
                    p.accepting_jobs = *accepting_jobs;
                }
            }
        }
    }
}

/// Backend transport backed by process memory.
#[derive(Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    sender: UnboundedSender<PrinterEvent>,
    push_events: bool,
}

impl MemoryTransport {
    /// Create an empty transport. With `push_events` off, printer changes
    /// update the cache silently, like backends without notifications.
    pub fn new(push_events: bool) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let state = State {
            printers: Vec::new(),
            capabilities: HashMap::new(),
            failing: HashSet::new(),
            events,
            reject_jobs: false,
            next_job_id: 1,
            submissions: Vec::new(),
            refreshes: 0,
            capability_queries: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            sender,
            push_events,
        }
    }

    /// Create a transport whose cache is seeded from a JSON printer list.
    pub fn from_json(json: &str, push_events: bool) -> Result<Self> {
        let printers: Vec<BackendPrinter> = serde_json::from_str(json)?;
        let transport = Self::new(push_events);
        for printer in printers {
            transport.seed_printer(printer);
        }
        Ok(transport)
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.sender.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory transport lock poisoned")
    }

    /// Put a printer in the cache without announcing it.
    pub fn seed_printer(&self, printer: BackendPrinter) {
        self.lock().apply(&PrinterEvent::Added(printer));
    }

    /// A backend announced a new printer.
    pub fn add_printer(&self, printer: BackendPrinter) {
        self.publish(PrinterEvent::Added(printer));
    }

    /// A backend withdrew a printer.
    pub fn remove_printer(&self, id: &str, backend_name: &str) {
        self.publish(PrinterEvent::Removed {
            id: id.to_owned(),
            backend_name: backend_name.to_owned(),
        });
    }

    pub fn change_state(&self, id: &str, backend_name: &str, state: &str, accepting_jobs: bool) {
        self.publish(PrinterEvent::StateChanged {
            id: id.to_owned(),
            backend_name: backend_name.to_owned(),
            state: state.to_owned(),
            accepting_jobs,
        });
    }

    fn publish(&self, event: PrinterEvent) {
        if self.push_events {
            // The receiver lives in `state`, so the channel cannot be closed here.
            let _ = self.sender.send(event);
        } else {
            self.lock().apply(&event);
        }
    }

    pub fn set_capabilities(&self, identity: PrinterIdentity, options: Vec<BackendOption>) {
        let mut state = self.lock();
        state.failing.remove(&identity);
        state.capabilities.insert(identity, options);
    }

    /// Make capability queries for `identity` fail.
    pub fn fail_capabilities(&self, identity: PrinterIdentity) {
        self.lock().failing.insert(identity);
    }

    /// Answer every following submission with the invalid job id.
    pub fn reject_jobs(&self, reject: bool) {
        self.lock().reject_jobs = reject;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.lock().refreshes
    }

    pub fn capability_queries(&self) -> usize {
        self.lock().capability_queries
    }
}

impl BackendTransport for MemoryTransport {
    fn supports_events(&self) -> bool {
        self.push_events
    }

    fn printers(&self) -> Vec<BackendPrinter> {
        self.lock().printers.clone()
    }

    fn take_events(&mut self) -> Vec<PrinterEvent> {
        let mut state = self.lock();
        let mut drained = Vec::new();
        while let Ok(event) = state.events.try_recv() {
            state.apply(&event);
            drained.push(event);
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "drained backend notifications");
        }
        drained
    }

    fn refresh(&mut self) {
        self.lock().refreshes += 1;
    }

    fn query_capabilities(&self, printer: &BackendPrinter) -> Result<Vec<BackendOption>> {
        let identity = printer.identity();
        let mut state = self.lock();
        state.capability_queries += 1;
        if state.failing.contains(&identity) {
            return Err(CpdError::CapabilityQuery {
                printer: identity.to_string(),
                detail: "backend did not answer".into(),
            });
        }
        Ok(state.capabilities.get(&identity).cloned().unwrap_or_default())
    }

    fn submit_job(
        &mut self,
        printer: &BackendPrinter,
        file: &Path,
        options: &JobOptionSet,
    ) -> Result<BackendJobId> {
        let identity = printer.identity();
        let content = std::fs::read(file)?;
        let mut state = self.lock();
        let Some(cached) = state.printers.iter().find(|p| p.identity() == identity) else {
            return Err(CpdError::UnknownPrinter(identity.to_string()));
        };
        if !cached.accepting_jobs {
            warn!(printer = %identity, "printer is not accepting jobs");
            return Err(CpdError::Submission(format!("{identity} is not accepting jobs")));
        }
        let job_id = if state.reject_jobs {
            BackendJobId::INVALID
        } else {
            let id = BackendJobId(state.next_job_id);
            state.next_job_id += 1;
            id
        };
        info!(printer = %identity, job_id = %job_id, options = options.len(), "job received");
        state.submissions.push(Submission {
            printer: identity,
            path: file.to_path_buf(),
            options: options.clone(),
            content,
            job_id,
        });
        Ok(job_id)
    }
}

/// Calls received by [`StubFallback`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCall {
    Initialize,
    StartSpool { printer: String, quick_command: bool },
    EndSpool { printer: String, job_title: String },
    SetupJob { printer: String },
    CheckChanged,
}

/// Fallback manager with a fixed printer list and no spooler of its own.
#[derive(Debug, Clone, Default)]
pub struct StubFallback {
    printers: Vec<FallbackPrinter>,
    calls: Arc<Mutex<Vec<FallbackCall>>>,
}

impl StubFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(mut self, printer: FallbackPrinter) -> Self {
        self.printers.push(printer);
        self
    }

    pub fn calls(&self) -> Vec<FallbackCall> {
        self.calls.lock().expect("fallback call log poisoned").clone()
    }

    fn record(&self, call: FallbackCall) {
        self.calls.lock().expect("fallback call log poisoned").push(call);
    }
}

impl FallbackManager for StubFallback {
    fn initialize(&mut self) -> Vec<FallbackPrinter> {
        self.record(FallbackCall::Initialize);
        self.printers.clone()
    }

    fn start_spool(&mut self, printer_name: &str, quick_command: bool) -> Option<SpoolFile> {
        warn!(printer = printer_name, "fallback manager has no spooler");
        self.record(FallbackCall::StartSpool {
            printer: printer_name.to_owned(),
            quick_command,
        });
        None
    }

    fn end_spool(
        &mut self,
        printer_name: &str,
        job_title: &str,
        _file: SpoolFile,
        _job: &JobData,
        _banner: bool,
        _fax_number: &str,
    ) -> bool {
        self.record(FallbackCall::EndSpool {
            printer: printer_name.to_owned(),
            job_title: job_title.to_owned(),
        });
        false
    }

    fn setup_job_context_data(&mut self, job: &mut JobData) {
        self.record(FallbackCall::SetupJob {
            printer: job.printer_name.clone(),
        });
        let driver = Arc::new(DriverDescription::generic());
        job.context = OptionContext::new(Arc::clone(&driver));
        job.driver = Some(driver);
    }

    fn check_printers_changed(&mut self) -> bool {
        self.record(FallbackCall::CheckChanged);
        false
    }
}
