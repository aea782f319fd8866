// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the cpdlink print-backend manager.

use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::driver::{DriverDescription, OptionContext};

/// Prefix of the driver tag that marks a printer record as backend-owned.
pub const DRIVER_PREFIX: &str = "CPD";

/// Unique printer key across all backends: `"<id>, <backend>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrinterIdentity(String);

impl PrinterIdentity {
    /// Build the identity of a backend printer.
    pub fn new(id: &str, backend_name: &str) -> Self {
        Self(format!("{id}, {backend_name}"))
    }

    /// Wrap an already-formed identity, e.g. a fallback printer's name.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Recover the identity from a printer name or a `CPD:`-prefixed driver tag.
    pub fn from_name_or_tag(name: &str) -> Self {
        Self(strip_driver_prefix(name).to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The driver tag recorded on backend-owned printer records.
    pub fn driver_tag(&self) -> String {
        format!("{DRIVER_PREFIX}:{}", self.0)
    }
}

impl std::fmt::Display for PrinterIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a leading `CPD:` tag, returning the input unchanged otherwise.
pub fn strip_driver_prefix(name: &str) -> &str {
    name.strip_prefix(DRIVER_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(name)
}

/// A printer object as reported by the backend service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPrinter {
    /// Backend-local printer id.
    pub id: String,
    /// Human-readable printer name.
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub make_and_model: String,
    /// Backend state keyword (e.g. "idle", "printing", "stopped").
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_accepting_jobs")]
    pub accepting_jobs: bool,
    /// Name of the backend that owns this printer (e.g. "CUPS").
    pub backend_name: String,
}

fn default_accepting_jobs() -> bool {
    true
}

impl BackendPrinter {
    pub fn identity(&self) -> PrinterIdentity {
        PrinterIdentity::new(&self.id, &self.backend_name)
    }

    /// Name shown to users: `"<name>, <backend>"`.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.backend_name)
    }
}

/// A printer contributed by the fallback printer-info manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPrinter {
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub location: String,
    /// Non-empty for special purpose printers (PDF export, fax).
    #[serde(default)]
    pub features: String,
}

/// Notifications delivered by the backend transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterEvent {
    Added(BackendPrinter),
    Removed {
        id: String,
        backend_name: String,
    },
    StateChanged {
        id: String,
        backend_name: String,
        state: String,
        accepting_jobs: bool,
    },
}

impl PrinterEvent {
    /// Identity of the printer this event is about.
    pub fn identity(&self) -> PrinterIdentity {
        match self {
            Self::Added(printer) => printer.identity(),
            Self::Removed { id, backend_name } | Self::StateChanged { id, backend_name, .. } => {
                PrinterIdentity::new(id, backend_name)
            }
        }
    }
}

/// One capability as reported by the backend's option query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOption {
    pub name: String,
    pub default_value: String,
    #[serde(default)]
    pub supported_values: Vec<String>,
}

impl BackendOption {
    pub fn new(name: &str, default_value: &str, supported_values: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            default_value: default_value.to_owned(),
            supported_values: supported_values.iter().map(|v| (*v).to_owned()).collect(),
        }
    }
}

/// Job identifier assigned by the backend on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendJobId(pub i32);

impl BackendJobId {
    /// Sentinel returned by backends that refused the job.
    pub const INVALID: Self = Self(-1);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl std::fmt::Display for BackendJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
    ReversePortrait,
    ReverseLandscape,
}

impl Orientation {
    /// `orientation-requested` keyword understood by the backends.
    ///
    /// Only portrait and landscape are forwarded.
    pub fn backend_keyword(&self) -> Option<&'static str> {
        match self {
            Self::Portrait => Some("portrait"),
            Self::Landscape => Some("landscape"),
            Self::ReversePortrait | Self::ReverseLandscape => None,
        }
    }
}

/// Per-job settings handed to the spooler.
///
/// `driver` and `context` are filled in by `setup_job_context_data`; option
/// values the user changed are recorded as modifications on `context`.
#[derive(Debug, Clone)]
pub struct JobData {
    pub printer_name: String,
    pub copies: u32,
    pub collate: bool,
    pub orientation: Option<Orientation>,
    pub driver: Option<Arc<DriverDescription>>,
    pub context: OptionContext,
}

impl JobData {
    pub fn new(printer_name: impl Into<String>) -> Self {
        Self {
            printer_name: printer_name.into(),
            copies: 1,
            collate: false,
            orientation: None,
            driver: None,
            context: OptionContext::default(),
        }
    }

    /// Whether the job's driver and its option context describe the same model.
    pub fn context_matches_driver(&self) -> bool {
        match (&self.driver, self.context.driver()) {
            (Some(job), Some(ctx)) => Arc::ptr_eq(job, ctx),
            _ => false,
        }
    }
}

/// Ordered option name/value list submitted with a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptionSet(Vec<(String, String)>);

impl JobOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option, replacing an earlier value for the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Insert an option in front of all others.
    pub fn prepend(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.0.retain(|(n, _)| *n != name);
        self.0.insert(0, (name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Opaque key of a staging file handed out by `start_spool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpoolId(pub Uuid);

impl SpoolId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpoolId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writable staging file for one print job.
///
/// The host writes rendered job content into it and passes it back to
/// `end_spool`, which consumes the handle.
#[derive(Debug)]
pub struct SpoolFile {
    id: SpoolId,
    file: File,
}

impl SpoolFile {
    pub fn new(id: SpoolId, file: File) -> Self {
        Self { id, file }
    }

    pub fn id(&self) -> SpoolId {
        self.id
    }

    /// Flush and close the underlying file.
    pub fn close(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }
}

impl Write for SpoolFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
