// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staging files for jobs headed to a print backend.
//
// `start` creates a uniquely named file in the spool directory and hands out
// its write handle; the coordinator keeps the path. `finish` submits the file
// and removes it from disk and from the staging map whatever the outcome.
// Paths are held as `tempfile::TempPath`, so anything still staged when the
// coordinator is dropped is unlinked too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tracing::{debug, info, instrument, warn};

use cpdlink_bridge::traits::BackendTransport;
use cpdlink_core::config::CpdConfig;
use cpdlink_core::error::{CpdError, Result};
use cpdlink_core::types::{BackendJobId, BackendPrinter, JobOptionSet, SpoolFile, SpoolId};

pub struct SpoolCoordinator {
    dir: PathBuf,
    prefix: String,
    staged: HashMap<SpoolId, TempPath>,
}

impl SpoolCoordinator {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            staged: HashMap::new(),
        }
    }

    /// Spool into `config.spool_dir`, or the system temp directory.
    pub fn from_config(config: &CpdConfig) -> Self {
        let dir = config.spool_dir.clone().unwrap_or_else(std::env::temp_dir);
        Self::new(dir, config.spool_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a staging file. Returns `None` when it cannot be created.
    pub fn start(&mut self) -> Option<SpoolFile> {
        let named = match Builder::new().prefix(&self.prefix).tempfile_in(&self.dir) {
            Ok(named) => named,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot create staging file");
                return None;
            }
        };
        let (file, path) = named.into_parts();
        let id = SpoolId::new();
        debug!(spool_id = %id, path = %path.display(), "staging file created");
        self.staged.insert(id, path);
        Some(SpoolFile::new(id, file))
    }

    /// Close, submit and unlink a staging file.
    ///
    /// Fails with [`CpdError::ForeignSpoolFile`] for handles this coordinator
    /// did not hand out, giving the handle back untouched, and with [`CpdError::JobRejected`] when the backend
    /// answers with the invalid job id.
    #[instrument(skip_all, fields(spool_id = %file.id(), printer = %printer.identity()))]
    pub fn finish(
        &mut self,
        file: SpoolFile,
        transport: &mut dyn BackendTransport,
        printer: &BackendPrinter,
        options: &JobOptionSet,
    ) -> Result<BackendJobId> {
        let Some(path) = self.staged.remove(&file.id()) else {
            warn!("refusing spool handle not staged here");
            return Err(CpdError::ForeignSpoolFile(file));
        };

        let outcome = submit(file, &path, transport, printer, options);

        let shown = path.display().to_string();
        if let Err(e) = path.close() {
            warn!(path = %shown, error = %e, "cannot remove staging file");
        }
        outcome
    }

    pub fn is_staged(&self, id: SpoolId) -> bool {
        self.staged.contains_key(&id)
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

fn submit(
    file: SpoolFile,
    path: &Path,
    transport: &mut dyn BackendTransport,
    printer: &BackendPrinter,
    options: &JobOptionSet,
) -> Result<BackendJobId> {
    file.close()?;
    let job_id = transport.submit_job(printer, path, options)?;
    if !job_id.is_valid() {
        return Err(CpdError::JobRejected(printer.identity().to_string()));
    }
    info!(job_id = %job_id, options = options.len(), "job submitted");
    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use cpdlink_bridge::stub::MemoryTransport;
    use cpdlink_core::types::PrinterIdentity;

    fn printer() -> BackendPrinter {
        BackendPrinter {
            id: "P1".into(),
            name: "Office".into(),
            info: String::new(),
            location: String::new(),
            make_and_model: String::new(),
            state: "idle".into(),
            accepting_jobs: true,
            backend_name: "CUPS".into(),
        }
    }

    fn setup() -> (tempfile::TempDir, SpoolCoordinator, MemoryTransport) {
        let dir = tempfile::tempdir().expect("tempdir");
        let spool = SpoolCoordinator::new(dir.path(), "job-");
        let transport = MemoryTransport::new(false);
        transport.seed_printer(printer());
        (dir, spool, transport)
    }

    fn dir_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read spool dir").count()
    }

    #[test]
    fn start_creates_prefixed_file() {
        let (dir, mut spool, _transport) = setup();
        let file = spool.start().expect("staging file");
        assert!(spool.is_staged(file.id()));

        let name = std::fs::read_dir(dir.path())
            .expect("read spool dir")
            .next()
            .expect("one entry")
            .expect("dir entry")
            .file_name();
        assert!(name.to_string_lossy().starts_with("job-"));
    }

    #[test]
    fn finish_submits_content_and_cleans_up() {
        let (dir, mut spool, mut transport) = setup();
        let mut file = spool.start().expect("staging file");
        file.write_all(b"%!PS\n").expect("write");

        let mut options = JobOptionSet::new();
        options.insert("job-name", "Report");
        let job_id = spool
            .finish(file, &mut transport, &printer(), &options)
            .expect("submitted");

        assert!(job_id.is_valid());
        assert_eq!(spool.staged_count(), 0);
        assert_eq!(dir_entries(dir.path()), 0);

        let submissions = transport.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].content, b"%!PS\n");
        assert_eq!(submissions[0].printer, PrinterIdentity::new("P1", "CUPS"));
        assert_eq!(submissions[0].options.get("job-name"), Some("Report"));
    }

    #[test]
    fn rejected_job_still_cleans_up() {
        let (dir, mut spool, mut transport) = setup();
        transport.reject_jobs(true);
        let file = spool.start().expect("staging file");

        let err = spool
            .finish(file, &mut transport, &printer(), &JobOptionSet::new())
            .expect_err("rejected");
        assert!(matches!(err, CpdError::JobRejected(_)));
        assert_eq!(spool.staged_count(), 0);
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[test]
    fn transport_error_still_cleans_up() {
        let (dir, mut spool, _) = setup();
        let mut empty = MemoryTransport::new(false);
        let file = spool.start().expect("staging file");

        let err = spool
            .finish(file, &mut empty, &printer(), &JobOptionSet::new())
            .expect_err("unknown printer");
        assert!(matches!(err, CpdError::UnknownPrinter(_)));
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[test]
    fn foreign_handle_is_refused() {
        let (dir, mut spool, mut transport) = setup();
        let ours = spool.start().expect("staging file");

        let outside = tempfile::tempfile().expect("foreign file");
        let foreign_id = SpoolId::new();
        let foreign = SpoolFile::new(foreign_id, outside);
        let err = spool
            .finish(foreign, &mut transport, &printer(), &JobOptionSet::new())
            .expect_err("foreign");
        let CpdError::ForeignSpoolFile(mut returned) = err else {
            panic!("expected the handle back");
        };
        assert_eq!(returned.id(), foreign_id);
        returned.write_all(b"still usable").expect("write to returned handle");
        returned.close().expect("close returned handle");

        assert!(spool.is_staged(ours.id()));
        assert_eq!(dir_entries(dir.path()), 1);
        assert!(transport.submissions().is_empty());
    }

    #[test]
    fn missing_directory_yields_no_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut spool = SpoolCoordinator::new(dir.path().join("absent"), "job-");
        assert!(spool.start().is_none());
        assert_eq!(spool.staged_count(), 0);
    }

    #[test]
    fn dropping_coordinator_unlinks_leftovers() {
        let (dir, mut spool, _) = setup();
        let _file = spool.start().expect("staging file");
        assert_eq!(dir_entries(dir.path()), 1);
        drop(spool);
        assert_eq!(dir_entries(dir.path()), 0);
    }
}
