// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job option serialization.
//
// Turns a job's settings into the ordered option list handed to the backend
// with `submit_job`. Driver-side key and value names are mapped back to the
// backend's vocabulary with the exact inverse of the translator tables.

use tracing::{debug, trace};

use cpdlink_core::types::{JobData, JobOptionSet};

use crate::translator::{backend_option_name, backend_value_name};

pub const JOB_NAME: &str = "job-name";
pub const COPIES: &str = "copies";
pub const DOCUMENT_HANDLING: &str = "multiple-document-handling";
pub const JOB_SHEETS: &str = "job-sheets";
pub const ORIENTATION: &str = "orientation-requested";

const COLLATED: &str = "separate-documents-collated-copies";
const UNCOLLATED: &str = "separate-documents-uncollated-copies";

/// Name shown in the backend queue. A fax number replaces the title.
pub fn job_name<'a>(job_title: &'a str, fax_number: &'a str) -> &'a str {
    if fax_number.is_empty() {
        job_title
    } else {
        fax_number
    }
}

/// Options derived from the job's settings, in submission order.
///
/// Modified capability values are only carried over when the job's driver
/// is the very model its option context was built against; otherwise they
/// are skipped.
pub fn job_options(job: &JobData, banner: bool) -> JobOptionSet {
    let mut options = JobOptionSet::new();

    if job.context_matches_driver() {
        for (key, value) in job.context.modified() {
            if value.name().is_empty() {
                trace!(key = key.name(), "skipping modified key without a value");
                continue;
            }
            options.insert(
                backend_option_name(key.name()),
                backend_value_name(key.name(), value.name()),
            );
        }
    } else if job.context.count_modified() > 0 {
        debug!(
            printer = %job.printer_name,
            modified = job.context.count_modified(),
            "option context belongs to another driver, ignoring modifications"
        );
    }

    if job.copies > 1 {
        options.insert(COPIES, job.copies.to_string());
        options.insert(
            DOCUMENT_HANDLING,
            if job.collate { COLLATED } else { UNCOLLATED },
        );
    }
    if !banner {
        options.insert(JOB_SHEETS, "none");
    }
    if let Some(keyword) = job.orientation.and_then(|o| o.backend_keyword()) {
        options.insert(ORIENTATION, keyword);
    }

    options
}

/// The full list submitted to the backend: `job-name` first, then
/// [`job_options`].
pub fn submission_options(job_name: &str, job: &JobData, banner: bool) -> JobOptionSet {
    let mut options = job_options(job, banner);
    options.prepend(JOB_NAME, job_name);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cpdlink_core::driver::{CapabilityKey, DriverDescription, OptionContext};
    use cpdlink_core::types::Orientation;

    fn duplex_driver() -> Arc<DriverDescription> {
        let mut duplex = CapabilityKey::new("Duplex");
        for value in ["None", "DuplexNoTumble", "DuplexTumble"] {
            duplex.insert_value(value);
        }
        duplex.set_default(0);

        let mut page = CapabilityKey::new("PageSize");
        for value in ["iso_a4_210x297mm", "na_letter_8.5x11in"] {
            page.insert_value(value);
        }
        page.set_default(0);

        let mut quality = CapabilityKey::new("print-quality");
        quality.insert_value("normal");
        quality.insert_value("high");
        quality.set_default(0);

        Arc::new(DriverDescription::new("P1, CUPS", vec![duplex, page, quality]))
    }

    fn job_with(driver: &Arc<DriverDescription>) -> JobData {
        let mut job = JobData::new("CPD:P1, CUPS");
        job.driver = Some(Arc::clone(driver));
        job.context = OptionContext::new(Arc::clone(driver));
        job
    }

    #[test]
    fn fax_number_wins_over_title() {
        assert_eq!(job_name("Report", ""), "Report");
        assert_eq!(job_name("Report", "+44 20 7946 0000"), "+44 20 7946 0000");
    }

    #[test]
    fn copies_collate_no_banner_portrait() {
        let mut job = JobData::new("CPD:P1, CUPS");
        job.copies = 3;
        job.collate = true;
        job.orientation = Some(Orientation::Portrait);

        let options = job_options(&job, false);
        let entries: Vec<_> = options.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("copies", "3"),
                ("multiple-document-handling", "separate-documents-collated-copies"),
                ("job-sheets", "none"),
                ("orientation-requested", "portrait"),
            ]
        );
    }

    #[test]
    fn single_copy_with_banner_adds_nothing() {
        let mut job = JobData::new("P");
        job.collate = true;
        assert!(job_options(&job, true).is_empty());
    }

    #[test]
    fn uncollated_copies() {
        let mut job = JobData::new("P");
        job.copies = 2;
        let options = job_options(&job, true);
        assert_eq!(options.get(DOCUMENT_HANDLING), Some(UNCOLLATED));
        assert_eq!(options.get(COPIES), Some("2"));
    }

    #[test]
    fn only_portrait_and_landscape_are_sent() {
        let mut job = JobData::new("P");
        job.orientation = Some(Orientation::Landscape);
        assert_eq!(job_options(&job, true).get(ORIENTATION), Some("landscape"));

        job.orientation = Some(Orientation::ReverseLandscape);
        assert!(job_options(&job, true).get(ORIENTATION).is_none());

        job.orientation = None;
        assert!(job_options(&job, true).get(ORIENTATION).is_none());
    }

    #[test]
    fn modified_keys_are_inverse_mapped() {
        let driver = duplex_driver();
        let mut job = job_with(&driver);
        assert!(job.context.set_value("Duplex", "DuplexTumble"));
        assert!(job.context.set_value("PageSize", "na_letter_8.5x11in"));
        assert!(job.context.set_value("print-quality", "high"));

        let options = job_options(&job, true);
        assert_eq!(options.get("sides"), Some("two-sided-short-edge"));
        assert_eq!(options.get("media"), Some("na_letter_8.5x11in"));
        assert_eq!(options.get("print-quality"), Some("high"));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn duplex_none_maps_to_one_sided() {
        let driver = duplex_driver();
        let mut job = job_with(&driver);
        job.context.set_value("Duplex", "DuplexNoTumble");
        job.context.set_value("Duplex", "None");
        assert_eq!(job_options(&job, true).get("sides"), Some("one-sided"));
    }

    #[test]
    fn foreign_context_is_ignored() {
        let driver = duplex_driver();
        let other = duplex_driver();
        let mut job = job_with(&driver);
        job.context = OptionContext::new(Arc::clone(&other));
        job.context.set_value("Duplex", "DuplexTumble");

        assert!(!job.context_matches_driver());
        assert!(job_options(&job, true).get("sides").is_none());
    }

    #[test]
    fn submission_list_starts_with_job_name() {
        let mut job = JobData::new("P");
        job.copies = 2;
        let options = submission_options("Report", &job, false);
        let first = options.iter().next();
        assert_eq!(first, Some(("job-name", "Report")));
        assert_eq!(options.len(), 4);
    }
}
