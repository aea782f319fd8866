// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for capability translation and job option building in
// the cpdlink-print crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use cpdlink_core::driver::OptionContext;
use cpdlink_core::types::{BackendOption, JobData, Orientation, PrinterIdentity};
use cpdlink_print::job_options::submission_options;
use cpdlink_print::translator::translate;

/// A capability list shaped like a busy office printer's.
fn office_printer_options() -> Vec<BackendOption> {
    let mut options = vec![
        BackendOption::new(
            "media",
            "iso_a4_210x297mm",
            &[
                "iso_a4_210x297mm",
                "iso_a5_148x210mm",
                "iso_a3_297x420mm",
                "na_letter_8.5x11in",
                "na_legal_8.5x14in",
            ],
        ),
        BackendOption::new(
            "sides",
            "two-sided-long-edge",
            &["one-sided", "two-sided-long-edge", "two-sided-short-edge"],
        ),
        BackendOption::new("printer-resolution", "600dpi", &["300dpi", "600dpi", "1200dpi"]),
        BackendOption::new("print-color-mode", "color", &["color", "monochrome"]),
        BackendOption::new("printer-location", "NA", &[]),
    ];
    for i in 0..35 {
        let values: Vec<String> = (0..6).map(|v| format!("value-{v}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        options.push(BackendOption::new(&format!("vendor-option-{i}"), "value-2", &refs));
    }
    options
}

fn bench_translate(c: &mut Criterion) {
    let identity = PrinterIdentity::new("office-mfp", "CUPS");
    let options = office_printer_options();

    c.bench_function("translate (40 options)", |b| {
        b.iter(|| translate(black_box(&identity), "Office MFP", black_box(&options)))
    });
}

fn bench_submission_options(c: &mut Criterion) {
    let identity = PrinterIdentity::new("office-mfp", "CUPS");
    let Ok(translation) = translate(&identity, "Office MFP", &office_printer_options()) else {
        return;
    };
    let driver = Arc::clone(&translation.driver);
    let mut job = JobData::new(identity.to_string());
    job.copies = 2;
    job.collate = true;
    job.orientation = Some(Orientation::Landscape);
    job.context = OptionContext::new(Arc::clone(&driver));
    job.driver = Some(driver);
    job.context.set_value("Duplex", "DuplexTumble");
    job.context.set_value("PageSize", "na_letter_8.5x11in");
    for i in 0..10 {
        job.context.set_value(&format!("vendor-option-{i}"), "value-5");
    }

    c.bench_function("submission_options (12 modified keys)", |b| {
        b.iter(|| submission_options("Quarterly report", black_box(&job), false))
    });
}

criterion_group!(benches, bench_translate, bench_submission_options);
criterion_main!(benches);
