// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for cpdlink.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SpoolFile;

/// Top-level error type for all cpdlink operations.
#[derive(Debug, Error)]
pub enum CpdError {
    // -- Transport errors --
    #[error("print backend transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("no print backends installed: {0}")]
    BackendsMissing(String),

    // -- Capability errors --
    #[error("capability query failed for {printer}: {detail}")]
    CapabilityQuery { printer: String, detail: String },

    #[error("backend reported no capabilities for {0}")]
    NoCapabilities(String),

    // -- Registry errors --
    #[error("unknown printer: {0}")]
    UnknownPrinter(String),

    // -- Spooling errors --
    /// Carries the refused handle back to the caller.
    #[error("spool file {} was not created by this backend", .0.id())]
    ForeignSpoolFile(SpoolFile),

    #[error("backend rejected job for {0}")]
    JobRejected(String),

    #[error("job submission failed: {0}")]
    Submission(String),

    // -- Ambient --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Whether an error takes the whole backend down or only the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The backend cannot be used at all; callers run on the fallback manager.
    Fatal,
    /// Affects one printer or one job; logged and degraded locally.
    Recoverable,
}

impl CpdError {
    /// Classify this error for the facade's degrade-or-abort decision.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::TransportUnavailable(_) | Self::BackendsMissing(_) | Self::Config(_) => {
                ErrorClass::Fatal
            }
            Self::CapabilityQuery { .. }
            | Self::NoCapabilities(_)
            | Self::UnknownPrinter(_)
            | Self::ForeignSpoolFile(_)
            | Self::JobRejected(_)
            | Self::Submission(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorClass::Recoverable,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CpdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_fatal() {
        let err = CpdError::TransportUnavailable("no session bus".into());
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(
            CpdError::BackendsMissing("/nowhere".into()).class(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn per_printer_errors_are_recoverable() {
        let err = CpdError::NoCapabilities("P1, CUPS".into());
        assert_eq!(err.class(), ErrorClass::Recoverable);
        assert_eq!(
            CpdError::JobRejected("P1, CUPS".into()).class(),
            ErrorClass::Recoverable
        );
    }

    #[test]
    fn capability_query_message_names_printer() {
        let err = CpdError::CapabilityQuery {
            printer: "P1, CUPS".into(),
            detail: "timed out".into(),
        };
        assert_eq!(
            err.to_string(),
            "capability query failed for P1, CUPS: timed out"
        );
    }
}
