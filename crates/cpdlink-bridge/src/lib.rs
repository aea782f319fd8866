// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cpdlink bridge — seams to the collaborators this crate family does not
// implement: the print-backend transport (bus connection, name ownership,
// signal subscription) and the generic printer-info manager used for every
// printer the backend does not own.

pub mod stub;
pub mod traits;

pub use stub::{EventSender, FallbackCall, MemoryTransport, StubFallback, Submission};
pub use traits::{BackendTransport, FallbackManager};
