//! Evidence capture and report generation.
//!
//! Screenshots are keyed by outcome and attached to a per-scenario
//! report node; the accumulated report is flushed to an HTML artifact
//! exactly once at process end. Everything in this module is
//! best-effort by design: a broken screenshot pipeline must never fail
//! a test that would otherwise pass (or change why one failed).

pub mod html;
pub mod junit;
pub mod report;
pub mod screenshot;

use std::path::PathBuf;

pub use report::{Capturer, ReportHub, RunMeta, SessionCapturer, Status};
pub use screenshot::Prefix;

/// Errors raised while producing evidence artifacts. Callers downgrade
/// these to warnings; they never fail a scenario.
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no active session to capture from")]
    NoSession,

    #[error("report already flushed")]
    AlreadyFlushed,

    #[error(transparent)]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}
