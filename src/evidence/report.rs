//! Per-scenario report nodes and the process-wide report document.
//!
//! Each worker holds at most one open report node at a time; nodes are
//! parallel-safe because they are keyed by worker, never shared. The
//! underlying document is written exactly once by [`ReportHub::flush`],
//! after the caller has joined every worker -- the hub records, it does
//! not enforce that ordering.
//!
//! Screenshot capture is reached through the [`Capturer`] seam so that
//! a failing capture path can be exercised without a browser; capture
//! errors are always downgraded to a warning entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::{html, screenshot, EvidenceError, Prefix};
use crate::session::{SessionRegistry, WorkerId};

/// Status of a single report entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Info,
    Pass,
    Fail,
    Warning,
    Skip,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Info => "INFO",
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Warning => "WARNING",
            Status::Skip => "SKIP",
        }
    }
}

/// One styled log line within a test node.
#[derive(Clone, Debug)]
pub struct ReportEntry {
    pub at: DateTime<Local>,
    pub status: Status,
    pub message: String,
    pub screenshot: Option<PathBuf>,
    pub screenshot_title: Option<String>,
}

/// One test/scenario's worth of evidence. A node belongs to exactly one
/// scenario and is never re-attached.
#[derive(Clone, Debug)]
pub struct TestNode {
    pub name: String,
    pub description: String,
    pub class: String,
    pub author: String,
    pub started_at: DateTime<Local>,
    pub outcome: Status,
    pub entries: Vec<ReportEntry>,
}

/// Run-level metadata shown in the report header.
#[derive(Clone, Debug)]
pub struct RunMeta {
    pub run_id: uuid::Uuid,
    pub app_url: String,
    pub browser: String,
    pub environment: String,
    pub os: String,
    pub execution_mode: String,
    pub grid_enabled: bool,
    pub started_at: DateTime<Local>,
}

/// Seam for failure-screenshot capture, so the downgrade-to-warning
/// contract is testable without a live browser.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(
        &self,
        worker: WorkerId,
        prefix: Prefix,
        name: &str,
    ) -> Result<PathBuf, EvidenceError>;
}

/// Captures from the worker's registered session, checking
/// `is_initialized` first rather than failing on an absent session.
pub struct SessionCapturer {
    registry: Arc<SessionRegistry>,
    dir: PathBuf,
}

impl SessionCapturer {
    pub fn new(registry: Arc<SessionRegistry>, dir: PathBuf) -> Self {
        Self { registry, dir }
    }
}

#[async_trait]
impl Capturer for SessionCapturer {
    async fn capture(
        &self,
        worker: WorkerId,
        prefix: Prefix,
        name: &str,
    ) -> Result<PathBuf, EvidenceError> {
        if !self.registry.is_initialized(worker) {
            return Err(EvidenceError::NoSession);
        }
        let driver = self
            .registry
            .get(worker)
            .map_err(|_| EvidenceError::NoSession)?;
        screenshot::capture(&driver, &self.dir, prefix, name).await
    }
}

struct HubState {
    active: HashMap<WorkerId, TestNode>,
    finished: Vec<TestNode>,
}

/// Collects report nodes from all workers and writes the final document.
pub struct ReportHub {
    meta: RunMeta,
    report_dir: PathBuf,
    title: String,
    name: String,
    theme: String,
    capturer: Option<Arc<dyn Capturer>>,
    state: Mutex<HubState>,
    flushed: AtomicBool,
}

impl ReportHub {
    pub fn new(
        meta: RunMeta,
        report_dir: PathBuf,
        title: String,
        name: String,
        theme: String,
    ) -> Self {
        Self {
            meta,
            report_dir,
            title,
            name,
            theme,
            capturer: None,
            state: Mutex::new(HubState {
                active: HashMap::new(),
                finished: Vec::new(),
            }),
            flushed: AtomicBool::new(false),
        }
    }

    pub fn with_capturer(mut self, capturer: Arc<dyn Capturer>) -> Self {
        self.capturer = Some(capturer);
        self
    }

    /// Open a report node for the worker's current scenario.
    pub fn start_test(&self, worker: WorkerId, name: &str, description: &str, class: &str) {
        let node = TestNode {
            name: name.to_string(),
            description: description.to_string(),
            class: class.to_string(),
            author: "Automation Team".to_string(),
            started_at: Local::now(),
            outcome: Status::Info,
            entries: Vec::new(),
        };
        let mut state = self.lock();
        if let Some(orphan) = state.active.insert(worker, node) {
            warn!(
                "{worker} opened '{name}' while '{}' was still active",
                orphan.name
            );
            state.finished.push(orphan);
        }
        info!("test started: {name}");
    }

    /// Append a styled log line to the worker's open node.
    pub fn log(&self, worker: WorkerId, status: Status, message: &str) {
        let mut state = self.lock();
        let Some(node) = state.active.get_mut(&worker) else {
            warn!("{worker} logged without an open report node: {message}");
            return;
        };
        node.entries.push(ReportEntry {
            at: Local::now(),
            status,
            message: message.to_string(),
            screenshot: None,
            screenshot_title: None,
        });
    }

    /// Record the scenario's outcome. A failing outcome also attempts a
    /// screenshot; capture failures become a warning entry and never
    /// propagate out of this method.
    pub async fn record_outcome(&self, worker: WorkerId, status: Status, message: &str) {
        self.log(worker, status, message);

        if status == Status::Fail {
            let name = self.lock().active.get(&worker).map(|n| n.name.clone());
            if let (Some(name), Some(capturer)) = (name, &self.capturer) {
                match capturer.capture(worker, Prefix::Failed, &name).await {
                    Ok(path) => self.attach_screenshot(worker, &path, "Failure Screenshot"),
                    Err(err) => {
                        warn!("failed to capture screenshot for '{name}': {err}");
                        self.log(
                            worker,
                            Status::Warning,
                            &format!("Failed to capture screenshot: {err}"),
                        );
                    }
                }
            }
        }

        if let Some(node) = self.lock().active.get_mut(&worker) {
            node.outcome = status;
        }
    }

    /// Attach an existing artifact to the worker's open node.
    /// Best-effort: with no open node this only logs.
    pub fn attach_screenshot(&self, worker: WorkerId, path: &Path, title: &str) {
        let mut state = self.lock();
        let Some(node) = state.active.get_mut(&worker) else {
            warn!(
                "{worker} attached a screenshot without an open report node: {}",
                path.display()
            );
            return;
        };
        node.entries.push(ReportEntry {
            at: Local::now(),
            status: Status::Info,
            message: title.to_string(),
            screenshot: Some(path.to_path_buf()),
            screenshot_title: Some(title.to_string()),
        });
    }

    /// Close the worker's open node and move it into the document.
    pub fn end_test(&self, worker: WorkerId) {
        let mut state = self.lock();
        if let Some(node) = state.active.remove(&worker) {
            state.finished.push(node);
        }
    }

    /// Serialize the accumulated report to a timestamped HTML file.
    /// Must be called exactly once, after all workers have finished;
    /// a second call fails with [`EvidenceError::AlreadyFlushed`].
    pub fn flush(&self) -> Result<PathBuf, EvidenceError> {
        if self.flushed.swap(true, Ordering::SeqCst) {
            return Err(EvidenceError::AlreadyFlushed);
        }

        let mut state = self.lock();
        let orphans: Vec<WorkerId> = state.active.keys().copied().collect();
        for worker in orphans {
            if let Some(node) = state.active.remove(&worker) {
                warn!("flushing with node '{}' still open on {worker}", node.name);
                state.finished.push(node);
            }
        }

        let document = html::render(&self.meta, &state.finished, &self.title, &self.name, &self.theme);

        std::fs::create_dir_all(&self.report_dir).map_err(|source| EvidenceError::Io {
            path: self.report_dir.clone(),
            source,
        })?;
        let path = self.report_dir.join(format!(
            "StorecheckReport_{}.html",
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        ));
        std::fs::write(&path, document).map_err(|source| EvidenceError::Io {
            path: path.clone(),
            source,
        })?;

        info!("report written to {}", path.display());
        Ok(path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        self.state.lock().expect("report hub lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> RunMeta {
        RunMeta {
            run_id: uuid::Uuid::new_v4(),
            app_url: "https://www.saucedemo.com".to_string(),
            browser: "chrome".to_string(),
            environment: "qa".to_string(),
            os: std::env::consts::OS.to_string(),
            execution_mode: "Headless".to_string(),
            grid_enabled: false,
            started_at: Local::now(),
        }
    }

    fn hub(dir: &Path) -> ReportHub {
        ReportHub::new(
            meta(),
            dir.to_path_buf(),
            "storecheck report".to_string(),
            "Storefront UI Regression".to_string(),
            "standard".to_string(),
        )
    }

    struct FailingCapturer;

    #[async_trait]
    impl Capturer for FailingCapturer {
        async fn capture(
            &self,
            _worker: WorkerId,
            _prefix: Prefix,
            _name: &str,
        ) -> Result<PathBuf, EvidenceError> {
            Err(EvidenceError::NoSession)
        }
    }

    struct StubCapturer(PathBuf);

    #[async_trait]
    impl Capturer for StubCapturer {
        async fn capture(
            &self,
            _worker: WorkerId,
            prefix: Prefix,
            name: &str,
        ) -> Result<PathBuf, EvidenceError> {
            Ok(self.0.join(screenshot::file_name(prefix, name, Local::now())))
        }
    }

    #[tokio::test]
    async fn capture_failure_does_not_escape_record_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let hub = hub(dir.path()).with_capturer(Arc::new(FailingCapturer));
        let worker = WorkerId(0);

        hub.start_test(worker, "checkout_flow", "Checkout happy path", "cart");
        hub.record_outcome(worker, Status::Fail, "checkout button missing")
            .await;
        hub.end_test(worker);

        let state = hub.lock();
        let node = &state.finished[0];
        // Overall failure status is unaffected by the capture failure;
        // the capture failure itself surfaces as a warning entry.
        assert_eq!(node.outcome, Status::Fail);
        assert!(node
            .entries
            .iter()
            .any(|e| e.status == Status::Warning
                && e.message.contains("Failed to capture screenshot")));
    }

    #[tokio::test]
    async fn failing_outcome_attaches_a_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let hub = hub(dir.path()).with_capturer(Arc::new(StubCapturer(dir.path().to_path_buf())));
        let worker = WorkerId(3);

        hub.start_test(worker, "login_bad_password", "Invalid login", "login");
        hub.record_outcome(worker, Status::Fail, "error banner mismatch")
            .await;
        hub.end_test(worker);

        let state = hub.lock();
        assert!(state.finished[0]
            .entries
            .iter()
            .any(|e| e.screenshot.is_some()));
    }

    #[tokio::test]
    async fn nodes_are_confined_to_their_worker() {
        let dir = tempfile::tempdir().unwrap();
        let hub = hub(dir.path());

        hub.start_test(WorkerId(0), "a", "", "suite");
        hub.start_test(WorkerId(1), "b", "", "suite");
        hub.log(WorkerId(0), Status::Info, "only for a");
        hub.end_test(WorkerId(0));
        hub.end_test(WorkerId(1));

        let state = hub.lock();
        let a = state.finished.iter().find(|n| n.name == "a").unwrap();
        let b = state.finished.iter().find(|n| n.name == "b").unwrap();
        assert_eq!(a.entries.len(), 1);
        assert!(b.entries.is_empty());
    }

    #[tokio::test]
    async fn flush_writes_once_and_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let hub = hub(dir.path());

        hub.start_test(WorkerId(0), "smoke", "", "suite");
        hub.record_outcome(WorkerId(0), Status::Pass, "ok").await;
        hub.end_test(WorkerId(0));

        let path = hub.flush().unwrap();
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("smoke"));

        assert!(matches!(hub.flush(), Err(EvidenceError::AlreadyFlushed)));
    }
}
