//! Scenario orchestration.
//!
//! The harness fans scenarios out across a pool of workers. Each worker
//! runs its scenarios strictly sequentially; no ordering is guaranteed
//! between workers. Per scenario the lifecycle is fixed: initialize the
//! worker's session, open a report node, run the body, record the
//! outcome (with a failure screenshot), then tear the session down --
//! teardown happens on every path, pass or fail. A failed scenario is
//! re-run serially while the retry policy allows it.
//!
//! The report is flushed exactly once, by the caller, after
//! [`Harness::run`] has joined every worker.

pub mod scenarios;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use tracing::{error, info};

use crate::config::Settings;
use crate::evidence::junit::{CaseOutcome, JUnitCase};
use crate::evidence::report::{ReportHub, RunMeta, SessionCapturer, Status};
use crate::evidence::screenshot;
use crate::interact::Interactor;
use crate::pages::{CartPage, InventoryPage, LoginPage};
use crate::retry::{FailureContext, RetryLifetime, RetryPolicy};
use crate::session::{BrowserKind, SessionRegistry, WorkerId};
use crate::testdata::TestData;

/// A scenario body. Takes the per-worker context, returns the body's
/// verdict; any error fails the scenario.
pub type ScenarioFn = fn(ScenarioCtx) -> BoxFuture<'static, anyhow::Result<()>>;

/// One registered scenario.
#[derive(Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub class: &'static str,
    pub tags: &'static [&'static str],
    pub run: ScenarioFn,
}

impl Scenario {
    pub fn matches(&self, filter: &str) -> bool {
        self.name.contains(filter) || self.tags.contains(&filter)
    }

    fn skipped(&self) -> bool {
        self.tags.contains(&"skip")
    }
}

/// Everything a scenario body needs, scoped to one worker.
#[derive(Clone)]
pub struct ScenarioCtx {
    pub worker: WorkerId,
    pub settings: Arc<Settings>,
    pub registry: Arc<SessionRegistry>,
    pub hub: Arc<ReportHub>,
    pub data: Arc<TestData>,
}

impl ScenarioCtx {
    /// An interactor over the worker's current session.
    pub fn interactor(&self) -> anyhow::Result<Interactor> {
        let driver = self.registry.get(self.worker)?;
        let wait = self.settings.explicit_wait()?;
        Ok(Interactor::new(driver, wait))
    }

    pub fn login_page(&self) -> anyhow::Result<LoginPage> {
        Ok(LoginPage::new(self.interactor()?, self.settings.app_url()))
    }

    pub fn inventory_page(&self) -> anyhow::Result<InventoryPage> {
        Ok(InventoryPage::new(self.interactor()?, self.settings.app_url()))
    }

    pub fn cart_page(&self) -> anyhow::Result<CartPage> {
        Ok(CartPage::new(self.interactor()?, self.settings.app_url()))
    }

    /// Log a step line into the scenario's report node.
    pub fn step(&self, message: &str) {
        self.hub.log(self.worker, Status::Info, message);
    }
}

/// Outcome of one scenario after all retry attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed,
    Skipped,
}

/// Result of one scenario.
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub class: String,
    pub outcome: ScenarioOutcome,
    /// Total executions, including the first run.
    pub attempts: usize,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn to_junit_case(&self) -> JUnitCase {
        JUnitCase {
            name: self.name.clone(),
            class: self.class.clone(),
            duration: self.duration,
            outcome: match self.outcome {
                ScenarioOutcome::Passed => CaseOutcome::Passed,
                ScenarioOutcome::Failed => CaseOutcome::Failed,
                ScenarioOutcome::Skipped => CaseOutcome::Skipped,
            },
            message: self.error.clone(),
        }
    }
}

/// Result of the whole run.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
    pub results: Vec<ScenarioResult>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 { 1 } else { 0 }
    }
}

/// Runtime overrides from the CLI.
#[derive(Clone, Debug, Default)]
pub struct HarnessOptions {
    pub browser: Option<BrowserKind>,
    pub workers: Option<usize>,
    pub filter: Option<String>,
    pub verbose: bool,
}

/// Wires the registry, report hub, and test data together and runs
/// scenarios across the worker pool.
pub struct Harness {
    settings: Arc<Settings>,
    registry: Arc<SessionRegistry>,
    hub: Arc<ReportHub>,
    data: Arc<TestData>,
    options: HarnessOptions,
}

impl Harness {
    pub fn new(settings: Arc<Settings>, options: HarnessOptions) -> Self {
        let registry = Arc::new(SessionRegistry::new(settings.clone()));

        let browser = options
            .browser
            .map(|b| b.name().to_string())
            .unwrap_or_else(|| settings.browser());
        let meta = RunMeta {
            run_id: uuid::Uuid::new_v4(),
            app_url: settings.app_url(),
            browser,
            environment: settings.environment(),
            os: std::env::consts::OS.to_string(),
            execution_mode: if settings.headless() {
                "Headless".to_string()
            } else {
                "GUI".to_string()
            },
            grid_enabled: settings.grid_enabled(),
            started_at: chrono::Local::now(),
        };

        let capturer = SessionCapturer::new(registry.clone(), settings.screenshot_dir());
        let hub = Arc::new(
            ReportHub::new(
                meta,
                settings.report_dir(),
                settings.report_title(),
                settings.report_name(),
                settings.report_theme(),
            )
            .with_capturer(Arc::new(capturer)),
        );

        let data = Arc::new(TestData::new(settings.testdata_dir()));

        Self {
            settings,
            registry,
            hub,
            data,
            options,
        }
    }

    pub fn hub(&self) -> Arc<ReportHub> {
        self.hub.clone()
    }

    /// Scenarios after applying the CLI filter.
    pub fn select(&self, scenarios: Vec<Scenario>) -> Vec<Scenario> {
        match &self.options.filter {
            Some(filter) => scenarios
                .into_iter()
                .filter(|s| s.matches(filter))
                .collect(),
            None => scenarios,
        }
    }

    /// Run the given scenarios across the worker pool and return the
    /// aggregated results. All workers are joined before this returns,
    /// so the caller may flush the report afterwards.
    pub async fn run(&self, scenarios: Vec<Scenario>) -> anyhow::Result<RunResult> {
        let started = Instant::now();
        let scenarios = self.select(scenarios);

        info!("========== STARTING TEST EXECUTION ==========");
        info!("environment: {}", self.settings.environment());
        info!("application url: {}", self.settings.app_url());
        info!("grid enabled: {}", self.settings.grid_enabled());

        // Startup housekeeping: prune stale screenshots.
        let retention = self.settings.screenshot_retention_days()?;
        screenshot::cleanup_older_than(&self.settings.screenshot_dir(), retention);

        if scenarios.is_empty() {
            info!("no scenarios selected");
            return Ok(RunResult {
                total: 0,
                passed: 0,
                failed: 0,
                skipped: 0,
                duration: started.elapsed(),
                results: Vec::new(),
            });
        }

        let worker_count = match self.options.workers {
            Some(n) => n,
            None => self.settings.worker_count()?,
        }
        .clamp(1, scenarios.len());

        let retry_count = self.settings.retry_count()?;
        let lifetime: RetryLifetime = self.settings.retry_lifetime().parse()?;
        let shared_policy = match lifetime {
            RetryLifetime::Shared => Some(Arc::new(Mutex::new(
                RetryPolicy::new(retry_count).with_reporting(self.hub.clone()),
            ))),
            RetryLifetime::FreshPerTest => None,
        };

        let reporter = Arc::new(ConsoleReporter::new(self.options.verbose));
        reporter.on_run_start(scenarios.len());

        // Round-robin distribution across workers.
        let mut batches: Vec<Vec<Scenario>> = vec![Vec::new(); worker_count];
        for (index, scenario) in scenarios.iter().enumerate() {
            batches[index % worker_count].push(scenario.clone());
        }

        let mut handles = Vec::with_capacity(worker_count);
        for (index, batch) in batches.into_iter().enumerate() {
            let worker = WorkerId(index);
            let ctx = ScenarioCtx {
                worker,
                settings: self.settings.clone(),
                registry: self.registry.clone(),
                hub: self.hub.clone(),
                data: self.data.clone(),
            };
            let hub = self.hub.clone();
            let reporter = reporter.clone();
            let shared_policy = shared_policy.clone();
            let browser = self.options.browser;

            handles.push(tokio::spawn(async move {
                let mut results = Vec::with_capacity(batch.len());
                for scenario in batch {
                    let result = run_scenario(
                        &scenario,
                        ctx.clone(),
                        &hub,
                        browser,
                        retry_count,
                        shared_policy.as_ref(),
                    )
                    .await;
                    reporter.on_scenario_complete(&result);
                    results.push(result);
                }
                results
            }));
        }

        let mut results = Vec::with_capacity(scenarios.len());
        for handle in handles {
            match handle.await {
                Ok(batch_results) => results.extend(batch_results),
                Err(err) => error!("worker panicked: {err}"),
            }
        }

        let passed = results
            .iter()
            .filter(|r| r.outcome == ScenarioOutcome::Passed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.outcome == ScenarioOutcome::Failed)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.outcome == ScenarioOutcome::Skipped)
            .count();

        let run_result = RunResult {
            total: results.len(),
            passed,
            failed,
            skipped,
            duration: started.elapsed(),
            results,
        };
        reporter.on_run_complete(&run_result);
        Ok(run_result)
    }
}

async fn run_scenario(
    scenario: &Scenario,
    ctx: ScenarioCtx,
    hub: &Arc<ReportHub>,
    browser: Option<BrowserKind>,
    retry_count: usize,
    shared_policy: Option<&Arc<Mutex<RetryPolicy>>>,
) -> ScenarioResult {
    let worker = ctx.worker;
    let started = Instant::now();
    hub.start_test(worker, scenario.name, scenario.description, scenario.class);

    if scenario.skipped() {
        hub.record_outcome(worker, Status::Skip, "Test skipped").await;
        hub.end_test(worker);
        return ScenarioResult {
            name: scenario.name.to_string(),
            class: scenario.class.to_string(),
            outcome: ScenarioOutcome::Skipped,
            attempts: 0,
            duration: started.elapsed(),
            error: None,
        };
    }

    info!("========== STARTING SCENARIO: {} ==========", scenario.name);

    let mut fresh_policy = match shared_policy {
        Some(_) => None,
        None => Some(RetryPolicy::new(retry_count).with_reporting(hub.clone())),
    };

    let mut attempts = 0;
    let mut last_error = None;
    let outcome = loop {
        attempts += 1;
        match run_attempt(scenario, &ctx, hub, browser).await {
            Ok(()) => break ScenarioOutcome::Passed,
            Err(message) => {
                let failure = FailureContext {
                    worker,
                    test: scenario.name.to_string(),
                    message: message.clone(),
                };
                last_error = Some(message);
                let retry = match (shared_policy, fresh_policy.as_mut()) {
                    (Some(shared), _) => shared
                        .lock()
                        .expect("retry policy lock poisoned")
                        .should_retry(&failure),
                    (None, Some(policy)) => policy.should_retry(&failure),
                    (None, None) => false,
                };
                if !retry {
                    break ScenarioOutcome::Failed;
                }
            }
        }
    };

    hub.end_test(worker);
    ScenarioResult {
        name: scenario.name.to_string(),
        class: scenario.class.to_string(),
        outcome,
        attempts,
        duration: started.elapsed(),
        error: if outcome == ScenarioOutcome::Failed {
            last_error
        } else {
            None
        },
    }
}

/// One full execution: session up, body, outcome recorded (failure
/// screenshot while the session is still live), session down.
async fn run_attempt(
    scenario: &Scenario,
    ctx: &ScenarioCtx,
    hub: &Arc<ReportHub>,
    browser: Option<BrowserKind>,
) -> Result<(), String> {
    if let Err(err) = ctx.registry.initialize(ctx.worker, browser).await {
        let message = format!("Failed to initialize session: {err}");
        hub.record_outcome(ctx.worker, Status::Fail, &message).await;
        return Err(message);
    }

    let body = (scenario.run)(ctx.clone()).await;
    let verdict = match body {
        Ok(()) => {
            hub.record_outcome(
                ctx.worker,
                Status::Pass,
                &format!("Test passed: {}", scenario.name),
            )
            .await;
            Ok(())
        }
        Err(err) => {
            let message = format!("{err:#}");
            hub.record_outcome(ctx.worker, Status::Fail, &message).await;
            Err(message)
        }
    };

    // Guaranteed teardown, after the failure screenshot was taken.
    ctx.registry.quit(ctx.worker).await;
    verdict
}

/// Terminal progress display for a run.
pub struct ConsoleReporter {
    progress: Mutex<Option<indicatif::ProgressBar>>,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            progress: Mutex::new(None),
            verbose,
        }
    }

    pub fn on_run_start(&self, total: usize) {
        println!("Running {total} scenarios");

        let pb = indicatif::ProgressBar::new(total as u64);
        pb.set_style(
            indicatif::ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .expect("valid progress template")
                .progress_chars("#>-"),
        );
        *self.progress.lock().expect("progress lock poisoned") = Some(pb);
    }

    pub fn on_scenario_complete(&self, result: &ScenarioResult) {
        if let Some(pb) = self.progress.lock().expect("progress lock poisoned").as_ref() {
            pb.inc(1);

            let status = match result.outcome {
                ScenarioOutcome::Passed => console::style("PASS").green(),
                ScenarioOutcome::Failed => console::style("FAIL").red(),
                ScenarioOutcome::Skipped => console::style("SKIP").yellow(),
            };

            if self.verbose || result.outcome != ScenarioOutcome::Passed {
                pb.println(format!("{status} {}", result.name));
            }
        }
    }

    pub fn on_run_complete(&self, result: &RunResult) {
        if let Some(pb) = self.progress.lock().expect("progress lock poisoned").take() {
            pb.finish_and_clear();
        }

        println!();
        println!("Scenario Results:");
        println!("  Total:   {}", result.total);
        println!("  Passed:  {}", console::style(result.passed).green());
        println!("  Failed:  {}", console::style(result.failed).red());
        println!("  Skipped: {}", console::style(result.skipped).yellow());
        println!("  Duration: {:?}", result.duration);

        if result.success() {
            println!();
            println!("{}", console::style("All scenarios passed!").green().bold());
        } else {
            println!();
            println!("{}", console::style("Some scenarios failed.").red().bold());
            println!();
            println!("Failed scenarios:");
            for r in &result.results {
                if r.outcome == ScenarioOutcome::Failed {
                    println!("  - {} ({} attempts)", r.name, r.attempts);
                    if let Some(message) = &r.error {
                        println!("    {}", console::style(message).dim());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(name: &'static str, tags: &'static [&'static str]) -> Scenario {
        Scenario {
            name,
            description: "",
            class: "suite",
            tags,
            run: |_| Box::pin(async { Ok(()) }),
        }
    }

    #[test]
    fn filter_matches_name_substring_or_tag() {
        let s = scenario("login_standard_user", &["login", "smoke"]);
        assert!(s.matches("login"));
        assert!(s.matches("standard"));
        assert!(s.matches("smoke"));
        assert!(!s.matches("cart"));
    }

    #[test]
    fn skip_tag_is_recognized() {
        assert!(scenario("quarantined", &["skip"]).skipped());
        assert!(!scenario("active", &["smoke"]).skipped());
    }

    #[test]
    fn exit_code_reflects_failures() {
        let mut run = RunResult {
            total: 2,
            passed: 2,
            failed: 0,
            skipped: 0,
            duration: Duration::from_secs(1),
            results: Vec::new(),
        };
        assert_eq!(run.exit_code(), 0);
        run.failed = 1;
        assert_eq!(run.exit_code(), 1);
    }

    #[test]
    fn junit_case_conversion_keeps_the_error_message() {
        let result = ScenarioResult {
            name: "cart_total".to_string(),
            class: "cart".to_string(),
            outcome: ScenarioOutcome::Failed,
            attempts: 3,
            duration: Duration::from_secs(4),
            error: Some("totals diverged".to_string()),
        };
        let case = result.to_junit_case();
        assert_eq!(case.outcome, CaseOutcome::Failed);
        assert_eq!(case.message.as_deref(), Some("totals diverged"));
    }
}
