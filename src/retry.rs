//! Retry-on-failure policy for whole tests.
//!
//! The policy is a bounded attempt counter consulted by the harness
//! after a scenario fails; it never re-runs anything itself. A retry is
//! a full serial re-run of the scenario, not a speculative parallel
//! attempt.
//!
//! Instance lifetime is a configuration choice. `fresh` constructs one
//! policy per scenario, so counts can never leak. `shared` reuses a
//! single instance across the whole run, reproducing the behavior of a
//! runner that recycles its retry analyzer: attempt counts then leak
//! across unrelated tests. The leak is part of the reproduced contract,
//! not a bug to fix here.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, warn};

use crate::config::ConfigError;
use crate::evidence::report::{ReportHub, Status};
use crate::session::WorkerId;

/// What failed, for retry bookkeeping and report events.
#[derive(Clone, Debug)]
pub struct FailureContext {
    pub worker: WorkerId,
    pub test: String,
    pub message: String,
}

/// Whether the harness builds a fresh policy per scenario or shares one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RetryLifetime {
    #[default]
    FreshPerTest,
    Shared,
}

impl FromStr for RetryLifetime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresh" => Ok(RetryLifetime::FreshPerTest),
            "shared" => Ok(RetryLifetime::Shared),
            other => Err(ConfigError::Parse {
                key: "retry.lifetime".to_string(),
                value: Some(other.to_string()),
            }),
        }
    }
}

/// Bounded per-test retry counter.
pub struct RetryPolicy {
    attempts: usize,
    max: usize,
    hub: Option<Arc<ReportHub>>,
}

impl RetryPolicy {
    pub fn new(max: usize) -> Self {
        Self {
            attempts: 0,
            max,
            hub: None,
        }
    }

    /// Emit retry events to the report as well as the log.
    pub fn with_reporting(mut self, hub: Arc<ReportHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Consult the policy after a failure. Increments the counter and
    /// returns `true` while attempts so far are below the maximum; on
    /// exhaustion returns `false` and emits a permanent-failure event.
    pub fn should_retry(&mut self, ctx: &FailureContext) -> bool {
        if self.attempts < self.max {
            self.attempts += 1;
            warn!(
                "test '{}' failed: {}. Retrying attempt {} of {}",
                ctx.test, ctx.message, self.attempts, self.max
            );
            if let Some(hub) = &self.hub {
                hub.log(
                    ctx.worker,
                    Status::Warning,
                    &format!(
                        "Test failed. Retrying attempt {} of {}",
                        self.attempts, self.max
                    ),
                );
            }
            true
        } else {
            error!(
                "test '{}' failed after {} retry attempts",
                ctx.test, self.max
            );
            if let Some(hub) = &self.hub {
                hub.log(
                    ctx.worker,
                    Status::Fail,
                    &format!("Test failed permanently after {} retry attempts", self.max),
                );
            }
            false
        }
    }

    pub fn current_count(&self) -> usize {
        self.attempts
    }

    pub fn max_count(&self) -> usize {
        self.max
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FailureContext {
        FailureContext {
            worker: WorkerId(0),
            test: "login_standard_user".to_string(),
            message: "element not visible within timeout".to_string(),
        }
    }

    #[test]
    fn retries_up_to_the_configured_maximum() {
        let mut policy = RetryPolicy::new(2);

        assert!(policy.should_retry(&ctx()));
        assert_eq!(policy.current_count(), 1);
        assert!(policy.should_retry(&ctx()));
        assert_eq!(policy.current_count(), 2);

        // Third consultation is exhaustion.
        assert!(!policy.should_retry(&ctx()));
        assert_eq!(policy.current_count(), policy.max_count());
    }

    #[test]
    fn zero_max_never_retries() {
        let mut policy = RetryPolicy::new(0);
        assert!(!policy.should_retry(&ctx()));
        assert_eq!(policy.current_count(), 0);
    }

    #[test]
    fn reset_allows_a_fresh_round() {
        let mut policy = RetryPolicy::new(1);
        assert!(policy.should_retry(&ctx()));
        assert!(!policy.should_retry(&ctx()));

        policy.reset();
        assert_eq!(policy.current_count(), 0);
        assert!(policy.should_retry(&ctx()));
    }

    #[test]
    fn lifetime_parses_from_config_values() {
        assert_eq!(
            "fresh".parse::<RetryLifetime>().unwrap(),
            RetryLifetime::FreshPerTest
        );
        assert_eq!(
            "Shared".parse::<RetryLifetime>().unwrap(),
            RetryLifetime::Shared
        );
        assert!("sometimes".parse::<RetryLifetime>().is_err());
    }
}
