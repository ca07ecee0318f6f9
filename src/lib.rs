//! storecheck: end-to-end UI checks for the Swag Labs storefront demo.
//!
//! This crate drives real browsers through login, inventory, and cart
//! flows, asserts expected UI states, captures screenshots as evidence,
//! and writes HTML + JUnit reports.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Session registry**: one browser session per worker, local or
//!   grid, with guaranteed teardown
//! - **Interactor**: explicit waits and bounded retries over raw
//!   locate/act operations -- the layer that keeps UI tests non-flaky
//! - **Pages**: one type per application screen, composed over the
//!   interactor
//! - **Evidence**: screenshots keyed by outcome, per-scenario report
//!   nodes, a single flush at process end
//! - **Suite**: scenario registration and the parallel harness
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storecheck::{Harness, HarnessOptions, Settings};
//! use storecheck::suite::scenarios;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Arc::new(Settings::load("storecheck.toml")?);
//!     let harness = Harness::new(settings, HarnessOptions::default());
//!     let result = harness.run(scenarios::all()).await?;
//!     harness.hub().flush()?;
//!     std::process::exit(result.exit_code());
//! }
//! ```

pub mod config;
pub mod evidence;
pub mod interact;
pub mod locator;
pub mod pages;
pub mod retry;
pub mod session;
pub mod suite;
pub mod testdata;

// Re-export commonly used types
pub use config::{ConfigError, Settings};
pub use interact::{InteractError, Interactor};
pub use locator::Locator;
pub use pages::{Page, PageError};
pub use retry::{RetryLifetime, RetryPolicy};
pub use session::{BrowserKind, SessionError, SessionRegistry, WorkerId};
pub use suite::{Harness, HarnessOptions, RunResult, Scenario, ScenarioCtx};
pub use testdata::{TestData, TestDataError};
