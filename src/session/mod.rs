//! Browser session lifecycle, one session per worker.
//!
//! The registry owns every live WebDriver session, keyed by the worker
//! that created it. A session is exclusively owned by its worker: the
//! per-worker state machine is Uninitialized -> Active -> Closed, and
//! there is no way back to Active without a fresh [`SessionRegistry::initialize`].
//!
//! [`SessionRegistry::quit`] tolerates termination failures (logged,
//! not propagated) but always removes the registry entry, so a failed
//! browser shutdown can never leak a dangling session into the next
//! scenario on the same worker.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};
use thirtyfour::error::WebDriverError;
use tracing::{error, info, warn};
use url::Url;

use crate::config::{ConfigError, Settings};

/// Identifies one worker in the harness pool. Sessions and report nodes
/// are both keyed by it; the harness is the only place ids are minted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// The browsers the harness can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl BrowserKind {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "edge",
            BrowserKind::Safari => "safari",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrowserKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            "edge" => Ok(BrowserKind::Edge),
            "safari" => Ok(BrowserKind::Safari),
            other => Err(SessionError::UnsupportedBrowser(other.to_string())),
        }
    }
}

/// Errors raised by session management. All are fatal to the current
/// scenario, not the process.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not initialized for {0}; call initialize() first")]
    NotInitialized(WorkerId),

    #[error("unsupported browser: {0}")]
    UnsupportedBrowser(String),

    #[error("invalid grid hub URL: {0}")]
    InvalidGridUrl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    WebDriver(#[from] WebDriverError),
}

/// Owns one browser session per worker.
pub struct SessionRegistry {
    settings: Arc<Settings>,
    sessions: Mutex<HashMap<WorkerId, WebDriver>>,
}

impl SessionRegistry {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create and register a session for `worker`. With `kind` omitted
    /// the configured default browser is used.
    ///
    /// Grid mode connects to the configured hub (malformed URLs fail
    /// fast with [`SessionError::InvalidGridUrl`] before any connection
    /// attempt); local mode connects to the per-browser driver endpoint.
    /// The post-init sequence is fixed: implicit wait, page-load
    /// timeout, window maximize.
    pub async fn initialize(
        &self,
        worker: WorkerId,
        kind: Option<BrowserKind>,
    ) -> Result<(), SessionError> {
        let kind = match kind {
            Some(kind) => kind,
            None => self.settings.browser().parse()?,
        };

        // A worker can hold at most one active session. Anything left
        // behind is quit before the replacement is created.
        let stale = self.lock().remove(&worker);
        if let Some(old) = stale {
            warn!("{worker} still held a session at initialize; quitting it");
            if let Err(err) = old.quit().await {
                error!("error while quitting stale session for {worker}: {err}");
            }
        }

        info!("initializing {kind} session for {worker}");
        let driver = if self.settings.grid_enabled() {
            self.create_remote(kind).await?
        } else {
            self.create_local(kind).await?
        };

        driver
            .set_implicit_wait_timeout(self.settings.implicit_wait()?)
            .await?;
        driver
            .set_page_load_timeout(self.settings.page_load_timeout()?)
            .await?;
        driver.maximize_window().await?;

        self.lock().insert(worker, driver);
        info!("{kind} session initialized for {worker}");
        Ok(())
    }

    /// The worker's session, or [`SessionError::NotInitialized`].
    pub fn get(&self, worker: WorkerId) -> Result<WebDriver, SessionError> {
        self.lock()
            .get(&worker)
            .cloned()
            .ok_or(SessionError::NotInitialized(worker))
    }

    /// Non-throwing existence check, used defensively by evidence code
    /// before touching a possibly-absent session.
    pub fn is_initialized(&self, worker: WorkerId) -> bool {
        self.lock().contains_key(&worker)
    }

    /// Terminate and release the worker's session. Termination errors
    /// are logged, never propagated; the registry entry is always
    /// removed.
    pub async fn quit(&self, worker: WorkerId) {
        let driver = self.lock().remove(&worker);
        if let Some(driver) = driver {
            match driver.quit().await {
                Ok(()) => info!("session quit for {worker}"),
                Err(err) => error!("error while quitting session for {worker}: {err}"),
            }
        }
    }

    /// Close the current window without releasing the session.
    pub async fn close(&self, worker: WorkerId) {
        let driver = self.lock().get(&worker).cloned();
        if let Some(driver) = driver {
            match driver.close_window().await {
                Ok(()) => info!("window closed for {worker}"),
                Err(err) => error!("error while closing window for {worker}: {err}"),
            }
        }
    }

    pub async fn goto(&self, worker: WorkerId, url: &str) -> Result<(), SessionError> {
        self.get(worker)?.goto(url).await?;
        info!("{worker} navigated to {url}");
        Ok(())
    }

    pub async fn refresh(&self, worker: WorkerId) -> Result<(), SessionError> {
        self.get(worker)?.refresh().await?;
        Ok(())
    }

    pub async fn back(&self, worker: WorkerId) -> Result<(), SessionError> {
        self.get(worker)?.back().await?;
        Ok(())
    }

    pub async fn forward(&self, worker: WorkerId) -> Result<(), SessionError> {
        self.get(worker)?.forward().await?;
        Ok(())
    }

    pub async fn current_url(&self, worker: WorkerId) -> Result<String, SessionError> {
        Ok(self.get(worker)?.current_url().await?.to_string())
    }

    pub async fn title(&self, worker: WorkerId) -> Result<String, SessionError> {
        Ok(self.get(worker)?.title().await?)
    }

    async fn create_local(&self, kind: BrowserKind) -> Result<WebDriver, SessionError> {
        let endpoint = self.driver_endpoint(kind);
        let driver = match kind {
            BrowserKind::Chrome => WebDriver::new(endpoint.as_str(), self.chrome_caps()?).await?,
            BrowserKind::Firefox => WebDriver::new(endpoint.as_str(), self.firefox_caps()?).await?,
            BrowserKind::Edge => WebDriver::new(endpoint.as_str(), self.edge_caps()?).await?,
            BrowserKind::Safari => {
                WebDriver::new(endpoint.as_str(), DesiredCapabilities::safari()).await?
            }
        };
        Ok(driver)
    }

    async fn create_remote(&self, kind: BrowserKind) -> Result<WebDriver, SessionError> {
        let hub = self
            .settings
            .grid_hub_url()
            .ok_or_else(|| SessionError::InvalidGridUrl("grid.hub_url is not set".to_string()))?;
        let hub = Url::parse(&hub)
            .map_err(|err| SessionError::InvalidGridUrl(format!("{hub}: {err}")))?;

        let driver = match kind {
            BrowserKind::Chrome => WebDriver::new(hub.as_str(), self.chrome_caps()?).await?,
            BrowserKind::Firefox => WebDriver::new(hub.as_str(), self.firefox_caps()?).await?,
            BrowserKind::Edge => WebDriver::new(hub.as_str(), self.edge_caps()?).await?,
            // safaridriver has no documented grid path; local only.
            BrowserKind::Safari => {
                return Err(SessionError::UnsupportedBrowser(
                    "safari is not supported for grid execution".to_string(),
                ));
            }
        };
        Ok(driver)
    }

    fn chrome_caps(&self) -> Result<thirtyfour::ChromeCapabilities, SessionError> {
        let mut caps = DesiredCapabilities::chrome();
        if self.settings.headless() {
            caps.add_arg("--headless")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--disable-extensions")?;
        caps.add_arg("--disable-infobars")?;
        caps.add_arg("--disable-notifications")?;
        caps.add_arg("--disable-popup-blocking")?;
        caps.add_arg("--remote-allow-origins=*")?;

        // Content settings tuned for test stability: no notification
        // prompts, no popups, no image loading.
        caps.add_experimental_option(
            "prefs",
            serde_json::json!({
                "profile.default_content_setting_values.notifications": 2,
                "profile.default_content_settings.popups": 0,
                "profile.managed_default_content_settings.images": 2,
            }),
        )?;
        Ok(caps)
    }

    fn firefox_caps(&self) -> Result<thirtyfour::FirefoxCapabilities, SessionError> {
        let mut caps = DesiredCapabilities::firefox();
        if self.settings.headless() {
            caps.add_arg("-headless")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        Ok(caps)
    }

    fn edge_caps(&self) -> Result<thirtyfour::EdgeCapabilities, SessionError> {
        let mut caps = DesiredCapabilities::edge();
        if self.settings.headless() {
            caps.add_arg("--headless")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--remote-allow-origins=*")?;
        Ok(caps)
    }

    fn driver_endpoint(&self, kind: BrowserKind) -> String {
        match kind {
            BrowserKind::Chrome => self.settings.get_or("driver.chrome", "http://localhost:9515"),
            BrowserKind::Firefox => self.settings.get_or("driver.firefox", "http://localhost:4444"),
            BrowserKind::Edge => self.settings.get_or("driver.edge", "http://localhost:9515"),
            BrowserKind::Safari => self.settings.get_or("driver.safari", "http://localhost:4445"),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WorkerId, WebDriver>> {
        self.sessions.lock().expect("session registry lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings(content: &str) -> (Arc<Settings>, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let settings = Arc::new(Settings::load(file.path()).unwrap());
        (settings, file)
    }

    #[test]
    fn browser_kind_parses_case_insensitively() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("FIREFOX".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert!(matches!(
            "netscape".parse::<BrowserKind>(),
            Err(SessionError::UnsupportedBrowser(_))
        ));
    }

    #[tokio::test]
    async fn get_before_initialize_fails_per_worker() {
        let (settings, _file) = settings("[browser]\nkind = \"chrome\"\n");
        let registry = SessionRegistry::new(settings);

        // Independent per worker: neither has a session.
        assert!(matches!(
            registry.get(WorkerId(0)),
            Err(SessionError::NotInitialized(WorkerId(0)))
        ));
        assert!(matches!(
            registry.get(WorkerId(1)),
            Err(SessionError::NotInitialized(WorkerId(1)))
        ));
        assert!(!registry.is_initialized(WorkerId(0)));
    }

    #[tokio::test]
    async fn quit_of_absent_session_is_a_noop() {
        let (settings, _file) = settings("[browser]\nkind = \"chrome\"\n");
        let registry = SessionRegistry::new(settings);
        registry.quit(WorkerId(7)).await;
        assert!(!registry.is_initialized(WorkerId(7)));
    }

    #[tokio::test]
    async fn malformed_grid_url_fails_fast() {
        let (settings, _file) = settings(
            "[grid]\nenabled = true\nhub_url = \"not a url at all\"\n",
        );
        let registry = SessionRegistry::new(settings);

        // Fails during URL validation, before any connection attempt.
        let err = registry
            .initialize(WorkerId(0), Some(BrowserKind::Chrome))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidGridUrl(_)));
    }

    #[tokio::test]
    async fn safari_on_grid_is_unsupported() {
        let (settings, _file) = settings(
            "[grid]\nenabled = true\nhub_url = \"http://hub.example:4444/wd/hub\"\n",
        );
        let registry = SessionRegistry::new(settings);

        let err = registry
            .initialize(WorkerId(0), Some(BrowserKind::Safari))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedBrowser(_)));
    }
}
