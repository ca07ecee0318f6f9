//! Element interaction layer.
//!
//! Every operation here takes a [`Locator`] and works against the
//! current session, re-locating the element on each poll so that a DOM
//! re-render between "wait" and "act" cannot leave us holding a stale
//! handle. Two failure classes exist:
//!
//! - Deadline-class: visibility/clickability/presence waits fail loud
//!   with [`InteractError::Timeout`] because they are preconditions for
//!   further action.
//! - Soft-boolean: [`Interactor::wait_invisible`] and
//!   [`Interactor::wait_text_present`] return `false` on deadline;
//!   disappearance and text-match are soft assertions callers branch on.
//!
//! [`Interactor::click`] is the only retry loop below the test-level
//! retry policy: stale-reference and click-intercepted conditions are
//! retried up to 3 total attempts with a 500ms backoff.

pub mod poll;

use std::time::Duration;

use thirtyfour::components::SelectElement;
use thirtyfour::error::WebDriverError;
use thirtyfour::{WebDriver, WebElement};
use tracing::{debug, error, info};

use crate::locator::Locator;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CLICK_ATTEMPTS: usize = 3;
const CLICK_BACKOFF: Duration = Duration::from_millis(500);

/// The condition a hard wait was polling for, for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitCondition {
    Visible,
    Clickable,
    Present,
    AllVisible,
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
            WaitCondition::Present => "present",
            WaitCondition::AllVisible => "all visible",
        };
        f.write_str(name)
    }
}

/// Errors raised by element interactions.
#[derive(Debug, thiserror::Error)]
pub enum InteractError {
    #[error("element not {condition} within timeout: {locator}")]
    Timeout {
        locator: Locator,
        condition: WaitCondition,
    },

    #[error("failed to click element after {attempts} attempts: {locator}")]
    ClickFailed {
        locator: Locator,
        attempts: usize,
        #[source]
        source: Box<InteractError>,
    },

    #[error("failed to type text into element: {locator}")]
    TypeText {
        locator: Locator,
        #[source]
        source: Box<InteractError>,
    },

    #[error(transparent)]
    WebDriver(#[from] WebDriverError),
}

impl InteractError {
    /// Transient conditions are the ones a re-render routinely causes;
    /// they are worth re-locating and retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InteractError::WebDriver(
                WebDriverError::StaleElementReference(_)
                    | WebDriverError::ElementClickIntercepted(_)
            )
        )
    }
}

/// Wrapper over a browser session adding explicit waits and bounded
/// retries to raw locate/act operations.
#[derive(Clone)]
pub struct Interactor {
    driver: WebDriver,
    wait: Duration,
}

impl Interactor {
    /// `wait` is the explicit-wait deadline applied to every polling
    /// operation, drawn from configuration.
    pub fn new(driver: WebDriver, wait: Duration) -> Self {
        Self { driver, wait }
    }

    pub fn driver(&self) -> &WebDriver {
        &self.driver
    }

    pub async fn goto(&self, url: &str) -> Result<(), InteractError> {
        self.driver.goto(url).await?;
        debug!("navigated to {url}");
        Ok(())
    }

    /// Wait for the element to be visible and return it.
    pub async fn wait_visible(&self, locator: &Locator) -> Result<WebElement, InteractError> {
        let found = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            let element = self.driver.find(locator.by()).await.ok()?;
            if element.is_displayed().await.unwrap_or(false) {
                Some(element)
            } else {
                None
            }
        })
        .await;
        self.require(found, locator, WaitCondition::Visible)
    }

    /// Wait for the element to be both displayed and enabled.
    pub async fn wait_clickable(&self, locator: &Locator) -> Result<WebElement, InteractError> {
        let found = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            let element = self.driver.find(locator.by()).await.ok()?;
            if element.is_clickable().await.unwrap_or(false) {
                Some(element)
            } else {
                None
            }
        })
        .await;
        self.require(found, locator, WaitCondition::Clickable)
    }

    /// Wait for the element to exist in the DOM, visible or not.
    pub async fn wait_present(&self, locator: &Locator) -> Result<WebElement, InteractError> {
        let found = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            self.driver.find(locator.by()).await.ok()
        })
        .await;
        self.require(found, locator, WaitCondition::Present)
    }

    /// Wait until at least one element matches and all matches are
    /// visible, then return them.
    pub async fn wait_all_visible(
        &self,
        locator: &Locator,
    ) -> Result<Vec<WebElement>, InteractError> {
        let found = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            let elements = self.driver.find_all(locator.by()).await.ok()?;
            if elements.is_empty() {
                return None;
            }
            for element in &elements {
                if !element.is_displayed().await.unwrap_or(false) {
                    return None;
                }
            }
            Some(elements)
        })
        .await;
        match found {
            Some(elements) => {
                debug!("elements visible: {locator} (count: {})", elements.len());
                Ok(elements)
            }
            None => {
                error!("elements not visible within timeout: {locator}");
                Err(InteractError::Timeout {
                    locator: locator.clone(),
                    condition: WaitCondition::AllVisible,
                })
            }
        }
    }

    /// Wait for the element to disappear. Returns `false` (rather than
    /// failing) if it is still visible at the deadline.
    pub async fn wait_invisible(&self, locator: &Locator) -> bool {
        let gone = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            match self.driver.find(locator.by()).await {
                Err(_) => Some(()),
                Ok(element) => match element.is_displayed().await {
                    Ok(false) | Err(_) => Some(()),
                    Ok(true) => None,
                },
            }
        })
        .await;
        if gone.is_none() {
            error!("element did not disappear within timeout: {locator}");
        }
        gone.is_some()
    }

    /// Wait for the element's text to contain `text`. Returns `false`
    /// on deadline; text-match is a soft assertion.
    pub async fn wait_text_present(&self, locator: &Locator, text: &str) -> bool {
        let matched = poll::poll_until(self.wait, POLL_INTERVAL, move || async move {
            let element = self.driver.find(locator.by()).await.ok()?;
            let current = element.text().await.ok()?;
            current.contains(text).then_some(())
        })
        .await;
        if matched.is_none() {
            error!("text '{text}' not present in element within timeout: {locator}");
        }
        matched.is_some()
    }

    /// Wait for clickability, then click. Stale-reference and
    /// click-intercepted conditions are retried up to 3 total attempts
    /// with a 500ms backoff; exhaustion fails with
    /// [`InteractError::ClickFailed`].
    pub async fn click(&self, locator: &Locator) -> Result<(), InteractError> {
        let result = poll::retry_transient(
            CLICK_ATTEMPTS,
            CLICK_BACKOFF,
            move || async move {
                let element = self.wait_clickable(locator).await?;
                element.click().await?;
                Ok(())
            },
            InteractError::is_transient,
        )
        .await;

        match result {
            Ok(()) => {
                info!("element clicked: {locator}");
                Ok(())
            }
            Err(err) if err.is_transient() => {
                error!("failed to click element after {CLICK_ATTEMPTS} attempts: {locator}");
                Err(InteractError::ClickFailed {
                    locator: locator.clone(),
                    attempts: CLICK_ATTEMPTS,
                    source: Box::new(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Click through the browser's script executor. Waits only for
    /// presence; the escape hatch for elements an overlay obscures.
    pub async fn click_via_script(&self, locator: &Locator) -> Result<(), InteractError> {
        let element = self.wait_present(locator).await?;
        self.driver
            .execute("arguments[0].click();", vec![element.to_json()?])
            .await?;
        info!("element clicked via script: {locator}");
        Ok(())
    }

    /// Wait for visibility, clear existing content, then type. No
    /// retry; failures propagate immediately.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), InteractError> {
        let attempt: Result<(), InteractError> = async {
            let element = self.wait_visible(locator).await?;
            element.clear().await?;
            element.send_keys(text).await?;
            Ok(())
        }
        .await;

        attempt.map_err(|source| {
            error!("failed to type text into element: {locator}");
            InteractError::TypeText {
                locator: locator.clone(),
                source: Box::new(source),
            }
        })
    }

    pub async fn text(&self, locator: &Locator) -> Result<String, InteractError> {
        let element = self.wait_visible(locator).await?;
        Ok(element.text().await?)
    }

    pub async fn attr(
        &self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, InteractError> {
        let element = self.wait_visible(locator).await?;
        Ok(element.attr(name).await?)
    }

    pub async fn select_by_visible_text(
        &self,
        locator: &Locator,
        text: &str,
    ) -> Result<(), InteractError> {
        let element = self.wait_visible(locator).await?;
        let select = SelectElement::new(&element).await?;
        select.select_by_exact_text(text).await?;
        info!("dropdown option selected by text: {locator} -> {text}");
        Ok(())
    }

    pub async fn select_by_value(
        &self,
        locator: &Locator,
        value: &str,
    ) -> Result<(), InteractError> {
        let element = self.wait_visible(locator).await?;
        let select = SelectElement::new(&element).await?;
        select.select_by_value(value).await?;
        info!("dropdown option selected by value: {locator} -> {value}");
        Ok(())
    }

    /// Number of matching elements; 0 on any lookup failure. Count is
    /// an always-available diagnostic, never an error.
    pub async fn count(&self, locator: &Locator) -> usize {
        match self.driver.find_all(locator.by()).await {
            Ok(elements) => elements.len(),
            Err(_) => 0,
        }
    }

    /// Waits for presence (not visibility): the element may be valid
    /// while scrolled out of view or mid-animation. False on failure.
    pub async fn is_enabled(&self, locator: &Locator) -> bool {
        match self.wait_present(locator).await {
            Ok(element) => element.is_enabled().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Presence-dependent, like [`Interactor::is_enabled`].
    pub async fn is_selected(&self, locator: &Locator) -> bool {
        match self.wait_present(locator).await {
            Ok(element) => element.is_selected().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Non-waiting snapshot check.
    pub async fn is_present(&self, locator: &Locator) -> bool {
        self.driver.find(locator.by()).await.is_ok()
    }

    /// Non-waiting snapshot check.
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        match self.driver.find(locator.by()).await {
            Ok(element) => element.is_displayed().await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn hover(&self, locator: &Locator) -> Result<(), InteractError> {
        let element = self.wait_visible(locator).await?;
        self.driver
            .action_chain()
            .move_to_element_center(&element)
            .perform()
            .await?;
        debug!("hovered over element: {locator}");
        Ok(())
    }

    pub async fn scroll_into_view(&self, locator: &Locator) -> Result<(), InteractError> {
        let element = self.wait_present(locator).await?;
        element.scroll_into_view().await?;
        debug!("scrolled to element: {locator}");
        Ok(())
    }

    /// All current matches, without waiting.
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>, InteractError> {
        Ok(self.driver.find_all(locator.by()).await?)
    }

    /// Text of every current match, in document order.
    pub async fn all_texts(&self, locator: &Locator) -> Result<Vec<String>, InteractError> {
        let elements = self.driver.find_all(locator.by()).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(element.text().await?);
        }
        Ok(texts)
    }

    fn require(
        &self,
        found: Option<WebElement>,
        locator: &Locator,
        condition: WaitCondition,
    ) -> Result<WebElement, InteractError> {
        match found {
            Some(element) => {
                debug!("element {condition}: {locator}");
                Ok(element)
            }
            None => {
                error!("element not {condition} within timeout: {locator}");
                Err(InteractError::Timeout {
                    locator: locator.clone(),
                    condition,
                })
            }
        }
    }
}
