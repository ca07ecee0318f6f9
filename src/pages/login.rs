//! The login screen.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Page, PageError};
use crate::interact::Interactor;
use crate::locator::Locator;

const USERNAME_FIELD: Locator = Locator::id("user-name");
const PASSWORD_FIELD: Locator = Locator::id("password");
const LOGIN_BUTTON: Locator = Locator::id("login-button");
const ERROR_MESSAGE: Locator = Locator::css("[data-test='error']");
const ERROR_CLOSE_BUTTON: Locator = Locator::css(".error-button");
const LOGIN_LOGO: Locator = Locator::class_name("login_logo");
const LOGIN_CREDENTIALS_TEXT: Locator = Locator::id("login_credentials");
const LOGIN_PASSWORD_TEXT: Locator = Locator::class_name("login_password");
const LOGIN_BOT_IMAGE: Locator = Locator::class_name("bot_column");

pub struct LoginPage {
    ix: Interactor,
    base_url: String,
}

impl LoginPage {
    pub fn new(ix: Interactor, base_url: impl Into<String>) -> Self {
        Self {
            ix,
            base_url: base_url.into(),
        }
    }

    pub async fn enter_username(&self, username: &str) -> Result<(), PageError> {
        self.ix.type_text(&USERNAME_FIELD, username).await?;
        info!("username entered: {username}");
        Ok(())
    }

    pub async fn enter_password(&self, password: &str) -> Result<(), PageError> {
        self.ix.type_text(&PASSWORD_FIELD, password).await?;
        info!("password entered");
        Ok(())
    }

    pub async fn submit(&self) -> Result<(), PageError> {
        self.ix.click(&LOGIN_BUTTON).await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), PageError> {
        self.enter_username(username).await?;
        self.enter_password(password).await?;
        self.submit().await?;
        info!("login attempted with username: {username}");
        Ok(())
    }

    /// The error banner text; empty when no banner is shown.
    pub async fn error_message(&self) -> String {
        if !self.ix.is_visible(&ERROR_MESSAGE).await {
            return String::new();
        }
        self.ix.text(&ERROR_MESSAGE).await.unwrap_or_default()
    }

    pub async fn is_error_displayed(&self) -> bool {
        self.ix.is_visible(&ERROR_MESSAGE).await
    }

    pub async fn close_error(&self) -> Result<(), PageError> {
        if self.ix.is_visible(&ERROR_CLOSE_BUTTON).await {
            self.ix.click(&ERROR_CLOSE_BUTTON).await?;
            debug!("error banner dismissed");
        }
        Ok(())
    }

    pub async fn clear_credentials(&self) -> Result<(), PageError> {
        let username = self.ix.wait_visible(&USERNAME_FIELD).await?;
        username.clear().await.map_err(PageError::WebDriver)?;
        let password = self.ix.wait_visible(&PASSWORD_FIELD).await?;
        password.clear().await.map_err(PageError::WebDriver)?;
        debug!("credentials cleared");
        Ok(())
    }

    pub async fn username_placeholder(&self) -> Result<String, PageError> {
        Ok(self
            .ix
            .attr(&USERNAME_FIELD, "placeholder")
            .await?
            .unwrap_or_default())
    }

    pub async fn password_placeholder(&self) -> Result<String, PageError> {
        Ok(self
            .ix
            .attr(&PASSWORD_FIELD, "placeholder")
            .await?
            .unwrap_or_default())
    }

    pub async fn login_button_label(&self) -> Result<String, PageError> {
        Ok(self
            .ix
            .attr(&LOGIN_BUTTON, "value")
            .await?
            .unwrap_or_default())
    }

    pub async fn current_username(&self) -> Result<String, PageError> {
        Ok(self
            .ix
            .attr(&USERNAME_FIELD, "value")
            .await?
            .unwrap_or_default())
    }

    pub async fn is_username_field_enabled(&self) -> bool {
        self.ix.is_enabled(&USERNAME_FIELD).await
    }

    pub async fn is_login_button_enabled(&self) -> bool {
        self.ix.is_enabled(&LOGIN_BUTTON).await
    }

    pub async fn logo_text(&self) -> String {
        self.ix.text(&LOGIN_LOGO).await.unwrap_or_default()
    }

    /// The demo app lists its accepted usernames on the login screen.
    pub async fn accepted_usernames(&self) -> String {
        if !self.ix.is_visible(&LOGIN_CREDENTIALS_TEXT).await {
            return String::new();
        }
        self.ix
            .text(&LOGIN_CREDENTIALS_TEXT)
            .await
            .unwrap_or_default()
    }

    pub async fn password_info(&self) -> String {
        if !self.ix.is_visible(&LOGIN_PASSWORD_TEXT).await {
            return String::new();
        }
        self.ix.text(&LOGIN_PASSWORD_TEXT).await.unwrap_or_default()
    }

    pub async fn is_bot_image_displayed(&self) -> bool {
        self.ix.is_visible(&LOGIN_BOT_IMAGE).await
    }
}

#[async_trait]
impl Page for LoginPage {
    fn interactor(&self) -> &Interactor {
        &self.ix
    }

    fn page_url(&self) -> String {
        self.base_url.clone()
    }

    async fn wait_for_load(&self) -> Result<(), PageError> {
        self.ix.wait_visible(&LOGIN_LOGO).await?;
        self.ix.wait_visible(&USERNAME_FIELD).await?;
        self.ix.wait_visible(&PASSWORD_FIELD).await?;
        self.ix.wait_visible(&LOGIN_BUTTON).await?;
        info!("login page loaded");
        Ok(())
    }

    async fn is_loaded(&self) -> bool {
        self.ix.is_visible(&LOGIN_LOGO).await
            && self.ix.is_visible(&USERNAME_FIELD).await
            && self.ix.is_visible(&PASSWORD_FIELD).await
            && self.ix.is_visible(&LOGIN_BUTTON).await
    }
}
