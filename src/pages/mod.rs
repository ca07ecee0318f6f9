//! Page abstractions over the element interaction layer.
//!
//! One type per application screen, each exposing domain actions built
//! exclusively from [`Interactor`] calls -- pages never reach into the
//! session registry. Every page honors the same three-method contract:
//! [`Page::wait_for_load`] blocks until the page's signature elements
//! are visible, [`Page::is_loaded`] is a non-blocking snapshot that
//! never errors, and [`Page::page_url`] is the expected navigation
//! target derived from the configured base URL.
//!
//! The app chrome (burger menu, cart badge) is the [`Shell`] component,
//! composed into the pages that carry it rather than inherited.

pub mod cart;
pub mod inventory;
pub mod login;
pub mod sortcheck;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use tracing::{debug, info};

use crate::interact::{InteractError, Interactor};
use crate::locator::Locator;

pub use cart::CartPage;
pub use inventory::InventoryPage;
pub use login::LoginPage;

/// Errors raised by page operations.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Interact(#[from] InteractError),

    #[error(transparent)]
    WebDriver(#[from] WebDriverError),

    #[error("failed to parse price: {0}")]
    Price(String),

    #[error("{0}")]
    NotFound(String),
}

/// The page-load contract shared by every screen.
#[async_trait]
pub trait Page {
    fn interactor(&self) -> &Interactor;

    /// Expected navigation target: configured base URL + fixed path.
    fn page_url(&self) -> String;

    /// Block until the page's signature elements are all visible.
    async fn wait_for_load(&self) -> Result<(), PageError>;

    /// Non-blocking snapshot check; wraps internal errors into `false`.
    async fn is_loaded(&self) -> bool;

    /// Navigate to the page and wait for it to load.
    async fn open(&self) -> Result<(), PageError> {
        let url = self.page_url();
        self.interactor().goto(&url).await?;
        info!("navigated to page: {url}");
        self.wait_for_load().await
    }
}

const MENU_BUTTON: Locator = Locator::id("react-burger-menu-btn");
const MENU_CLOSE_BUTTON: Locator = Locator::id("react-burger-cross-btn");
const CART_BADGE: Locator = Locator::class_name("shopping_cart_badge");
const CART_LINK: Locator = Locator::class_name("shopping_cart_link");
const MENU_ALL_ITEMS: Locator = Locator::id("inventory_sidebar_link");
const MENU_ABOUT: Locator = Locator::id("about_sidebar_link");
const MENU_LOGOUT: Locator = Locator::id("logout_sidebar_link");
const MENU_RESET_APP: Locator = Locator::id("reset_sidebar_link");

/// The app chrome present on post-login screens: burger menu and cart
/// link/badge.
#[derive(Clone)]
pub struct Shell {
    ix: Interactor,
}

impl Shell {
    pub fn new(ix: Interactor) -> Self {
        Self { ix }
    }

    pub async fn open_menu(&self) -> Result<(), PageError> {
        self.ix.click(&MENU_BUTTON).await?;
        info!("menu opened");
        Ok(())
    }

    pub async fn close_menu(&self) -> Result<(), PageError> {
        self.ix.click(&MENU_CLOSE_BUTTON).await?;
        info!("menu closed");
        Ok(())
    }

    pub async fn open_cart(&self) -> Result<(), PageError> {
        self.ix.click(&CART_LINK).await?;
        Ok(())
    }

    /// Cart badge count; 0 when the badge is absent (empty cart) or
    /// shows something unparsable.
    pub async fn cart_badge_count(&self) -> usize {
        if !self.ix.is_visible(&CART_BADGE).await {
            return 0;
        }
        match self.ix.text(&CART_BADGE).await {
            Ok(text) => text.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub async fn is_cart_badge_visible(&self) -> bool {
        self.ix.is_visible(&CART_BADGE).await
    }

    pub async fn go_to_all_items(&self) -> Result<(), PageError> {
        self.open_menu().await?;
        self.ix.click(&MENU_ALL_ITEMS).await?;
        info!("navigated to All Items");
        Ok(())
    }

    pub async fn go_to_about(&self) -> Result<(), PageError> {
        self.open_menu().await?;
        self.ix.click(&MENU_ABOUT).await?;
        info!("navigated to About");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), PageError> {
        self.open_menu().await?;
        self.ix.click(&MENU_LOGOUT).await?;
        info!("logged out");
        Ok(())
    }

    pub async fn reset_app_state(&self) -> Result<(), PageError> {
        self.open_menu().await?;
        self.ix.click(&MENU_RESET_APP).await?;
        debug!("app state reset");
        Ok(())
    }
}
