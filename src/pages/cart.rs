//! The cart screen.

use async_trait::async_trait;
use thirtyfour::By;
use tracing::info;

use super::{sortcheck, Page, PageError, Shell};
use crate::interact::Interactor;
use crate::locator::Locator;

const PAGE_TITLE: Locator = Locator::class_name("title");
const CART_LIST: Locator = Locator::class_name("cart_list");
const CART_ITEMS: Locator = Locator::class_name("cart_item");
const CART_ITEM_NAME: Locator = Locator::class_name("inventory_item_name");
const CART_ITEM_DESC: Locator = Locator::class_name("inventory_item_desc");
const CART_ITEM_PRICE: Locator = Locator::class_name("inventory_item_price");
const CART_QUANTITY: Locator = Locator::class_name("cart_quantity");
const CONTINUE_SHOPPING_BUTTON: Locator = Locator::id("continue-shopping");
const CHECKOUT_BUTTON: Locator = Locator::id("checkout");

const REMOVE_BUTTON: Locator = Locator::css("[data-test='remove-{}']");

pub struct CartPage {
    ix: Interactor,
    shell: Shell,
    base_url: String,
}

impl CartPage {
    pub fn new(ix: Interactor, base_url: impl Into<String>) -> Self {
        let shell = Shell::new(ix.clone());
        Self {
            ix,
            shell,
            base_url: base_url.into(),
        }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub async fn title_text(&self) -> String {
        self.ix.text(&PAGE_TITLE).await.unwrap_or_default()
    }

    pub async fn item_count(&self) -> usize {
        self.ix.count(&CART_ITEMS).await
    }

    pub async fn is_empty(&self) -> bool {
        self.item_count().await == 0
    }

    pub async fn item_names(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&CART_ITEM_NAME).await?)
    }

    pub async fn item_descriptions(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&CART_ITEM_DESC).await?)
    }

    pub async fn item_prices(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&CART_ITEM_PRICE).await?)
    }

    pub async fn item_quantities(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&CART_QUANTITY).await?)
    }

    pub async fn remove_by_key(&self, key: &str) -> Result<(), PageError> {
        self.ix.click(&REMOVE_BUTTON.bind(key)).await?;
        info!("item removed from cart: {key}");
        Ok(())
    }

    /// Remove an item by its displayed name, scanning the cart rows.
    pub async fn remove_by_name(&self, name: &str) -> Result<(), PageError> {
        let items = self.ix.find_all(&CART_ITEMS).await?;
        for item in items {
            let row_name = item
                .find(By::ClassName("inventory_item_name"))
                .await?
                .text()
                .await?;
            if row_name == name {
                item.find(By::Css("[data-test^='remove']"))
                    .await?
                    .click()
                    .await?;
                info!("item removed from cart: {name}");
                return Ok(());
            }
        }
        Err(PageError::NotFound(format!("item not found in cart: {name}")))
    }

    pub async fn continue_shopping(&self) -> Result<(), PageError> {
        self.ix.click(&CONTINUE_SHOPPING_BUTTON).await?;
        Ok(())
    }

    pub async fn checkout(&self) -> Result<(), PageError> {
        self.ix.click(&CHECKOUT_BUTTON).await?;
        Ok(())
    }

    pub async fn is_item_in_cart(&self, name: &str) -> bool {
        match self.item_names().await {
            Ok(names) => names.iter().any(|n| n == name),
            Err(_) => false,
        }
    }

    pub async fn are_items_in_cart(&self, names: &[&str]) -> Result<bool, PageError> {
        let in_cart = self.item_names().await?;
        Ok(names.iter().all(|name| in_cart.iter().any(|n| n == name)))
    }

    pub async fn item_price_by_name(&self, name: &str) -> Result<String, PageError> {
        let items = self.ix.find_all(&CART_ITEMS).await?;
        for item in items {
            let row_name = item
                .find(By::ClassName("inventory_item_name"))
                .await?
                .text()
                .await?;
            if row_name == name {
                return Ok(item
                    .find(By::ClassName("inventory_item_price"))
                    .await?
                    .text()
                    .await?);
            }
        }
        Err(PageError::NotFound(format!("item not found in cart: {name}")))
    }

    /// Sum of the displayed item prices.
    pub async fn total_price(&self) -> Result<f64, PageError> {
        let prices = self.item_prices().await?;
        let total = sortcheck::total(&prices).map_err(PageError::Price)?;
        info!("calculated cart total: ${total}");
        Ok(total)
    }

    pub async fn is_checkout_enabled(&self) -> bool {
        self.ix.is_enabled(&CHECKOUT_BUTTON).await
    }

    pub async fn is_continue_shopping_enabled(&self) -> bool {
        self.ix.is_enabled(&CONTINUE_SHOPPING_BUTTON).await
    }
}

#[async_trait]
impl Page for CartPage {
    fn interactor(&self) -> &Interactor {
        &self.ix
    }

    fn page_url(&self) -> String {
        format!("{}/cart.html", self.base_url)
    }

    async fn wait_for_load(&self) -> Result<(), PageError> {
        self.ix.wait_visible(&PAGE_TITLE).await?;
        self.ix.wait_visible(&CART_LIST).await?;
        self.ix.wait_visible(&CONTINUE_SHOPPING_BUTTON).await?;
        self.ix.wait_visible(&CHECKOUT_BUTTON).await?;
        info!("cart page loaded");
        Ok(())
    }

    async fn is_loaded(&self) -> bool {
        self.ix.is_visible(&PAGE_TITLE).await
            && self.ix.is_visible(&CART_LIST).await
            && self.ix.is_visible(&CONTINUE_SHOPPING_BUTTON).await
            && self.ix.is_visible(&CHECKOUT_BUTTON).await
    }
}
