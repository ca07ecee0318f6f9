//! The inventory (product listing) screen.

use async_trait::async_trait;
use thirtyfour::By;
use tracing::{error, info};

use super::{sortcheck, Page, PageError, Shell};
use crate::interact::Interactor;
use crate::locator::Locator;

const PAGE_TITLE: Locator = Locator::class_name("title");
const INVENTORY_CONTAINER: Locator = Locator::id("inventory_container");
const PRODUCT_SORT_CONTAINER: Locator = Locator::class_name("product_sort_container");
const INVENTORY_ITEMS: Locator = Locator::class_name("inventory_item");
const INVENTORY_ITEM_NAME: Locator = Locator::class_name("inventory_item_name");
const INVENTORY_ITEM_DESC: Locator = Locator::class_name("inventory_item_desc");
const INVENTORY_ITEM_PRICE: Locator = Locator::class_name("inventory_item_price");
const BACK_TO_PRODUCTS: Locator = Locator::id("back-to-products");

// Per-product locators built from the product's stable key.
const ADD_TO_CART_BUTTON: Locator = Locator::css("[data-test='add-to-cart-{}']");
const REMOVE_BUTTON: Locator = Locator::css("[data-test='remove-{}']");
const PRODUCT_TITLE_LINK: Locator = Locator::css("[data-test='item-{}-title-link']");
const PRODUCT_IMAGE_LINK: Locator = Locator::css("[data-test='item-{}-img-link']");

pub struct InventoryPage {
    ix: Interactor,
    shell: Shell,
    base_url: String,
}

impl InventoryPage {
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

    /// Select a sort order by its option value: `az`, `za`, `lohi`, `hilo`.
    pub async fn select_sort_option(&self, value: &str) -> Result<(), PageError> {
        self.ix
            .select_by_value(&PRODUCT_SORT_CONTAINER, value)
            .await?;
        info!("sort option selected: {value}");
        Ok(())
    }

    pub async fn current_sort_option(&self) -> Result<String, PageError> {
        Ok(self
            .ix
            .attr(&PRODUCT_SORT_CONTAINER, "value")
            .await?
            .unwrap_or_default())
    }

    pub async fn product_names(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&INVENTORY_ITEM_NAME).await?)
    }

    pub async fn product_descriptions(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&INVENTORY_ITEM_DESC).await?)
    }

    /// Displayed prices, currency symbol included.
    pub async fn product_prices(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ix.all_texts(&INVENTORY_ITEM_PRICE).await?)
    }

    /// Prices as numbers; garbled rows are skipped with an error log.
    pub async fn product_price_values(&self) -> Result<Vec<f64>, PageError> {
        Ok(sortcheck::parse_prices(&self.product_prices().await?))
    }

    pub async fn product_count(&self) -> usize {
        self.ix.count(&INVENTORY_ITEMS).await
    }

    /// Add a product to the cart by its displayed name, scanning the
    /// listing for a matching row.
    pub async fn add_to_cart_by_name(&self, name: &str) -> Result<(), PageError> {
        let items = self.ix.find_all(&INVENTORY_ITEMS).await?;
        for item in items {
            let row_name = item
                .find(By::ClassName("inventory_item_name"))
                .await?
                .text()
                .await?;
            if row_name == name {
                item.find(By::Css("[data-test^='add-to-cart']"))
                    .await?
                    .click()
                    .await?;
                info!("product added to cart: {name}");
                return Ok(());
            }
        }
        Err(PageError::NotFound(format!("product not found: {name}")))
    }

    /// Add by the product's stable key (`sauce-labs-backpack`).
    pub async fn add_to_cart_by_key(&self, key: &str) -> Result<(), PageError> {
        self.ix.click(&ADD_TO_CART_BUTTON.bind(key)).await?;
        info!("product added to cart: {key}");
        Ok(())
    }

    pub async fn remove_from_cart_by_key(&self, key: &str) -> Result<(), PageError> {
        self.ix.click(&REMOVE_BUTTON.bind(key)).await?;
        info!("product removed from cart: {key}");
        Ok(())
    }

    /// A product is "in the cart" when its remove button is showing.
    pub async fn is_product_in_cart(&self, key: &str) -> bool {
        self.ix.is_visible(&REMOVE_BUTTON.bind(key)).await
    }

    pub async fn open_product_by_title(&self, key: &str) -> Result<(), PageError> {
        self.ix.click(&PRODUCT_TITLE_LINK.bind(key)).await?;
        Ok(())
    }

    pub async fn open_product_by_image(&self, key: &str) -> Result<(), PageError> {
        self.ix.click(&PRODUCT_IMAGE_LINK.bind(key)).await?;
        Ok(())
    }

    pub async fn add_all_to_cart(&self, names: &[&str]) -> Result<(), PageError> {
        for name in names {
            self.add_to_cart_by_name(name).await?;
        }
        info!("added {} products to cart", names.len());
        Ok(())
    }

    pub async fn is_back_to_products_visible(&self) -> bool {
        self.ix.is_visible(&BACK_TO_PRODUCTS).await
    }

    pub async fn sorted_by_name_ascending(&self) -> Result<bool, PageError> {
        let names = self.product_names().await?;
        Ok(report_violation(
            sortcheck::first_unsorted_name_ascending(&names),
            "name ascending",
        ))
    }

    pub async fn sorted_by_name_descending(&self) -> Result<bool, PageError> {
        let names = self.product_names().await?;
        Ok(report_violation(
            sortcheck::first_unsorted_name_descending(&names),
            "name descending",
        ))
    }

    pub async fn sorted_by_price_ascending(&self) -> Result<bool, PageError> {
        let prices = self.product_price_values().await?;
        Ok(report_violation(
            sortcheck::first_unsorted_price_ascending(&prices),
            "price ascending",
        ))
    }

    pub async fn sorted_by_price_descending(&self) -> Result<bool, PageError> {
        let prices = self.product_price_values().await?;
        Ok(report_violation(
            sortcheck::first_unsorted_price_descending(&prices),
            "price descending",
        ))
    }
}

fn report_violation(violation: Option<usize>, order: &str) -> bool {
    match violation {
        Some(index) => {
            error!("products not sorted by {order}; first violation at position {index}");
            false
        }
        None => {
            info!("products verified as sorted by {order}");
            true
        }
    }
}

#[async_trait]
impl Page for InventoryPage {
    fn interactor(&self) -> &Interactor {
        &self.ix
    }

    fn page_url(&self) -> String {
        format!("{}/inventory.html", self.base_url)
    }

    async fn wait_for_load(&self) -> Result<(), PageError> {
        self.ix.wait_visible(&PAGE_TITLE).await?;
        self.ix.wait_visible(&INVENTORY_CONTAINER).await?;
        self.ix.wait_visible(&PRODUCT_SORT_CONTAINER).await?;
        info!("inventory page loaded");
        Ok(())
    }

    async fn is_loaded(&self) -> bool {
        self.ix.is_visible(&PAGE_TITLE).await
            && self.ix.is_visible(&INVENTORY_CONTAINER).await
            && self.ix.is_visible(&PRODUCT_SORT_CONTAINER).await
    }
}
