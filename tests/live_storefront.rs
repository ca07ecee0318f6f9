//! Live end-to-end flows against the real storefront.
//!
//! These tests need a running WebDriver server (chromedriver on :9515
//! with the shipped configuration) and network access to the demo app,
//! so they are ignored by default:
//!
//! ```sh
//! cargo test --test live_storefront -- --ignored --test-threads=1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use storecheck::pages::{CartPage, InventoryPage, LoginPage, Page};
use storecheck::suite::scenarios::INVALID_LOGIN_MESSAGE;
use storecheck::{Interactor, SessionRegistry, Settings, TestData, WorkerId};

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

struct Live {
    settings: Arc<Settings>,
    registry: Arc<SessionRegistry>,
    worker: WorkerId,
}

impl Live {
    async fn start(worker: WorkerId) -> Self {
        let settings = Arc::new(Settings::load(manifest_path("storecheck.toml")).unwrap());
        let registry = Arc::new(SessionRegistry::new(settings.clone()));
        registry.initialize(worker, None).await.unwrap();
        Self {
            settings,
            registry,
            worker,
        }
    }

    fn interactor(&self) -> Interactor {
        Interactor::new(
            self.registry.get(self.worker).unwrap(),
            self.settings.explicit_wait().unwrap(),
        )
    }

    fn login_page(&self) -> LoginPage {
        LoginPage::new(self.interactor(), self.settings.app_url())
    }

    fn inventory_page(&self) -> InventoryPage {
        InventoryPage::new(self.interactor(), self.settings.app_url())
    }

    fn cart_page(&self) -> CartPage {
        CartPage::new(self.interactor(), self.settings.app_url())
    }

    async fn stop(self) {
        self.registry.quit(self.worker).await;
    }
}

fn test_data() -> TestData {
    TestData::new(manifest_path("fixtures"))
}

#[tokio::test]
#[ignore = "requires a running webdriver server and network access"]
async fn valid_login_reaches_the_inventory_page() {
    let live = Live::start(WorkerId(100)).await;
    let login = live.login_page();
    login.open().await.unwrap();

    let user = test_data().user("standard_user").unwrap();
    login.login(&user.username, &user.password).await.unwrap();

    let inventory = live.inventory_page();
    inventory.wait_for_load().await.unwrap();
    assert!(inventory.is_loaded().await);
    assert_eq!(inventory.title_text().await, "Products");

    live.stop().await;
}

#[tokio::test]
#[ignore = "requires a running webdriver server and network access"]
async fn invalid_password_shows_the_documented_banner() {
    let live = Live::start(WorkerId(101)).await;
    let login = live.login_page();
    login.open().await.unwrap();

    let user = test_data().invalid_user("wrong_password").unwrap();
    login.login(&user.username, &user.password).await.unwrap();

    assert_eq!(login.error_message().await, INVALID_LOGIN_MESSAGE);
    assert!(!live.inventory_page().is_loaded().await);

    live.stop().await;
}

#[tokio::test]
#[ignore = "requires a running webdriver server and network access"]
async fn price_sort_orders_the_listing() {
    let live = Live::start(WorkerId(102)).await;
    let login = live.login_page();
    login.open().await.unwrap();

    let user = test_data().user("standard_user").unwrap();
    login.login(&user.username, &user.password).await.unwrap();

    let inventory = live.inventory_page();
    inventory.wait_for_load().await.unwrap();

    inventory.select_sort_option("lohi").await.unwrap();
    assert!(inventory.sorted_by_price_ascending().await.unwrap());

    inventory.select_sort_option("hilo").await.unwrap();
    assert!(inventory.sorted_by_price_descending().await.unwrap());

    live.stop().await;
}

#[tokio::test]
#[ignore = "requires a running webdriver server and network access"]
async fn cart_total_matches_the_fixture_catalog() {
    let live = Live::start(WorkerId(103)).await;
    let login = live.login_page();
    login.open().await.unwrap();

    let data = test_data();
    let user = data.user("standard_user").unwrap();
    login.login(&user.username, &user.password).await.unwrap();

    let inventory = live.inventory_page();
    inventory.wait_for_load().await.unwrap();

    let products = data.products().unwrap();
    let picks = &products[..2];
    for product in picks {
        inventory.add_to_cart_by_key(&product.key).await.unwrap();
    }
    assert_eq!(inventory.shell().cart_badge_count().await, 2);

    inventory.shell().open_cart().await.unwrap();
    let cart = live.cart_page();
    cart.wait_for_load().await.unwrap();

    let expected: f64 = picks.iter().map(|p| p.price).sum();
    let total = cart.total_price().await.unwrap();
    assert!((total - expected).abs() < 1e-3);

    live.stop().await;
}
