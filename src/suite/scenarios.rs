//! Built-in scenarios covering the storefront's core flows.
//!
//! Bodies are plain async functions over [`ScenarioCtx`]; registration
//! happens in [`all`]. Assertion failures surface as `anyhow` errors,
//! which the harness records and (if configured) retries.

use anyhow::ensure;

use super::{Scenario, ScenarioCtx};
use crate::pages::Page;

/// The app's documented banner for credentials that match no user.
pub const INVALID_LOGIN_MESSAGE: &str =
    "Epic sadface: Username and password do not match any user in this service";

/// The app's documented banner for a locked-out account.
pub const LOCKED_OUT_MESSAGE: &str = "Epic sadface: Sorry, this user has been locked out.";

/// Every registered scenario, in declaration order.
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "login_standard_user",
            description: "Valid login lands on the inventory page",
            class: "login",
            tags: &["login", "smoke"],
            run: |ctx| Box::pin(login_standard_user(ctx)),
        },
        Scenario {
            name: "login_invalid_password",
            description: "Wrong password shows the mismatch banner and stays on login",
            class: "login",
            tags: &["login"],
            run: |ctx| Box::pin(login_invalid_password(ctx)),
        },
        Scenario {
            name: "login_locked_out_user",
            description: "Locked-out account is refused with the locked-out banner",
            class: "login",
            tags: &["login"],
            run: |ctx| Box::pin(login_locked_out_user(ctx)),
        },
        Scenario {
            name: "inventory_sort_by_name",
            description: "Name sort orders products A-Z and Z-A",
            class: "inventory",
            tags: &["inventory"],
            run: |ctx| Box::pin(inventory_sort_by_name(ctx)),
        },
        Scenario {
            name: "inventory_sort_by_price",
            description: "Price sort orders products low-high and high-low",
            class: "inventory",
            tags: &["inventory"],
            run: |ctx| Box::pin(inventory_sort_by_price(ctx)),
        },
        Scenario {
            name: "cart_add_and_remove",
            description: "Items added from the listing appear in the cart and can be removed",
            class: "cart",
            tags: &["cart"],
            run: |ctx| Box::pin(cart_add_and_remove(ctx)),
        },
        Scenario {
            name: "cart_total_matches_catalog",
            description: "Cart total equals the sum of the fixture prices",
            class: "cart",
            tags: &["cart"],
            run: |ctx| Box::pin(cart_total_matches_catalog(ctx)),
        },
    ]
}

async fn login_standard_user(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let login = ctx.login_page()?;
    login.open().await?;

    let user = ctx.data.user("standard_user")?;
    ctx.step("logging in with the standard user");
    login.login(&user.username, &user.password).await?;

    let inventory = ctx.inventory_page()?;
    inventory.wait_for_load().await?;
    ensure!(
        inventory.is_loaded().await,
        "inventory page did not load after a valid login"
    );
    Ok(())
}

async fn login_invalid_password(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let login = ctx.login_page()?;
    login.open().await?;

    let user = ctx.data.invalid_user("wrong_password")?;
    ctx.step("logging in with a wrong password");
    login.login(&user.username, &user.password).await?;

    let banner = login.error_message().await;
    ensure!(
        banner == INVALID_LOGIN_MESSAGE,
        "unexpected error banner: '{banner}'"
    );
    ensure!(
        !ctx.inventory_page()?.is_loaded().await,
        "inventory page loaded despite invalid credentials"
    );
    Ok(())
}

async fn login_locked_out_user(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let login = ctx.login_page()?;
    login.open().await?;

    let user = ctx.data.user("locked_out_user")?;
    ctx.step("logging in with the locked-out user");
    login.login(&user.username, &user.password).await?;

    let banner = login.error_message().await;
    ensure!(
        banner == LOCKED_OUT_MESSAGE,
        "unexpected error banner: '{banner}'"
    );
    Ok(())
}

async fn inventory_sort_by_name(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let inventory = login_as_standard(&ctx).await?;

    ctx.step("sorting by name A-Z");
    inventory.select_sort_option("az").await?;
    ensure!(
        inventory.sorted_by_name_ascending().await?,
        "products are not sorted by name ascending"
    );

    ctx.step("sorting by name Z-A");
    inventory.select_sort_option("za").await?;
    ensure!(
        inventory.sorted_by_name_descending().await?,
        "products are not sorted by name descending"
    );
    Ok(())
}

async fn inventory_sort_by_price(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let inventory = login_as_standard(&ctx).await?;

    ctx.step("sorting by price low to high");
    inventory.select_sort_option("lohi").await?;
    ensure!(
        inventory.sorted_by_price_ascending().await?,
        "products are not sorted by price ascending"
    );

    ctx.step("sorting by price high to low");
    inventory.select_sort_option("hilo").await?;
    ensure!(
        inventory.sorted_by_price_descending().await?,
        "products are not sorted by price descending"
    );
    Ok(())
}

async fn cart_add_and_remove(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let inventory = login_as_standard(&ctx).await?;

    let products = ctx.data.products()?;
    ensure!(products.len() >= 2, "fixture catalog needs at least two products");
    let first = &products[0];
    let second = &products[1];

    ctx.step(&format!("adding '{}' and '{}'", first.name, second.name));
    inventory.add_to_cart_by_key(&first.key).await?;
    inventory.add_to_cart_by_key(&second.key).await?;
    ensure!(
        inventory.shell().cart_badge_count().await == 2,
        "cart badge should show 2 items"
    );
    ensure!(
        inventory.is_product_in_cart(&first.key).await,
        "'{}' should show its remove button",
        first.name
    );

    ctx.step("opening the cart");
    inventory.shell().open_cart().await?;
    let cart = ctx.cart_page()?;
    cart.wait_for_load().await?;
    ensure!(
        cart.are_items_in_cart(&[&first.name, &second.name]).await?,
        "both items should be listed in the cart"
    );

    ctx.step(&format!("removing '{}'", first.name));
    cart.remove_by_name(&first.name).await?;
    ensure!(cart.item_count().await == 1, "one item should remain");
    ensure!(
        !cart.is_item_in_cart(&first.name).await,
        "'{}' should be gone from the cart",
        first.name
    );
    Ok(())
}

async fn cart_total_matches_catalog(ctx: ScenarioCtx) -> anyhow::Result<()> {
    let inventory = login_as_standard(&ctx).await?;

    let products = ctx.data.products()?;
    ensure!(products.len() >= 2, "fixture catalog needs at least two products");
    let picks = &products[..2];

    for product in picks {
        inventory.add_to_cart_by_key(&product.key).await?;
    }

    inventory.shell().open_cart().await?;
    let cart = ctx.cart_page()?;
    cart.wait_for_load().await?;

    let total = cart.total_price().await?;
    let expected: f64 = picks.iter().map(|p| p.price).sum();
    ensure!(
        (total - expected).abs() < 1e-3,
        "cart total ${total} does not match expected ${expected}"
    );
    Ok(())
}

/// Shared setup for post-login scenarios: open the login page, sign in
/// with the standard user, wait for the inventory page.
async fn login_as_standard(ctx: &ScenarioCtx) -> anyhow::Result<crate::pages::InventoryPage> {
    let login = ctx.login_page()?;
    login.open().await?;

    let user = ctx.data.user("standard_user")?;
    login.login(&user.username, &user.password).await?;

    let inventory = ctx.inventory_page()?;
    inventory.wait_for_load().await?;
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_has_a_class_and_at_least_one_tag() {
        for scenario in all() {
            assert!(!scenario.class.is_empty(), "{} has no class", scenario.name);
            assert!(!scenario.tags.is_empty(), "{} has no tags", scenario.name);
        }
    }

    #[test]
    fn scenario_names_are_unique() {
        let scenarios = all();
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }
}
