//! Static element locators.
//!
//! A [`Locator`] is an immutable description of how to find one or more
//! elements on a page. Pages define their locators as constants;
//! parameterized locators (one selector per product key) use a template
//! with a `{}` placeholder bound at call time.

use std::borrow::Cow;
use std::fmt;

use thirtyfour::By;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    Id,
    Css,
    ClassName,
    XPath,
}

/// An immutable element locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    strategy: Strategy,
    selector: Cow<'static, str>,
}

impl Locator {
    pub const fn id(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn class_name(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::ClassName,
            selector: Cow::Borrowed(selector),
        }
    }

    pub const fn xpath(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            selector: Cow::Borrowed(selector),
        }
    }

    /// Substitute `param` for the `{}` placeholder, yielding a concrete
    /// locator. Intended for templates like
    /// `css("[data-test='add-to-cart-{}']")` bound with a product's
    /// stable key.
    pub fn bind(&self, param: &str) -> Self {
        Self {
            strategy: self.strategy,
            selector: Cow::Owned(self.selector.replace("{}", param)),
        }
    }

    /// The raw selector text.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Convert to the WebDriver locator type.
    pub fn by(&self) -> By {
        match self.strategy {
            Strategy::Id => By::Id(self.selector.as_ref()),
            Strategy::Css => By::Css(self.selector.as_ref()),
            Strategy::ClassName => By::ClassName(self.selector.as_ref()),
            Strategy::XPath => By::XPath(self.selector.as_ref()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self.strategy {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::ClassName => "class",
            Strategy::XPath => "xpath",
        };
        write!(f, "{strategy}={}", self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_substitutes_placeholder() {
        const ADD_TO_CART: Locator = Locator::css("[data-test='add-to-cart-{}']");
        let bound = ADD_TO_CART.bind("sauce-labs-backpack");
        assert_eq!(
            bound.selector(),
            "[data-test='add-to-cart-sauce-labs-backpack']"
        );
    }

    #[test]
    fn bind_without_placeholder_is_identity() {
        const LOGIN: Locator = Locator::id("login-button");
        assert_eq!(LOGIN.bind("ignored"), LOGIN);
    }

    #[test]
    fn display_names_the_strategy() {
        assert_eq!(Locator::id("user-name").to_string(), "id=user-name");
        assert_eq!(
            Locator::class_name("shopping_cart_badge").to_string(),
            "class=shopping_cart_badge"
        );
    }
}
