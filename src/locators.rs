use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// How an element is looked up on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css(String),

    /// Raw XPath expression
    #[serde(rename = "xpath")]
    XPath(String),

    /// An element `tag` with a descendant `<span>` whose visible text matches `text`
    Label {
        tag: String,
        text: String,
        /// Match on a substring instead of the whole (whitespace-normalized) text
        #[serde(default)]
        partial: bool,
    },
}

/// Query strategy understood by a WebDriver server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Css,
    XPath,
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn label(tag: &str, text: &str) -> Self {
        Locator::Label {
            tag: tag.to_string(),
            text: text.to_string(),
            partial: false,
        }
    }

    pub fn partial_label(tag: &str, text: &str) -> Self {
        Locator::Label {
            tag: tag.to_string(),
            text: text.to_string(),
            partial: true,
        }
    }

    /// Lowers the locator into a strategy and query string for WebDriver
    pub fn query(&self) -> (Strategy, Cow<'_, str>) {
        match self {
            Locator::Css(selector) => (Strategy::Css, Cow::Borrowed(selector)),
            Locator::XPath(expr) => (Strategy::XPath, Cow::Borrowed(expr)),
            Locator::Label { tag, text, partial } => {
                let literal = xpath_literal(text);
                let expr = if *partial {
                    format!(".//{tag}[.//span[contains(normalize-space(.), {literal})]]")
                } else {
                    format!(".//{tag}[.//span[normalize-space(.)={literal}]]")
                };
                (Strategy::XPath, Cow::Owned(expr))
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::XPath(expr) => write!(f, "xpath `{expr}`"),
            Locator::Label { tag, text, .. } => write!(f, "<{tag}> labelled '{text}'"),
        }
    }
}

/// Quotes `text` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so text holding both quote kinds is
/// spliced together with `concat()`.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts = text
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect::<Vec<_>>()
        .join(", \"'\", ");
    format!("concat({parts})")
}

/// Locators driving category, location, price and pagination steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationLocators {
    /// Entry point of the category section
    pub category: Locator,

    /// Tag of the clickable location options; the label text comes from the configured province/city
    pub location_option_tag: String,

    pub min_price: Locator,
    pub max_price: Locator,
    pub load_more: Locator,
}

impl Default for NavigationLocators {
    fn default() -> Self {
        Self {
            category: Locator::partial_label("a", "Mobile Phones"),
            location_option_tag: "a".to_string(),
            min_price: Locator::css("input[placeholder='Min']"),
            max_price: Locator::css("input[placeholder='Max']"),
            load_more: Locator::label("button", "Load more"),
        }
    }
}

impl NavigationLocators {
    pub fn location_option(&self, label: &str) -> Locator {
        Locator::label(&self.location_option_tag, label)
    }
}

/// Locators for the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingLocators {
    pub container: Locator,
    pub item: Locator,
    /// Resolved relative to each item
    pub item_anchor: Locator,
}

impl Default for ListingLocators {
    fn default() -> Self {
        Self {
            container: Locator::css("ul._1aad128c.ec65250d"),
            item: Locator::css("ul._1aad128c.ec65250d > li"),
            item_anchor: Locator::css("article > div > a"),
        }
    }
}

/// Locators for the five fields of a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLocators {
    pub name: Locator,
    pub price: Locator,
    pub location: Locator,
    pub date: Locator,
    pub description: Locator,
}

impl Default for FieldLocators {
    fn default() -> Self {
        Self {
            name: Locator::css("h1._75bce902"),
            price: Locator::css("span._24469da7"),
            location: Locator::css("div._1ee53078"),
            date: Locator::css("span[aria-label='Creation date']"),
            description: Locator::css("div._472bfbef"),
        }
    }
}

/// Every page-layout dependency in one place, so markup changes are a config update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorMap {
    pub navigation: NavigationLocators,
    pub listing: ListingLocators,
    pub fields: FieldLocators,
}
