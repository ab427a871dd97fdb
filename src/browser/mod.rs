use crate::error::BrowserError;
use crate::locators::Locator;
use async_trait::async_trait;
use std::time::Duration;

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use webdriver::{WebDriverFactory, WebDriverSession};

/// WebDriver key codepoints used when typing into inputs
pub mod keys {
    pub const CONTROL: char = '\u{E009}';
    pub const DELETE: char = '\u{E017}';
    pub const ENTER: char = '\u{E007}';
}

/// The browser automation capability the pipeline drives.
///
/// A session shows one page at a time; every call blocks until it completes
/// or its own timeout elapses.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to an element on the current page
    type Element: Send + Sync;

    /// Load `url` in the session
    async fn navigate_to(&self, url: &str) -> Result<(), BrowserError>;

    /// Reload the current page
    async fn refresh(&self) -> Result<(), BrowserError>;

    /// Poll until an element matching `locator` is present, up to `timeout`
    async fn find_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, BrowserError>;

    /// All elements currently matching `locator`, in document order
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, BrowserError>;

    /// First descendant of `parent` matching `locator`, without waiting
    async fn find_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Self::Element, BrowserError>;

    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    /// Type `keys` into the element; may contain codepoints from [`keys`]
    async fn send_keys(&self, element: &Self::Element, keys: &str) -> Result<(), BrowserError>;

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError>;

    /// Visible text of the element
    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    async fn attr(&self, element: &Self::Element, name: &str)
    -> Result<Option<String>, BrowserError>;

    /// Release the session
    async fn close(self) -> Result<(), BrowserError>
    where
        Self: Sized;
}

/// Opens new browser sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Browser + 'static;

    async fn open(&self) -> Result<Self::Session, BrowserError>;
}
