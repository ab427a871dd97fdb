//! In-memory browser double backed by `scraper`, for tests.

use super::{Browser, SessionFactory};
use crate::error::BrowserError;
use crate::locators::Locator;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something the code under test asked the browser to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Refresh,
    Click(String),
    SendKeys { target: String, keys: String },
    Scroll,
}

/// Snapshot of a matched element
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub outer_html: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub found_by: String,
}

/// Serves HTML pages from memory. Clicks are recorded but never change the page.
pub struct FakeBrowser {
    pages: HashMap<String, String>,
    current: Mutex<String>,
    actions: Mutex<Vec<Action>>,
    closed: Arc<AtomicUsize>,
    navigate_delay: Duration,
}

impl FakeBrowser {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            current: Mutex::new(String::new()),
            actions: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicUsize::new(0)),
            navigate_delay: Duration::ZERO,
        }
    }

    /// A session already showing `html`
    pub fn with_page(html: &str) -> Self {
        let browser = Self::new(HashMap::new());
        *browser.current.lock().unwrap() = html.to_string();
        browser
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions().iter().filter(|a| pred(a)).count()
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }

    fn current_html(&self) -> String {
        self.current.lock().unwrap().clone()
    }
}

fn snapshot(element: ElementRef<'_>, locator: &Locator) -> FakeElement {
    FakeElement {
        outer_html: element.html(),
        text: visible_text(element),
        attrs: element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        found_by: locator.to_string(),
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_all(doc: &Html, locator: &Locator) -> Vec<FakeElement> {
    match locator {
        Locator::Css(css) => match Selector::parse(css) {
            Ok(selector) => doc
                .select(&selector)
                .map(|e| snapshot(e, locator))
                .collect(),
            Err(_) => Vec::new(),
        },
        Locator::Label { tag, text, partial } => {
            let (Ok(tag_selector), Ok(span_selector)) =
                (Selector::parse(tag), Selector::parse("span"))
            else {
                return Vec::new();
            };
            doc.select(&tag_selector)
                .filter(|candidate| {
                    candidate.select(&span_selector).any(|span| {
                        let shown = visible_text(span);
                        if *partial {
                            shown.contains(text.as_str())
                        } else {
                            shown == *text
                        }
                    })
                })
                .map(|e| snapshot(e, locator))
                .collect()
        }
        // XPath is left to real browsers
        Locator::XPath(_) => Vec::new(),
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn navigate_to(&self, url: &str) -> Result<(), BrowserError> {
        self.record(Action::Navigate(url.to_string()));
        let html = self.pages.get(url).cloned().unwrap_or_default();
        *self.current.lock().unwrap() = html;
        if !self.navigate_delay.is_zero() {
            tokio::time::sleep(self.navigate_delay).await;
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), BrowserError> {
        self.record(Action::Refresh);
        Ok(())
    }

    async fn find_element(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<FakeElement, BrowserError> {
        let doc = Html::parse_document(&self.current_html());
        select_all(&doc, locator)
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, BrowserError> {
        let doc = Html::parse_document(&self.current_html());
        Ok(select_all(&doc, locator))
    }

    async fn find_within(
        &self,
        parent: &FakeElement,
        locator: &Locator,
    ) -> Result<FakeElement, BrowserError> {
        let fragment = Html::parse_fragment(&parent.outer_html);
        select_all(&fragment, locator)
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }

    async fn click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.record(Action::Click(element.found_by.clone()));
        Ok(())
    }

    async fn send_keys(&self, element: &FakeElement, keys: &str) -> Result<(), BrowserError> {
        self.record(Action::SendKeys {
            target: element.found_by.clone(),
            keys: keys.to_string(),
        });
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.record(Action::Scroll);
        Ok(())
    }

    async fn text(&self, element: &FakeElement) -> Result<String, BrowserError> {
        Ok(element.text.clone())
    }

    async fn attr(&self, element: &FakeElement, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(element.attrs.get(name).cloned())
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`FakeBrowser`] sessions over the same set of pages.
pub struct FakeFactory {
    pages: HashMap<String, String>,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    navigate_delay: Duration,
}

impl FakeFactory {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            navigate_delay: Duration::ZERO,
        }
    }

    /// Every page load of the sessions handed out takes `delay`
    pub fn with_navigate_delay(mut self, delay: Duration) -> Self {
        self.navigate_delay = delay;
        self
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeBrowser;

    async fn open(&self) -> Result<FakeBrowser, BrowserError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut browser = FakeBrowser::new(self.pages.clone());
        browser.closed = Arc::clone(&self.closed);
        browser.navigate_delay = self.navigate_delay;
        Ok(browser)
    }
}
