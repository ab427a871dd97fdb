use super::{Browser, SessionFactory};
use crate::error::BrowserError;
use crate::locators::{Locator, Strategy};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Ports local WebDriver servers commonly listen on
const FALLBACK_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Opens fantoccini sessions against a WebDriver server.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: &str, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            headless,
        }
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        if self.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--window-size=1920,1080"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    async fn connect(&self, url: &str) -> Result<Client, BrowserError> {
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(url)
            .await?;
        Ok(client)
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    type Session = WebDriverSession;

    /// Connects to the configured WebDriver server, then to the usual local ports
    async fn open(&self) -> Result<WebDriverSession, BrowserError> {
        match self.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(WebDriverSession { client });
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
            }
        }

        for url in FALLBACK_URLS {
            if url == self.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(WebDriverSession { client });
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(BrowserError::NoSession)
    }
}

/// A live fantoccini session.
pub struct WebDriverSession {
    client: Client,
}

fn webdriver_locator<'a>(strategy: Strategy, query: &'a str) -> fantoccini::Locator<'a> {
    match strategy {
        Strategy::Css => fantoccini::Locator::Css(query),
        Strategy::XPath => fantoccini::Locator::XPath(query),
    }
}

/// Folds the "nothing matched" flavours of [`CmdError`] into `ElementNotFound`
fn lookup_error(error: CmdError, locator: &Locator) -> BrowserError {
    if matches!(error, CmdError::WaitTimeout) || error.is_no_such_element() {
        BrowserError::ElementNotFound(locator.to_string())
    } else {
        BrowserError::Command(error)
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    type Element = Element;

    async fn navigate_to(&self, url: &str) -> Result<(), BrowserError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn refresh(&self) -> Result<(), BrowserError> {
        self.client.refresh().await?;
        Ok(())
    }

    async fn find_element(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        let (strategy, query) = locator.query();
        self.client
            .wait()
            .at_most(timeout)
            .for_element(webdriver_locator(strategy, &query))
            .await
            .map_err(|e| lookup_error(e, locator))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>, BrowserError> {
        let (strategy, query) = locator.query();
        let elements = self
            .client
            .find_all(webdriver_locator(strategy, &query))
            .await?;
        Ok(elements)
    }

    async fn find_within(&self, parent: &Element, locator: &Locator) -> Result<Element, BrowserError> {
        let (strategy, query) = locator.query();
        parent
            .find(webdriver_locator(strategy, &query))
            .await
            .map_err(|e| lookup_error(e, locator))
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        element.click().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &Element, keys: &str) -> Result<(), BrowserError> {
        element.send_keys(keys).await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        Ok(element.text().await?)
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(element.attr(name).await?)
    }

    async fn close(self) -> Result<(), BrowserError> {
        if let Err(e) = self.client.close().await {
            if e.to_string().contains("Unable to find session") {
                ::log::warn!("WebDriver session was already gone at close");
                return Ok(());
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_capabilities() {
        let factory = WebDriverFactory::new("http://localhost:4444", true);
        let caps = factory.capabilities();
        assert!(caps.contains_key("goog:chromeOptions"));

        let factory = WebDriverFactory::new("http://localhost:4444", false);
        assert!(factory.capabilities().is_empty());
    }

    #[test]
    fn test_wait_timeout_is_not_found() {
        let locator = Locator::css("span._24469da7");
        let err = lookup_error(CmdError::WaitTimeout, &locator);
        assert!(err.is_not_found());
    }
}
