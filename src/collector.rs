use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::error::{BrowserError, Error, Result};
use crate::locators::ListingLocators;
use crate::repository::Repository;
use crate::snapshot;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Reads detail-page links off the loaded listing page.
pub struct LinkCollector<'a> {
    base_url: &'a str,
    timeout: Duration,
    locators: &'a ListingLocators,
}

/// Links found by one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedLinks {
    /// Document order, duplicates kept
    pub links: Vec<String>,
    /// Links that weren't stored before this pass
    pub newly_recorded: usize,
}

impl<'a> LinkCollector<'a> {
    pub fn new(config: &'a HarvestConfig) -> Self {
        Self {
            base_url: &config.base_url,
            timeout: config.element_timeout(),
            locators: &config.locators.listing,
        }
    }

    /// Collects links, stores them and writes the links snapshot
    pub async fn collect_and_record<B: Browser>(
        &self,
        browser: &B,
        repository: &Repository,
        snapshot_path: &Path,
    ) -> Result<CollectedLinks> {
        let links = self.collect(browser).await?;

        let batch = repository.record_links(&links)?;
        snapshot::write_links(snapshot_path, &links)?;
        ::log::info!("Saved {} links to {}", links.len(), snapshot_path.display());

        Ok(CollectedLinks {
            links,
            newly_recorded: batch.inserted,
        })
    }

    /// Every item's link in document order. Items without a usable anchor are skipped.
    pub async fn collect<B: Browser>(&self, browser: &B) -> Result<Vec<String>> {
        browser
            .find_element(&self.locators.container, self.timeout)
            .await
            .map_err(Error::Collection)?;

        let items = browser
            .find_all(&self.locators.item)
            .await
            .map_err(Error::Collection)?;
        ::log::info!("Total listing items found: {}", items.len());

        let base = Url::parse(self.base_url).ok();
        let mut links = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let position = index + 1;
            match self.item_href(browser, item).await {
                Ok(Some(href)) => match canonical_link(base.as_ref(), &href) {
                    Some(link) => {
                        ::log::info!("Link {}: {}", position, link);
                        links.push(link);
                    }
                    None => ::log::warn!("Link {}: unusable href {:?}", position, href),
                },
                Ok(None) => ::log::debug!("Link {}: empty href, skipped", position),
                Err(e) => ::log::warn!("Link {}: no anchor in this item: {}", position, e),
            }
        }

        Ok(links)
    }

    async fn item_href<B: Browser>(
        &self,
        browser: &B,
        item: &B::Element,
    ) -> std::result::Result<Option<String>, BrowserError> {
        let anchor = browser.find_within(item, &self.locators.item_anchor).await?;
        let href = browser.attr(&anchor, "href").await?;
        Ok(href.filter(|h| !h.trim().is_empty()))
    }
}

/// Resolves `href` against the site and drops any fragment
fn canonical_link(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    let mut url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;
    use tempfile::TempDir;

    const LISTING_PAGE: &str = r#"
        <html><body>
          <ul class="_1aad128c ec65250d">
            <li><article><div><a href="https://www.olx.com.pk/item/iphone-12-iid-1">iPhone</a></div></article></li>
            <li><article><div><span>Featured</span></div></article></li>
            <li><article><div><a href="/item/galaxy-s21-iid-2#gallery">Galaxy</a></div></article></li>
          </ul>
        </body></html>
    "#;

    #[tokio::test]
    async fn test_collect_skips_items_without_anchor() {
        let config = HarvestConfig::default();
        let browser = FakeBrowser::with_page(LISTING_PAGE);

        let links = LinkCollector::new(&config).collect(&browser).await.unwrap();

        assert_eq!(
            links,
            vec![
                "https://www.olx.com.pk/item/iphone-12-iid-1".to_string(),
                "https://www.olx.com.pk/item/galaxy-s21-iid-2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_and_record() {
        let dir = TempDir::new().unwrap();
        let repository = Repository::new(&dir.path().join("olx_db")).unwrap();
        let snapshot_path = dir.path().join("extracted_links.csv");
        let config = HarvestConfig::default();
        let browser = FakeBrowser::with_page(LISTING_PAGE);

        let collected = LinkCollector::new(&config)
            .collect_and_record(&browser, &repository, &snapshot_path)
            .await
            .unwrap();

        assert_eq!(collected.links.len(), 2);
        assert_eq!(collected.newly_recorded, 2);
        assert_eq!(repository.links().unwrap().len(), 2);
        assert_eq!(snapshot::read_links(&snapshot_path).unwrap(), collected.links);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept_in_order() {
        let page = r#"
            <ul class="_1aad128c ec65250d">
              <li><article><div><a href="/item/a">A</a></div></article></li>
              <li><article><div><a href="">empty</a></div></article></li>
              <li><article><div><a href="/item/b">B</a></div></article></li>
              <li><article><div><a href="/item/a">A again</a></div></article></li>
            </ul>
        "#;
        let config = HarvestConfig::default();
        let browser = FakeBrowser::with_page(page);

        let links = LinkCollector::new(&config).collect(&browser).await.unwrap();
        assert_eq!(
            links,
            vec![
                "https://www.olx.com.pk/item/a".to_string(),
                "https://www.olx.com.pk/item/b".to_string(),
                "https://www.olx.com.pk/item/a".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_container_is_fatal() {
        let config = HarvestConfig::default();
        let browser = FakeBrowser::with_page("<html><body><p>No results</p></body></html>");

        let err = LinkCollector::new(&config).collect(&browser).await.unwrap_err();
        assert!(matches!(err, Error::Collection(BrowserError::ElementNotFound(_))));
    }

    #[test]
    fn test_canonical_link() {
        let base = Url::parse("https://www.olx.com.pk/").unwrap();
        assert_eq!(
            canonical_link(Some(&base), " /item/x#top ").as_deref(),
            Some("https://www.olx.com.pk/item/x")
        );
        assert_eq!(
            canonical_link(None, "https://example.com/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(canonical_link(None, "/relative"), None);
    }
}
