use serde::{Deserialize, Serialize};

/// Placeholder for a field that couldn't be extracted
pub const NOT_AVAILABLE: &str = "N/A";

/// Fields harvested from one detail page, as displayed by the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Detail page this record came from
    pub link: String,
    pub name: String,

    /// Raw price text, e.g. "Rs 45,000"
    pub price: String,
    pub location: String,

    /// Date as shown by the site; not parsed
    pub listed_at: String,
    pub description: String,
}

impl ListingRecord {
    /// A record with every field set to [`NOT_AVAILABLE`]
    pub fn unavailable(link: &str) -> Self {
        Self {
            link: link.to_string(),
            name: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            listed_at: NOT_AVAILABLE.to_string(),
            description: NOT_AVAILABLE.to_string(),
        }
    }

    pub fn normalized_price(&self) -> Option<i64> {
        normalize_price(&self.price)
    }
}

/// A listing row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredListing {
    pub id: i64,
    pub name: String,
    pub price: Option<i64>,
    pub location: String,
    pub listed_at: String,
    pub description: String,
    pub link: String,
}

/// Reads the digits of a free-text price in order.
///
/// Returns `None` for the sentinel, for text without digits, and for digit
/// runs too long for an `i64`.
pub fn normalize_price(text: &str) -> Option<i64> {
    if text == NOT_AVAILABLE {
        return None;
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<i64>() {
        Ok(price) => Some(price),
        Err(e) => {
            ::log::warn!("Price '{}' doesn't fit an integer: {}", text, e);
            None
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Successful "Load more" clicks during pagination
    pub load_more_clicks: usize,
    pub links_collected: usize,
    /// Links that weren't already stored
    pub links_recorded: usize,
    pub listings_extracted: usize,
    pub listings_persisted: usize,
    pub persistence_failures: usize,
}
