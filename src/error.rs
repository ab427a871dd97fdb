use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Failures raised by a browser automation session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("couldn't start a WebDriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("no WebDriver server accepted a session")]
    NoSession,
}

impl BrowserError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::ElementNotFound(_))
    }
}

/// The structural steps of listing navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStep {
    Category,
    Province,
    City,
    MinPrice,
    MaxPrice,
    Pagination,
}

impl fmt::Display for NavigationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationStep::Category => "category",
            NavigationStep::Province => "province",
            NavigationStep::City => "city",
            NavigationStep::MinPrice => "min price",
            NavigationStep::MaxPrice => "max price",
            NavigationStep::Pagination => "pagination",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser Error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Navigation failed at the {step} step: {source}")]
    Navigation {
        step: NavigationStep,
        #[source]
        source: BrowserError,
    },

    #[error("Couldn't read the listing page: {0}")]
    Collection(#[source] BrowserError),

    #[error("Persistence Error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Snapshot Error: {0}")]
    Snapshot(#[from] csv::Error),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config Error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Run exceeded its time limit of {0:?}")]
    TimedOut(Duration),
}

impl Error {
    pub(crate) fn navigation(step: NavigationStep) -> impl FnOnce(BrowserError) -> Error {
        move |source| Error::Navigation { step, source }
    }
}
