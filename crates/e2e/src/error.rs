//! Error types for the scenario layer

use thiserror::Error;

use conduit_harness::HarnessError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("browser runtime not found; install Node and Playwright (npm i playwright)")]
    BrowserNotFound,

    #[error("application unreachable at {url} after {attempts} attempts")]
    AppUnreachable { url: String, attempts: usize },

    #[error("browser script failed: {0}")]
    Script(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
