use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DriverError
// ---------------------------------------------------------------------------

/// Failures from the UI-actuation capability. These are recoverable at the
/// per-target level: the run controller marks the target skipped and moves
/// on rather than aborting the run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("webdriver error '{error}': {message}")]
    Protocol { error: String, message: String },

    #[error("unexpected webdriver response: {0}")]
    BadResponse(String),
}

// ---------------------------------------------------------------------------
// Element / UiDriver
// ---------------------------------------------------------------------------

/// Opaque handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element(pub String);

/// The UI-actuation capability the actuator and run controller are written
/// against. The production implementation speaks the WebDriver protocol
/// ([`crate::webdriver::WebDriverSession`]); tests substitute a scripted
/// fake so actuation strategies are exercised without a browser.
pub trait UiDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;
    fn find_all(&mut self, css: &str) -> Result<Vec<Element>, DriverError>;
    fn element_text(&mut self, element: &Element) -> Result<String, DriverError>;
    fn click(&mut self, element: &Element) -> Result<(), DriverError>;
    fn run_script(&mut self, script: &str) -> Result<Value, DriverError>;
    fn current_url(&mut self) -> Result<String, DriverError>;
    fn cookies(&mut self) -> Result<Vec<Value>, DriverError>;
    fn add_cookie(&mut self, cookie: &Value) -> Result<(), DriverError>;
}

// ---------------------------------------------------------------------------
// Scripted fake for tests
// ---------------------------------------------------------------------------
