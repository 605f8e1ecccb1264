use crate::config::Config;
use crate::driver::{DriverError, Element, UiDriver};
use crate::types::Outcome;
use std::thread;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Labels and selectors
// ---------------------------------------------------------------------------

/// Labels meaning "we currently follow this account". The platform shows
/// "Requested" for pending follow requests to private accounts.
const FOLLOWING_LABELS: [&str; 2] = ["Following", "Requested"];
const FOLLOW_LABEL: &str = "Follow";
const UNFOLLOW_LABEL: &str = "Unfollow";

const BUTTONS: &str = "button";
const DIALOG_BUTTONS: &str = "[role='dialog'] button";
const CLICKABLES: &str = "button, div, span, a";

/// The platform renders the confirmation control as a button, div, or span
/// depending on the experiment bucket; this scripted scan is the last resort.
const UNFOLLOW_SCAN_SCRIPT: &str = "\
var elements = document.querySelectorAll('button, div, span, a');\n\
for (var el of elements) {\n\
    if (el.textContent.trim() === 'Unfollow') {\n\
        el.click();\n\
        return true;\n\
    }\n\
}\n\
return false;";

// ---------------------------------------------------------------------------
// DetectionStrategy
// ---------------------------------------------------------------------------

/// Ordered fallback strategies for locating the "Unfollow" confirmation
/// control once the dialog is open. Each strategy swallows its own driver
/// failures and reports whether it managed to click the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// Exact-text match on structured button elements, dialog-scoped first.
    DialogButton,
    /// Exact-text match across any clickable element type.
    AnyElementText,
    /// In-page script that scans and clicks directly.
    ScriptedScan,
}

impl DetectionStrategy {
    pub fn all() -> &'static [DetectionStrategy] {
        &[
            DetectionStrategy::DialogButton,
            DetectionStrategy::AnyElementText,
            DetectionStrategy::ScriptedScan,
        ]
    }

    /// Try to click the confirmation control. Returns false on any failure;
    /// the caller moves on to the next strategy.
    fn attempt(self, driver: &mut dyn UiDriver) -> bool {
        match self {
            DetectionStrategy::DialogButton => {
                for selector in [DIALOG_BUTTONS, BUTTONS] {
                    if click_matching(driver, selector, UNFOLLOW_LABEL) {
                        return true;
                    }
                }
                false
            }
            DetectionStrategy::AnyElementText => {
                click_matching(driver, CLICKABLES, UNFOLLOW_LABEL)
            }
            DetectionStrategy::ScriptedScan => match driver.run_script(UNFOLLOW_SCAN_SCRIPT) {
                Ok(value) => value.as_bool().unwrap_or(false),
                Err(err) => {
                    tracing::debug!(%err, "scripted unfollow scan failed");
                    false
                }
            },
        }
    }
}

/// Click the first element under `selector` whose trimmed text equals
/// `label`. Per-element text and click failures are skipped, not fatal.
fn click_matching(driver: &mut dyn UiDriver, selector: &str, label: &str) -> bool {
    let elements = match driver.find_all(selector) {
        Ok(elements) => elements,
        Err(err) => {
            tracing::debug!(selector, %err, "element query failed");
            return false;
        }
    };
    for element in elements {
        let text = match driver.element_text(&element) {
            Ok(text) => text,
            Err(_) => continue,
        };
        if text.trim() == label {
            match driver.click(&element) {
                Ok(()) => return true,
                Err(_) => continue,
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

/// Drives the per-account unfollow sequence against a [`UiDriver`] and
/// classifies the outcome.
pub struct Actuator {
    base_url: String,
    settle: Duration,
    dialog_wait: Duration,
}

impl Actuator {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            settle: config.settle(),
            dialog_wait: config.dialog_wait(),
        }
    }

    fn profile_url(&self, username: &str) -> String {
        format!("{}/{}/", self.base_url, username)
    }

    /// Visit `username`'s profile and unfollow them.
    ///
    /// The returned outcome is idempotent bookkeeping: an account that was
    /// already unfollowed classifies as [`Outcome::AlreadyUnfollowed`], not
    /// an error. Driver errors propagate so the run controller can mark the
    /// target skipped and continue.
    pub fn process(
        &self,
        driver: &mut dyn UiDriver,
        username: &str,
    ) -> Result<Outcome, DriverError> {
        driver.navigate(&self.profile_url(username))?;
        pause(self.settle);

        let buttons = button_labels(driver)?;
        let following = buttons
            .iter()
            .find(|(_, text)| FOLLOWING_LABELS.contains(&text.as_str()));
        let Some((following, _)) = following else {
            if buttons.iter().any(|(_, text)| text == FOLLOW_LABEL) {
                return Ok(Outcome::AlreadyUnfollowed);
            }
            return Ok(Outcome::NotFound);
        };

        driver.click(following)?;
        pause(self.dialog_wait);

        let mut confirmed = false;
        for strategy in DetectionStrategy::all() {
            if strategy.attempt(driver) {
                tracing::debug!(username, ?strategy, "unfollow confirmation clicked");
                confirmed = true;
                break;
            }
        }
        if !confirmed {
            return Ok(Outcome::DialogFailed);
        }
        pause(self.dialog_wait);

        // The confirmation click is destructive and cannot be retried safely,
        // so an ambiguous post-click state still counts as success.
        let verified = match button_labels(driver) {
            Ok(buttons) => buttons.iter().any(|(_, text)| text == FOLLOW_LABEL),
            Err(_) => false,
        };
        if !verified {
            tracing::warn!(username, "unfollow dispatched but not visually confirmed");
        }
        Ok(Outcome::Success)
    }
}

/// All buttons on the page with their trimmed labels. Elements whose text
/// cannot be read (gone stale mid-scan) are dropped.
fn button_labels(driver: &mut dyn UiDriver) -> Result<Vec<(Element, String)>, DriverError> {
    let elements = driver.find_all(BUTTONS)?;
    let mut labeled = Vec::with_capacity(elements.len());
    for element in elements {
        match driver.element_text(&element) {
            Ok(text) => labeled.push((element, text.trim().to_string())),
            Err(_) => continue,
        }
    }
    Ok(labeled)
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
