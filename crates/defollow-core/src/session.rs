use crate::driver::UiDriver;
use crate::error::Result;
use crate::io::atomic_write;
use serde_json::Value;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// The login form's username field; present only when logged out.
const LOGIN_FORM_SELECTOR: &str = "input[name='username']";

/// Persist the browser's cookies so the next run can resume the session.
pub fn save_cookies(driver: &mut dyn UiDriver, path: &Path) -> Result<()> {
    let cookies = driver.cookies()?;
    atomic_write(path, serde_json::to_string_pretty(&cookies)?.as_bytes())
}

/// Load saved cookies into the browser. Returns false when no cookie file
/// exists. Cookies can only be attached to the active origin, so this
/// navigates to `base_url` first; individual rejected cookies are skipped.
pub fn load_cookies(
    driver: &mut dyn UiDriver,
    path: &Path,
    base_url: &str,
    settle: Duration,
) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let data = std::fs::read_to_string(path)?;
    let cookies: Vec<Value> = serde_json::from_str(&data)?;

    driver.navigate(base_url)?;
    pause(settle);

    for mut cookie in cookies {
        if let Some(obj) = cookie.as_object_mut() {
            // Browser-export fields the WebDriver cookie endpoint rejects.
            obj.remove("sameSite");
            obj.remove("storeId");
        }
        if let Err(err) = driver.add_cookie(&cookie) {
            tracing::debug!(%err, "cookie rejected, skipping");
        }
    }
    Ok(true)
}

/// Probe whether the session is live by loading the home page and checking
/// for the login form.
pub fn is_logged_in(driver: &mut dyn UiDriver, base_url: &str, settle: Duration) -> Result<bool> {
    driver.navigate(base_url)?;
    pause(settle);
    Ok(driver.find_all(LOGIN_FORM_SELECTOR)?.is_empty())
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
