use crate::error::{DefollowError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Run configuration, loaded from `.defollow/config.yaml`.
///
/// Passed explicitly into the run controller and target selection; nothing
/// reads these values ambiently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum unfollow actions per calendar day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Lower bound of the random pause between two targets, in seconds.
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,

    /// Upper bound of the random pause between two targets, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Seconds to let a freshly navigated profile settle before scanning it.
    #[serde(default = "default_settle")]
    pub settle_secs: u64,

    /// Seconds to wait for the confirmation dialog to appear after a click.
    #[serde(default = "default_dialog_wait")]
    pub dialog_wait_secs: u64,

    /// WebDriver endpoint (chromedriver or compatible).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Platform base URL; profile pages live at `{base_url}/{username}/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_daily_limit() -> u32 {
    500
}

fn default_min_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    15
}

fn default_settle() -> u64 {
    3
}

fn default_dialog_wait() -> u64 {
    2
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_base_url() -> String {
    "https://www.instagram.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
            settle_secs: default_settle(),
            dialog_wait_secs: default_dialog_wait(),
            webdriver_url: default_webdriver_url(),
            base_url: default_base_url(),
        }
    }
}

impl Config {
    /// Load the config file under `root`, falling back to defaults when it
    /// does not exist yet.
    pub fn load(root: &Path) -> Result<Config> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default config file if none exists. Returns true if written.
    pub fn write_default(root: &Path) -> Result<bool> {
        let path = paths::config_path(root);
        if path.exists() {
            return Ok(false);
        }
        let data = serde_yaml::to_string(&Config::default())?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            return Err(DefollowError::InvalidConfig(
                "daily_limit must be at least 1".to_string(),
            ));
        }
        if self.min_delay_secs > self.max_delay_secs {
            return Err(DefollowError::InvalidConfig(format!(
                "min_delay_secs ({}) exceeds max_delay_secs ({})",
                self.min_delay_secs, self.max_delay_secs
            )));
        }
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn dialog_wait(&self) -> Duration {
        Duration::from_secs(self.dialog_wait_secs)
    }

    /// URL of a user's profile page.
    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/{}/", self.base_url.trim_end_matches('/'), username)
    }

    /// URL of the login page, also used to detect forced session loss.
    pub fn login_url(&self) -> String {
        format!("{}/accounts/login/", self.base_url.trim_end_matches('/'))
    }
}
