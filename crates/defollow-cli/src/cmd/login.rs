use anyhow::Context;
use defollow_core::{
    config::Config,
    driver::UiDriver,
    io::ensure_dir,
    paths, session,
    webdriver::WebDriverSession,
};
use std::io::{BufRead, Write};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    ensure_dir(&paths::defollow_dir(root)).context("failed to create the data directory")?;
    let cookies_path = paths::cookies_path(root);

    let mut driver = WebDriverSession::connect(&config.webdriver_url)
        .with_context(|| format!("failed to connect to {} (is chromedriver running?)", config.webdriver_url))?;

    // A saved session may still be live; resume it instead of asking again.
    let resumed = session::load_cookies(&mut driver, &cookies_path, &config.base_url, config.settle())?
        && session::is_logged_in(&mut driver, &config.base_url, config.settle())?;
    if resumed {
        session::save_cookies(&mut driver, &cookies_path)?;
        driver.quit()?;
        println!("Already logged in; session refreshed.");
        return Ok(());
    }

    driver.navigate(&config.login_url())?;
    println!("A browser window is open at the login page.");
    println!("Log in there (complete any verification prompts), then return here.");
    print!("Press Enter once you are logged in... ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    if !session::is_logged_in(&mut driver, &config.base_url, config.settle())? {
        driver.quit()?;
        anyhow::bail!("still on the login page; run 'defollow login' again");
    }

    session::save_cookies(&mut driver, &cookies_path)?;
    driver.quit()?;
    println!("Session saved to {}", cookies_path.display());
    Ok(())
}
