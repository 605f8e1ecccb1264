use crate::output::{print_json, print_pairs};
use anyhow::Context;
use defollow_core::{
    config::Config,
    ledger::Ledger,
    paths,
    runner::{PlanStatus, RunController, RunEvent, RunStatus},
    session,
    types::{FollowsYou, Mode, Outcome},
    webdriver::WebDriverSession,
};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::Ordering;

pub fn run(
    root: &Path,
    dry_run: bool,
    non_followers: bool,
    mutual_not_keep: bool,
    json: bool,
) -> anyhow::Result<()> {
    // Both flags together are the union, which is everything: same as All.
    let mode = match (non_followers, mutual_not_keep) {
        (true, false) => Mode::NonFollowersOnly,
        (false, true) => Mode::MutualsNotKeep,
        _ => Mode::All,
    };

    let config = Config::load(root).context("failed to load config")?;
    let ledger_path = paths::ledger_path(root);
    let mut ledger = Ledger::load(&ledger_path).context("failed to load ledger")?;

    let controller = RunController::new(&config, mode);

    // Budget and selection are decided up front; neither needs a browser.
    let plan = controller.plan(&ledger);
    match plan.status {
        PlanStatus::LimitReached => {
            if json {
                return print_json(&plan);
            }
            println!(
                "Daily limit reached ({}). Already unfollowed {} today. Try again tomorrow.",
                config.daily_limit, plan.processed_today
            );
            return Ok(());
        }
        PlanStatus::NothingToDo => {
            if json {
                return print_json(&plan);
            }
            println!("No accounts to unfollow for mode: {}.", mode.label());
            return Ok(());
        }
        PlanStatus::Ready => {}
    }

    if dry_run {
        if json {
            return print_json(&plan);
        }
        println!("Mode: {}", mode.label());
        println!(
            "Eligible: {}  Budget today: {}  Will process: {}",
            plan.eligible,
            plan.budget,
            plan.targets.len()
        );
        println!();
        let rows: Vec<(String, String)> = plan
            .targets
            .iter()
            .map(|t| {
                let tag = match t.follows_you {
                    FollowsYou::No => "non-follower",
                    FollowsYou::Yes => "follows you",
                    FollowsYou::Unknown => "",
                };
                (format!("@{}", t.username), tag.to_string())
            })
            .collect();
        print_pairs(&rows);
        println!();
        println!("Dry run: nothing was changed.");
        return Ok(());
    }

    let mut driver = WebDriverSession::connect(&config.webdriver_url).with_context(|| {
        format!(
            "failed to connect to {} (is chromedriver running?)",
            config.webdriver_url
        )
    })?;

    let cookies_path = paths::cookies_path(root);
    let live = session::load_cookies(&mut driver, &cookies_path, &config.base_url, config.settle())?
        && session::is_logged_in(&mut driver, &config.base_url, config.settle())?;
    if !live {
        driver.quit()?;
        anyhow::bail!("no valid session: run 'defollow login' first");
    }

    let flag = controller.interrupt_flag();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install the Ctrl-C handler")?;

    if !json {
        println!(
            "Mode: {}  Processing {} of {} eligible (budget {})",
            mode.label(),
            plan.targets.len(),
            plan.eligible,
            plan.budget
        );
    }

    let report = controller.execute(&mut ledger, &ledger_path, &mut driver, &mut |event| {
        if json {
            return;
        }
        match event {
            RunEvent::TargetStarted {
                index,
                total,
                username,
            } => {
                print!("[{index}/{total}] Unfollowing @{username}... ");
                let _ = std::io::stdout().flush();
            }
            RunEvent::TargetFinished { result, .. } => match result {
                Ok(Outcome::Success) => println!("OK"),
                Ok(Outcome::AlreadyUnfollowed) => println!("ALREADY UNFOLLOWED (marked done)"),
                Ok(Outcome::NotFound) => println!("SKIPPED (account no longer exists)"),
                Ok(Outcome::DialogFailed) => println!("SKIPPED (unfollow dialog issue)"),
                Err(err) => println!("ERROR: {err} (marked skipped)"),
            },
            RunEvent::Waiting { seconds } => println!("  waiting {seconds:.0}s..."),
        }
    })?;

    // Refresh the saved session so the next run can resume it.
    if let Err(err) = session::save_cookies(&mut driver, &cookies_path) {
        tracing::warn!(%err, "failed to refresh saved cookies");
    }
    driver.quit()?;

    if json {
        return print_json(&report);
    }

    println!();
    match report.status {
        RunStatus::Completed => println!("Done."),
        RunStatus::Interrupted => println!("Interrupted; progress was saved."),
        RunStatus::SessionExpired => {
            println!("Session expired mid-run; progress was saved. Run 'defollow login' again.")
        }
        RunStatus::LimitReached | RunStatus::NothingToDo => {}
    }
    println!(
        "Unfollowed: {}  Already gone: {}  Skipped: {}",
        report.unfollowed, report.already_unfollowed, report.skipped
    );
    println!(
        "Processed today: {} / {}  Still pending: {}",
        report.processed_today, config.daily_limit, report.pending
    );
    Ok(())
}
