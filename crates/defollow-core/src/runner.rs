use crate::actuator::Actuator;
use crate::config::Config;
use crate::driver::UiDriver;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::select::{self, Selection};
use crate::types::{FollowsYou, Mode, Outcome};
use chrono::Local;
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// URL fragment the platform redirects to once a session dies.
const LOGIN_URL_FRAGMENT: &str = "/accounts/login";

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Ready,
    LimitReached,
    NothingToDo,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedTarget {
    pub username: String,
    pub follows_you: FollowsYou,
}

/// The Selecting stage's output: what a run would do right now. Computing a
/// plan never touches the ledger file or the browser, which is exactly what
/// `--dry-run` prints.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub status: PlanStatus,
    pub processed_today: usize,
    pub budget: usize,
    pub eligible: usize,
    pub targets: Vec<PlannedTarget>,
}

// ---------------------------------------------------------------------------
// RunReport / RunEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Interrupted,
    SessionExpired,
    LimitReached,
    NothingToDo,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub unfollowed: usize,
    pub already_unfollowed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub processed_today: usize,
}

/// Progress notifications emitted while processing, one target at a time.
/// The CLI turns these into per-target status lines.
#[derive(Debug)]
pub enum RunEvent<'a> {
    TargetStarted {
        index: usize,
        total: usize,
        username: &'a str,
    },
    TargetFinished {
        username: &'a str,
        result: std::result::Result<Outcome, String>,
    },
    Waiting {
        seconds: f64,
    },
}

// ---------------------------------------------------------------------------
// RunController
// ---------------------------------------------------------------------------

/// Orchestrates one run: budget check, target selection, and the serialized
/// per-target loop with persist-after-every-mutation crash safety.
///
/// Cancellation is cooperative: the interrupt flag and the session-loss probe
/// are checked between targets, never mid-actuation.
pub struct RunController<'a> {
    config: &'a Config,
    mode: Mode,
    interrupted: Arc<AtomicBool>,
}

impl<'a> RunController<'a> {
    pub fn new(config: &'a Config, mode: Mode) -> Self {
        Self {
            config,
            mode,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag to hook up to a SIGINT handler. Setting it stops the run after
    /// the in-flight target finishes and persists.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    fn remaining_budget(&self, ledger: &Ledger) -> (usize, i64) {
        let today = Local::now().date_naive();
        let processed = ledger.count_unfollowed_today(today);
        (processed, self.config.daily_limit as i64 - processed as i64)
    }

    /// Compute the work queue without mutating anything.
    pub fn plan(&self, ledger: &Ledger) -> Plan {
        let (processed, budget) = self.remaining_budget(ledger);
        let eligible = select::ordered_eligible(&ledger.rows, self.mode).len();
        match select::select_targets(&ledger.rows, self.mode, budget) {
            Selection::LimitReached => Plan {
                status: PlanStatus::LimitReached,
                processed_today: processed,
                budget: 0,
                eligible,
                targets: Vec::new(),
            },
            Selection::NothingToDo => Plan {
                status: PlanStatus::NothingToDo,
                processed_today: processed,
                budget: budget as usize,
                eligible,
                targets: Vec::new(),
            },
            Selection::Queue(queue) => Plan {
                status: PlanStatus::Ready,
                processed_today: processed,
                budget: budget as usize,
                eligible,
                targets: queue
                    .into_iter()
                    .map(|i| PlannedTarget {
                        username: ledger.rows[i].username.clone(),
                        follows_you: ledger.rows[i].follows_you,
                    })
                    .collect(),
            },
        }
    }

    /// Process the work queue against a live driver, persisting the full
    /// ledger after every row mutation.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        ledger_path: &Path,
        driver: &mut dyn UiDriver,
        on_event: &mut dyn FnMut(RunEvent),
    ) -> Result<RunReport> {
        let (processed, budget) = self.remaining_budget(ledger);
        let queue = match select::select_targets(&ledger.rows, self.mode, budget) {
            Selection::LimitReached => {
                return Ok(self.report(ledger, RunStatus::LimitReached, 0, 0, 0, processed))
            }
            Selection::NothingToDo => {
                return Ok(self.report(ledger, RunStatus::NothingToDo, 0, 0, 0, processed))
            }
            Selection::Queue(queue) => queue,
        };

        let actuator = Actuator::new(self.config);
        let total = queue.len();
        let mut status = RunStatus::Completed;
        let mut unfollowed = 0;
        let mut already = 0;
        let mut skipped = 0;
        let mut rng = rand::thread_rng();

        for (pos, &idx) in queue.iter().enumerate() {
            let username = ledger.rows[idx].username.clone();
            on_event(RunEvent::TargetStarted {
                index: pos + 1,
                total,
                username: &username,
            });

            let now = Local::now().naive_local();
            let result = match actuator.process(driver, &username) {
                Ok(outcome) => {
                    ledger.apply_outcome(idx, outcome, now);
                    match outcome {
                        Outcome::Success => unfollowed += 1,
                        Outcome::AlreadyUnfollowed => already += 1,
                        Outcome::NotFound | Outcome::DialogFailed => skipped += 1,
                    }
                    Ok(outcome)
                }
                Err(err) => {
                    tracing::warn!(username = %username, %err, "actuation failed, marking skipped");
                    ledger.mark_skipped(idx, now);
                    skipped += 1;
                    Err(err.to_string())
                }
            };

            // Crash safety: every mutation hits disk before anything else.
            ledger.save(ledger_path)?;
            on_event(RunEvent::TargetFinished {
                username: &username,
                result,
            });

            if self.interrupted.load(Ordering::SeqCst) {
                status = RunStatus::Interrupted;
                break;
            }
            if session_lost(driver) {
                status = RunStatus::SessionExpired;
                break;
            }
            if pos + 1 < total {
                let seconds = rng
                    .gen_range(self.config.min_delay_secs as f64..=self.config.max_delay_secs as f64);
                if seconds > 0.0 {
                    on_event(RunEvent::Waiting { seconds });
                    thread::sleep(Duration::from_secs_f64(seconds));
                }
            }
        }

        let processed_today = ledger.count_unfollowed_today(Local::now().date_naive());
        Ok(self.report(ledger, status, unfollowed, already, skipped, processed_today))
    }

    fn report(
        &self,
        ledger: &Ledger,
        status: RunStatus,
        unfollowed: usize,
        already_unfollowed: usize,
        skipped: usize,
        processed_today: usize,
    ) -> RunReport {
        RunReport {
            status,
            unfollowed,
            already_unfollowed,
            skipped,
            pending: ledger.pending_count(),
            processed_today,
        }
    }
}

/// A forced redirect to the login surface means the session died; the run
/// stops rather than burning the queue on profiles it can no longer see.
fn session_lost(driver: &mut dyn UiDriver) -> bool {
    driver
        .current_url()
        .map(|url| url.contains(LOGIN_URL_FRAGMENT))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};
    use crate::ledger::LedgerRow;
    use crate::types::Status;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            base_url: "https://x.test".to_string(),
            daily_limit: 10,
            min_delay_secs: 0,
            max_delay_secs: 0,
            settle_secs: 0,
            dialog_wait_secs: 0,
            ..Config::default()
        }
    }

    fn row(username: &str, follows_you: FollowsYou, status: Status) -> LedgerRow {
        LedgerRow {
            follows_you,
            status,
            ..LedgerRow::new(username)
        }
    }

    fn unfollowed_today(username: &str) -> LedgerRow {
        let mut row = LedgerRow::new(username);
        row.status = Status::Unfollowed;
        row.date_unfollowed = Some(Local::now().naive_local());
        row
    }

    /// Profile page whose "Following" button opens a dialog that confirms
    /// and flips to "Follow".
    fn unfollowable_profile(driver: FakeDriver, username: &str) -> FakeDriver {
        let fol = format!("{username}-following");
        let unf = format!("{username}-unfollow");
        driver
            .with_page(
                &format!("https://x.test/{username}/"),
                vec![FakeElement::button(&fol, "Following")],
            )
            .with_transition(
                &fol,
                vec![FakeElement::new(&unf, "Unfollow", &["[role='dialog'] button"])],
            )
            .with_transition(
                &unf,
                vec![FakeElement::button(&format!("{username}-follow"), "Follow")],
            )
    }

    fn no_events() -> impl FnMut(RunEvent) {
        |_| {}
    }

    #[test]
    fn consumed_budget_reports_limit_reached_with_zero_actuations() {
        let config = Config {
            daily_limit: 2,
            ..config()
        };
        let ledger = Ledger::new(vec![
            unfollowed_today("done1"),
            unfollowed_today("done2"),
            row("pending", FollowsYou::No, Status::Unmarked),
        ]);
        let controller = RunController::new(&config, Mode::All);

        let plan = controller.plan(&ledger);
        assert_eq!(plan.status, PlanStatus::LimitReached);
        assert_eq!(plan.processed_today, 2);
        assert!(plan.targets.is_empty());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = ledger;
        let mut driver = FakeDriver::new();
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut no_events())
            .unwrap();
        assert_eq!(report.status, RunStatus::LimitReached);
        assert!(driver.navigations.is_empty());
        assert!(!path.exists(), "limit-reached run must not write the ledger");
    }

    #[test]
    fn nothing_to_do_is_distinct_from_limit_reached() {
        let ledger = Ledger::new(vec![row("kept", FollowsYou::Yes, Status::Keep)]);
        let config = config();
        let controller = RunController::new(&config, Mode::All);
        let plan = controller.plan(&ledger);
        assert_eq!(plan.status, PlanStatus::NothingToDo);
        assert_eq!(plan.budget, 10);
    }

    #[test]
    fn plan_lists_targets_with_follow_back_tags_without_mutating() {
        let rows = vec![
            row("alice", FollowsYou::No, Status::Unmarked),
            row("bob", FollowsYou::Yes, Status::Keep),
            row("carol", FollowsYou::Yes, Status::Unfollow),
        ];
        let ledger = Ledger::new(rows.clone());
        let config = config();
        let controller = RunController::new(&config, Mode::All);

        let plan = controller.plan(&ledger);
        assert_eq!(plan.status, PlanStatus::Ready);
        assert_eq!(plan.eligible, 2);
        let names: Vec<&str> = plan.targets.iter().map(|t| t.username.as_str()).collect();
        assert_eq!(names, ["alice", "carol"]);
        assert_eq!(plan.targets[0].follows_you, FollowsYou::No);
        assert_eq!(plan.targets[1].follows_you, FollowsYou::Yes);

        for (before, after) in rows.iter().zip(&ledger.rows) {
            assert_eq!(before.status, after.status);
            assert_eq!(before.date_unfollowed, after.date_unfollowed);
        }
    }

    #[test]
    fn full_run_processes_queue_and_persists_each_target() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new(vec![
            row("alice", FollowsYou::No, Status::Unmarked),
            row("bob", FollowsYou::Yes, Status::Keep),
            row("carol", FollowsYou::Yes, Status::Unfollow),
        ]);
        let mut driver = unfollowable_profile(FakeDriver::new(), "alice");
        driver = unfollowable_profile(driver, "carol");

        let controller = RunController::new(&config, Mode::All);
        let mut lines = Vec::new();
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut |event| {
                if let RunEvent::TargetStarted { index, total, username } = event {
                    lines.push(format!("{index}/{total} {username}"));
                }
            })
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.unfollowed, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.pending, 0);
        assert_eq!(lines, ["1/2 alice", "2/2 carol"]);

        let saved = Ledger::load(&path).unwrap();
        assert_eq!(saved.rows[0].status, Status::Unfollowed);
        assert_eq!(saved.rows[1].status, Status::Keep);
        assert_eq!(saved.rows[2].status, Status::Unfollowed);
        assert!(saved.rows[0].date_unfollowed.is_some());
    }

    #[test]
    fn missing_profile_is_skipped_and_run_continues() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new(vec![
            row("ghost", FollowsYou::No, Status::Unmarked),
            row("carol", FollowsYou::Yes, Status::Unfollow),
        ]);
        // No page registered for ghost: the profile scan finds nothing.
        let mut driver = unfollowable_profile(FakeDriver::new(), "carol");

        let controller = RunController::new(&config, Mode::All);
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut no_events())
            .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.unfollowed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(ledger.rows[0].status, Status::Skipped);
        assert!(ledger.rows[0].date_unfollowed.is_some());
        assert_eq!(ledger.rows[1].status, Status::Unfollowed);
    }

    #[test]
    fn already_unfollowed_counts_separately() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new(vec![row("alice", FollowsYou::No, Status::Unmarked)]);
        let mut driver = FakeDriver::new().with_page(
            "https://x.test/alice/",
            vec![FakeElement::button("f", "Follow")],
        );

        let controller = RunController::new(&config, Mode::All);
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut no_events())
            .unwrap();
        assert_eq!(report.unfollowed, 0);
        assert_eq!(report.already_unfollowed, 1);
        assert_eq!(ledger.rows[0].status, Status::Unfollowed);
    }

    #[test]
    fn interrupt_flag_stops_after_current_target_and_persists() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new(vec![
            row("alice", FollowsYou::No, Status::Unmarked),
            row("carol", FollowsYou::Yes, Status::Unfollow),
        ]);
        let mut driver = unfollowable_profile(FakeDriver::new(), "alice");
        driver = unfollowable_profile(driver, "carol");

        let controller = RunController::new(&config, Mode::All);
        controller.interrupt_flag().store(true, Ordering::SeqCst);
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut no_events())
            .unwrap();

        assert_eq!(report.status, RunStatus::Interrupted);
        assert_eq!(report.unfollowed, 1);
        assert_eq!(ledger.rows[0].status, Status::Unfollowed);
        assert_eq!(ledger.rows[1].status, Status::Unfollow, "second target untouched");
        let saved = Ledger::load(&path).unwrap();
        assert_eq!(saved.rows[0].status, Status::Unfollowed);
    }

    #[test]
    fn login_redirect_ends_run_as_session_expired() {
        let config = config();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut ledger = Ledger::new(vec![
            row("alice", FollowsYou::No, Status::Unmarked),
            row("bob", FollowsYou::No, Status::Unmarked),
            row("carol", FollowsYou::Yes, Status::Unfollow),
        ]);
        let mut driver = unfollowable_profile(FakeDriver::new(), "alice").with_redirect(
            "https://x.test/bob/",
            "https://x.test/accounts/login/",
        );

        let controller = RunController::new(&config, Mode::All);
        let report = controller
            .execute(&mut ledger, &path, &mut driver, &mut no_events())
            .unwrap();

        assert_eq!(report.status, RunStatus::SessionExpired);
        assert_eq!(ledger.rows[0].status, Status::Unfollowed);
        // The redirected target was marked before the expiry was noticed.
        assert_eq!(ledger.rows[1].status, Status::Skipped);
        assert_eq!(ledger.rows[2].status, Status::Unfollow, "remaining target untouched");
        assert_eq!(driver.navigations.len(), 2);
    }
}
