use crate::ledger::LedgerRow;
use crate::types::{FollowsYou, Mode};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Result of computing the work queue for a run. The two zero-work cases are
/// distinct: a consumed budget means "come back tomorrow", an empty queue
/// means there is genuinely nothing left for this mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The daily budget is already spent; nothing was even considered.
    LimitReached,
    /// Budget remains but no row is eligible under the requested mode.
    NothingToDo,
    /// Row indices to process, in order, truncated to the remaining budget.
    Queue(Vec<usize>),
}

/// All eligible row indices for `mode`, ordered but not yet truncated.
///
/// Eligible rows are those still pending (blank or `unfollow` status). Under
/// [`Mode::All`] non-followers come first — they provide no reciprocal value,
/// so they are the cheapest budget spend — then mutuals, then rows whose
/// follow-back state is unknown. Relative order within each partition is the
/// ledger order.
pub fn ordered_eligible(rows: &[LedgerRow], mode: Mode) -> Vec<usize> {
    let pending: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status.is_pending())
        .map(|(i, _)| i)
        .collect();

    let of = |fy: FollowsYou| -> Vec<usize> {
        pending
            .iter()
            .copied()
            .filter(|&i| rows[i].follows_you == fy)
            .collect()
    };

    match mode {
        Mode::NonFollowersOnly => of(FollowsYou::No),
        Mode::MutualsNotKeep => of(FollowsYou::Yes),
        Mode::All => {
            let mut queue = of(FollowsYou::No);
            queue.extend(of(FollowsYou::Yes));
            queue.extend(of(FollowsYou::Unknown));
            queue
        }
    }
}

/// Compute the work queue for one run: filter by `mode`, order, and truncate
/// to the remaining daily budget.
pub fn select_targets(rows: &[LedgerRow], mode: Mode, budget: i64) -> Selection {
    if budget <= 0 {
        return Selection::LimitReached;
    }
    let mut queue = ordered_eligible(rows, mode);
    if queue.is_empty() {
        return Selection::NothingToDo;
    }
    queue.truncate(budget as usize);
    Selection::Queue(queue)
}
