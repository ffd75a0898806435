use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::debug;

use super::domain::UserId;
use super::repository::{
    ApplicationStore, DirectoryError, ReviewerDirectory, ReviewerLease, StoreError,
};

/// Least-loaded reviewer selection with non-blocking lease acquisition.
///
/// The caseload scan is deliberately unlocked; only the chosen reviewer's
/// identity is leased, and only for the moment of assignment. Two concurrent
/// picks can therefore observe the same counts, but never walk away holding
/// the same reviewer. Occasionally the winner is not the true minimum; a
/// single extra assignment self-corrects on the next call.
pub struct CaseloadBalancer<S, D> {
    store: Arc<S>,
    reviewers: Arc<D>,
}

/// A selected reviewer together with the live lease serializing the pick.
/// The caller writes the assignment back inside its own transaction and then
/// drops the lease.
#[derive(Debug)]
pub struct Assignment {
    pub reviewer: UserId,
    pub lease: ReviewerLease,
}

impl<S, D> CaseloadBalancer<S, D>
where
    S: ApplicationStore,
    D: ReviewerDirectory,
{
    pub fn new(store: Arc<S>, reviewers: Arc<D>) -> Self {
        Self { store, reviewers }
    }

    /// Pick the reviewer with the smallest active caseload, breaking ties
    /// uniformly at random. Candidates whose lease is already held by a
    /// concurrent pick are skipped in favor of the next-best one.
    pub fn pick_assignee(&self) -> Result<Assignment, AssignmentError> {
        let staff = self.reviewers.staff()?;
        if staff.is_empty() {
            return Err(AssignmentError::NoStaffAvailable);
        }

        let loads = self.store.active_caseloads()?;
        let mut candidates: Vec<(usize, UserId)> = staff
            .into_iter()
            .map(|reviewer| {
                let load = loads.get(&reviewer.id).copied().unwrap_or(0);
                (load, reviewer.id)
            })
            .collect();

        // Random order within each load tier, ascending across tiers.
        candidates.shuffle(&mut rand::rng());
        candidates.sort_by_key(|(load, _)| *load);

        for (load, reviewer) in candidates {
            if let Some(lease) = self.reviewers.try_lock(&reviewer)? {
                debug!(reviewer = %reviewer, caseload = load, "assigned reviewer");
                return Ok(Assignment { reviewer, lease });
            }
            debug!(reviewer = %reviewer, "reviewer lease held, trying next candidate");
        }

        Err(AssignmentError::NoStaffAvailable)
    }
}

/// Error raised by reviewer selection.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("no staff reviewer available for assignment")]
    NoStaffAvailable,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
