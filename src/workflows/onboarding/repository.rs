use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use super::domain::{Application, ApplicationId, Contact, Party, Reviewer, UserId};

/// Persistence port for application rows.
///
/// `update` is a version-checked write-back: the caller reads a row, mutates
/// its copy, and writes it back; the store rejects the write with
/// [`StoreError::Conflict`] when the stored version has moved in between.
/// That single primitive gives every lifecycle transition its atomic
/// read-modify-write semantics without a global lock.
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, app: Application) -> Result<Application, StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn update(&self, app: Application) -> Result<Application, StoreError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), StoreError>;

    /// Count of assigned, non-terminal applications per reviewer.
    ///
    /// Deliberately unlocked; the balancer tolerates approximate counts.
    fn active_caseloads(&self) -> Result<BTreeMap<UserId, usize>, StoreError>;

    /// Draft / Requires Action rows untouched since `cutoff` and not yet
    /// reminded.
    fn stale_unreminded(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<Application>, StoreError>;

    /// Set-based batch flip of `reminder_sent`; returns affected row count.
    fn mark_reminded(&self, ids: &[ApplicationId]) -> Result<usize, StoreError>;

    /// Idempotent acknowledgement of the latest state change by one party.
    fn mark_open(&self, party: Party, id: &ApplicationId) -> Result<(), StoreError>;

    /// Acknowledge every unread application held by `holder` for `party`;
    /// returns how many rows flipped.
    fn mark_all_open(&self, party: Party, holder: &UserId) -> Result<usize, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to reviewer identities plus the exclusive-lease primitive the
/// balancer uses to serialize concurrent assignments.
pub trait ReviewerDirectory: Send + Sync {
    /// Every reviewer carrying the STAFF role.
    fn staff(&self) -> Result<Vec<Reviewer>, DirectoryError>;

    /// Non-blocking exclusive lease on a reviewer identity. `None` means the
    /// lease is currently held by a concurrent assignment; callers skip to
    /// their next candidate rather than queue.
    fn try_lock(&self, id: &UserId) -> Result<Option<ReviewerLease>, DirectoryError>;
}

/// RAII lease over a reviewer identity; released on drop.
pub struct ReviewerLease {
    reviewer: UserId,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ReviewerLease {
    pub fn new(reviewer: UserId, release: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            reviewer,
            release: Some(release),
        }
    }

    pub fn reviewer(&self) -> &UserId {
        &self.reviewer
    }
}

impl Drop for ReviewerLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ReviewerLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewerLease")
            .field("reviewer", &self.reviewer)
            .finish()
    }
}

/// Identity-resolution port: user id to contact email and display name.
pub trait ContactDirectory: Send + Sync {
    fn contact(&self, id: &UserId) -> Result<Option<Contact>, DirectoryError>;
}

/// Error enumeration for directory lookups.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound email hand-off. The core only ever calls this after a state
/// mutation has committed; a failure is reported, never rolled back into the
/// transition.
pub trait Mailer: Send + Sync {
    fn send(&self, message: OutboundEmail) -> Result<(), DeliveryError>;
}

/// Payload accepted by the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery hand-off error.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery transport unavailable: {0}")]
    Transport(String),
}
