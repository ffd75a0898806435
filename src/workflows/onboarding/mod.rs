//! SME onboarding application lifecycle, reviewer assignment, and derived
//! notifications.
//!
//! The module owns the state machine and its invariants; persistence,
//! identity resolution, and email delivery stay behind the ports declared in
//! [`repository`].

pub mod assignment;
pub mod domain;
pub mod lifecycle;
pub mod mail;
pub mod notifications;
pub mod repository;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use assignment::{Assignment, AssignmentError, CaseloadBalancer};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, BusinessClock, Clock, Contact, Party, Reviewer,
    UserId, UserRole, BUSINESS_UTC_OFFSET_HOURS,
};
pub use lifecycle::{LifecycleEngine, TransitionAction, TransitionError, TransitionOutcome};
pub use notifications::{applicant_message, reviewer_message, NotificationCenter};
pub use repository::{
    ApplicationStore, ContactDirectory, DeliveryError, DirectoryError, Mailer, OutboundEmail,
    ReviewerDirectory, ReviewerLease, StoreError,
};
pub use sweeper::{SkipReason, SkippedReminder, StaleDraftSweeper, SweepError, SweepReport};
