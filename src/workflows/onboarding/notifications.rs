//! Derived, role-specific notification text.
//!
//! Nothing here is persisted: messages are read straight off an application
//! snapshot, and the `is_open_*` flags on the row are the only unread state.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use tracing::debug;

use super::domain::{Application, ApplicationId, ApplicationStatus, Party, UserId};
use super::repository::{ApplicationStore, StoreError};

/// A draft untouched for this many days switches to nagging wording.
const DRAFT_NUDGE_DAYS: i64 = 3;

/// Applicant-facing message for an unacknowledged state change, if any.
pub fn applicant_message(app: &Application, now: DateTime<FixedOffset>) -> Option<String> {
    if app.is_open_applicant {
        return None;
    }

    let text = match app.current_status {
        ApplicationStatus::Draft => {
            let idle = now.date_naive() >= app.last_modified.date_naive() + Duration::days(DRAFT_NUDGE_DAYS);
            match (app.previous_status, idle) {
                (Some(ApplicationStatus::RequiresAction), true) => format!(
                    "Your application for \"{}\" has not been edited for more than 48 hours. \
                     Please resubmit it with the requested documents.",
                    app.business_name
                ),
                (Some(ApplicationStatus::RequiresAction), false) => format!(
                    "Your updated application for \"{}\" has been saved. \
                     Submit it once the requested documents are attached.",
                    app.business_name
                ),
                (_, true) => format!(
                    "Your draft application for \"{}\" has not been edited for more than 48 hours. \
                     Complete and submit it to begin processing.",
                    app.business_name
                ),
                (_, false) => format!(
                    "Your draft application for \"{}\" has been saved.",
                    app.business_name
                ),
            }
        }
        ApplicationStatus::UnderReview => format!(
            "Your application for \"{}\" has been submitted and is under review.",
            app.business_name
        ),
        ApplicationStatus::UnderManualReview => format!(
            "Your application for \"{}\" is under manual review by our staff.",
            app.business_name
        ),
        ApplicationStatus::RequiresAction => format!(
            "Your application for \"{}\" requires additional documents. \
             Please review the staff notes and resubmit.",
            app.business_name
        ),
        ApplicationStatus::Approved => format!(
            "Your application for \"{}\" has been approved.",
            app.business_name
        ),
        ApplicationStatus::Rejected => format!(
            "Your application for \"{}\" was unsuccessful.",
            app.business_name
        ),
        ApplicationStatus::Withdrawn => format!(
            "Your application for \"{}\" has been withdrawn.",
            app.business_name
        ),
    };

    Some(text)
}

/// Reviewer-facing message for an unacknowledged state change, if any.
/// Only manual-review arrivals and withdrawals concern the reviewer.
pub fn reviewer_message(app: &Application) -> Option<String> {
    if app.is_open_reviewer {
        return None;
    }

    match app.current_status {
        ApplicationStatus::UnderManualReview => {
            if app.previous_status == Some(ApplicationStatus::RequiresAction) {
                Some(format!(
                    "The applicant for \"{}\" uploaded additional documents. \
                     Please review the application again.",
                    app.business_name
                ))
            } else {
                Some(format!(
                    "Application {} (\"{}\") is due for manual review.",
                    app.id, app.business_name
                ))
            }
        }
        ApplicationStatus::Withdrawn => Some(format!(
            "Application {} (\"{}\") was withdrawn by the applicant.",
            app.id, app.business_name
        )),
        _ => None,
    }
}

/// Acknowledgement facade over the store. Both operations are idempotent
/// flag sets; neither touches `current_status`.
pub struct NotificationCenter<S> {
    store: Arc<S>,
}

impl<S: ApplicationStore> NotificationCenter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Mark one application's latest change as seen by `party`.
    pub fn mark_open(&self, party: Party, id: &ApplicationId) -> Result<(), StoreError> {
        self.store.mark_open(party, id)
    }

    /// Mark every unread application held by `holder` as seen by `party`.
    pub fn mark_all_open(&self, party: Party, holder: &UserId) -> Result<usize, StoreError> {
        let flipped = self.store.mark_all_open(party, holder)?;
        debug!(holder = %holder, flipped, "acknowledged all notifications");
        Ok(flipped)
    }
}
