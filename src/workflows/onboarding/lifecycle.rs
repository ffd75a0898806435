use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::assignment::{AssignmentError, CaseloadBalancer};
use super::domain::{Application, ApplicationId, ApplicationStatus, Clock, UserId};
use super::mail;
use super::repository::{
    ApplicationStore, ContactDirectory, Mailer, OutboundEmail, ReviewerDirectory, StoreError,
};

/// Typed input for every lifecycle action. Free-form field patches from the
/// old route layer are gone; an action carries exactly the data its
/// transition consumes, validated before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionAction {
    Save,
    Submit,
    FlagForManualReview,
    Approve { reason: Option<String> },
    Reject { reason: String },
    RequestAction { reason: String },
    Withdraw,
}

impl TransitionAction {
    pub const fn verb(&self) -> &'static str {
        match self {
            TransitionAction::Save => "save",
            TransitionAction::Submit => "submit",
            TransitionAction::FlagForManualReview => "flag_for_manual_review",
            TransitionAction::Approve { .. } => "approve",
            TransitionAction::Reject { .. } => "reject",
            TransitionAction::RequestAction { .. } => "request_action",
            TransitionAction::Withdraw => "withdraw",
        }
    }
}

/// Result of a transition attempt. Off-table (action, state) pairs come back
/// with `applied = false` and a note instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub previous_status: Option<ApplicationStatus>,
    pub current_status: ApplicationStatus,
    pub applied: bool,
    pub note: Option<String>,
}

/// Error raised by the lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("a reason is required to {action} this application")]
    ReasonRequired { action: &'static str },
    #[error("application {0} was modified concurrently")]
    Conflict(ApplicationId),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Store(StoreError),
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("{id:08}"))
}

/// The application lifecycle state machine.
///
/// Every transition is one version-checked read-modify-write against a
/// single application row; the loser of a concurrent race on the same row
/// observes [`TransitionError::Conflict`]. Only `flag_for_manual_review`
/// looks beyond the row, consulting the [`CaseloadBalancer`] when no
/// reviewer is assigned yet.
pub struct LifecycleEngine<S, D, C> {
    store: Arc<S>,
    balancer: CaseloadBalancer<S, D>,
    clock: Arc<C>,
    contacts: Option<Arc<dyn ContactDirectory>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl<S, D, C> LifecycleEngine<S, D, C>
where
    S: ApplicationStore,
    D: ReviewerDirectory,
    C: Clock,
{
    pub fn new(store: Arc<S>, reviewers: Arc<D>, clock: Arc<C>) -> Self {
        let balancer = CaseloadBalancer::new(store.clone(), reviewers);
        Self {
            store,
            balancer,
            clock,
            contacts: None,
            mailer: None,
        }
    }

    /// Attach the identity-resolution and delivery collaborators. Emails are
    /// attempted only after a transition commits; a failed hand-off is
    /// reported in the outcome note, never rolled back.
    pub fn with_mailer(
        mut self,
        contacts: Arc<dyn ContactDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        self.contacts = Some(contacts);
        self.mailer = Some(mailer);
        self
    }

    /// Create a new application in `Draft`.
    pub fn create_draft(
        &self,
        applicant_id: UserId,
        business_name: impl Into<String>,
    ) -> Result<Application, TransitionError> {
        let app = Application::draft(
            next_application_id(),
            applicant_id,
            business_name,
            self.clock.now(),
        );
        self.store.insert(app).map_err(Self::map_store)
    }

    /// Express path: create an application directly under automated review.
    pub fn create_submitted(
        &self,
        applicant_id: UserId,
        business_name: impl Into<String>,
    ) -> Result<Application, TransitionError> {
        let app = Application::submitted(
            next_application_id(),
            applicant_id,
            business_name,
            self.clock.now(),
        );
        self.store.insert(app).map_err(Self::map_store)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, TransitionError> {
        self.store
            .fetch(id)
            .map_err(Self::map_store)?
            .ok_or_else(|| TransitionError::NotFound(id.clone()))
    }

    /// Remove an application row regardless of status. The upstream system
    /// never restricted deletion to pre-submission states; neither does the
    /// core.
    pub fn delete(&self, id: &ApplicationId) -> Result<(), TransitionError> {
        self.store.delete(id).map_err(|err| match err {
            StoreError::NotFound => TransitionError::NotFound(id.clone()),
            other => Self::map_store(other),
        })
    }

    /// Validate and apply one lifecycle action against one application row.
    pub fn apply_transition(
        &self,
        id: &ApplicationId,
        action: TransitionAction,
    ) -> Result<TransitionOutcome, TransitionError> {
        use ApplicationStatus::*;

        // Mandatory-reason validation happens before any state is read.
        match &action {
            TransitionAction::Reject { reason } if is_blank(reason) => {
                return Err(TransitionError::ReasonRequired { action: "reject" });
            }
            TransitionAction::RequestAction { reason } if is_blank(reason) => {
                return Err(TransitionError::ReasonRequired {
                    action: "request action on",
                });
            }
            _ => {}
        }

        let app = self.get(id)?;
        let mut next = app.clone();
        // Lease outlives the write-back so a concurrent pick cannot land on
        // the same reviewer before this assignment commits.
        let mut lease = None;

        match &action {
            TransitionAction::Save => match (app.current_status, app.previous_status) {
                (Draft, _) => {
                    next.is_open_applicant = false;
                    next.is_open_reviewer = true;
                    next.reminder_sent = false;
                }
                (RequiresAction, Some(UnderManualReview)) => {
                    next.previous_status = Some(RequiresAction);
                    next.current_status = Draft;
                    next.is_open_applicant = false;
                    next.is_open_reviewer = true;
                    next.reminder_sent = false;
                }
                _ => {
                    return Ok(noop(
                        &app,
                        "save is only valid for drafts or applications returned for action",
                    ));
                }
            },
            TransitionAction::Submit => match (app.current_status, app.previous_status) {
                (Draft, None) => {
                    next.previous_status = Some(Draft);
                    next.current_status = UnderReview;
                }
                (RequiresAction, Some(UnderManualReview)) => {
                    next.previous_status = Some(RequiresAction);
                    next.current_status = UnderManualReview;
                    next.is_open_reviewer = false;
                }
                (Draft, Some(RequiresAction)) => {
                    next.previous_status = Some(Draft);
                    next.current_status = UnderManualReview;
                    next.is_open_reviewer = false;
                }
                _ => return Ok(noop(&app, "submit is not valid from the current state")),
            },
            TransitionAction::FlagForManualReview => {
                if app.current_status != UnderReview {
                    return Ok(noop(
                        &app,
                        "flag_for_manual_review is only valid while the application is under automated review",
                    ));
                }
                next.previous_status = Some(UnderReview);
                next.current_status = UnderManualReview;
                next.is_open_applicant = false;
                next.is_open_reviewer = false;
                if next.reviewer_id.is_none() {
                    let assignment = self.balancer.pick_assignee()?;
                    next.reviewer_id = Some(assignment.reviewer.clone());
                    lease = Some(assignment.lease);
                }
            }
            TransitionAction::Approve { reason } => {
                if app.current_status.is_terminal() {
                    return Ok(noop_terminal(&app));
                }
                if app.current_status == UnderManualReview
                    && reason.as_deref().map_or(true, |r| r.trim().is_empty())
                {
                    return Err(TransitionError::ReasonRequired { action: "approve" });
                }
                next.previous_status = Some(app.current_status);
                next.current_status = Approved;
                if let Some(reason) = reason.as_deref().filter(|r| !r.trim().is_empty()) {
                    next.reason = Some(reason.to_string());
                }
                next.is_open_applicant = false;
            }
            TransitionAction::Reject { reason } => {
                if app.current_status.is_terminal() {
                    return Ok(noop_terminal(&app));
                }
                next.previous_status = Some(app.current_status);
                next.current_status = Rejected;
                next.reason = Some(reason.trim().to_string());
                next.is_open_applicant = false;
            }
            TransitionAction::RequestAction { reason } => {
                if app.current_status.is_terminal() {
                    return Ok(noop_terminal(&app));
                }
                next.previous_status = Some(app.current_status);
                next.current_status = RequiresAction;
                next.reason = Some(reason.trim().to_string());
                next.reminder_sent = false;
                next.is_open_applicant = false;
            }
            TransitionAction::Withdraw => {
                if app.current_status.is_terminal() {
                    return Ok(noop_terminal(&app));
                }
                next.previous_status = Some(app.current_status);
                next.current_status = Withdrawn;
                next.is_open_applicant = false;
                next.is_open_reviewer = false;
            }
        }

        next.last_modified = self.clock.now();
        let committed = self.store.update(next).map_err(|err| match err {
            StoreError::NotFound => TransitionError::NotFound(id.clone()),
            StoreError::Conflict => TransitionError::Conflict(id.clone()),
            other => Self::map_store(other),
        })?;
        drop(lease);

        info!(
            application = %committed.id,
            action = action.verb(),
            from = app.current_status.label(),
            to = committed.current_status.label(),
            "applied transition"
        );

        let note = self.notify(&committed, &action);

        Ok(TransitionOutcome {
            previous_status: committed.previous_status,
            current_status: committed.current_status,
            applied: true,
            note,
        })
    }

    /// Post-commit email hand-off. Returns a note describing any failed
    /// delivery; a committed transition is never unwound here.
    fn notify(&self, app: &Application, action: &TransitionAction) -> Option<String> {
        let (contacts, mailer) = match (&self.contacts, &self.mailer) {
            (Some(contacts), Some(mailer)) => (contacts, mailer),
            _ => return None,
        };

        let mut notes = Vec::new();

        let applicant_email = match contacts.contact(&app.applicant_id) {
            Ok(contact) => contact,
            Err(err) => {
                warn!(application = %app.id, error = %err, "applicant contact lookup failed");
                notes.push(format!("applicant contact lookup failed: {err}"));
                None
            }
        };

        if let Some(contact) = applicant_email {
            let message = match action {
                TransitionAction::Save => Some(mail::draft_saved(app)),
                TransitionAction::Submit
                    if app.current_status == ApplicationStatus::UnderReview =>
                {
                    Some(mail::application_submitted(app, &contact.first_name))
                }
                TransitionAction::FlagForManualReview => {
                    Some(mail::applicant_manual_review(app, &contact.first_name))
                }
                TransitionAction::Approve { .. } => Some(mail::approved(app, &contact.first_name)),
                TransitionAction::Reject { .. } => Some(mail::rejected(app, &contact.first_name)),
                TransitionAction::RequestAction { .. } => {
                    Some(mail::action_required(app, &contact.first_name))
                }
                _ => None,
            };
            if let Some((subject, body)) = message {
                if let Err(err) = mailer.send(OutboundEmail {
                    to: contact.email,
                    subject,
                    body,
                }) {
                    warn!(application = %app.id, error = %err, "applicant notification failed");
                    notes.push(format!("applicant notification failed: {err}"));
                }
            }
        }

        // Staff hand-off whenever the row lands on a reviewer's desk.
        let reviewer_notice = matches!(
            action,
            TransitionAction::FlagForManualReview | TransitionAction::Submit
        ) && app.current_status == ApplicationStatus::UnderManualReview;
        if reviewer_notice {
            if let Some(reviewer_id) = &app.reviewer_id {
                match contacts.contact(reviewer_id) {
                    Ok(Some(contact)) => {
                        let (subject, body) = mail::staff_manual_review(app, &contact.first_name);
                        if let Err(err) = mailer.send(OutboundEmail {
                            to: contact.email,
                            subject,
                            body,
                        }) {
                            warn!(application = %app.id, error = %err, "reviewer notification failed");
                            notes.push(format!("reviewer notification failed: {err}"));
                        }
                    }
                    Ok(None) => {
                        notes.push(format!("no contact on file for reviewer {reviewer_id}"));
                    }
                    Err(err) => {
                        warn!(application = %app.id, error = %err, "reviewer contact lookup failed");
                        notes.push(format!("reviewer contact lookup failed: {err}"));
                    }
                }
            }
        }

        if notes.is_empty() {
            None
        } else {
            Some(notes.join("; "))
        }
    }

    fn map_store(err: StoreError) -> TransitionError {
        TransitionError::Store(err)
    }
}

fn is_blank(reason: &str) -> bool {
    reason.trim().is_empty()
}

fn noop(app: &Application, note: &str) -> TransitionOutcome {
    TransitionOutcome {
        previous_status: app.previous_status,
        current_status: app.current_status,
        applied: false,
        note: Some(note.to_string()),
    }
}

fn noop_terminal(app: &Application) -> TransitionOutcome {
    noop(
        app,
        &format!(
            "no transitions are defined from the terminal status {}",
            app.current_status
        ),
    )
}
