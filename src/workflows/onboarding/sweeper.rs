use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use super::domain::{ApplicationId, Clock};
use super::mail;
use super::repository::{
    ApplicationStore, ContactDirectory, DirectoryError, Mailer, OutboundEmail, StoreError,
};
use crate::config::OnboardingConfig;

/// Periodic batch job reminding applicants about stale drafts.
///
/// One run selects every Draft / Requires Action row untouched for longer
/// than the threshold with `reminder_sent == false`, hands a reminder to the
/// delivery collaborator per row, and flips `reminder_sent` in a single
/// batch update covering only the rows whose hand-off succeeded. A crash
/// mid-run leaves unaffected rows unreminded and re-selected next run.
pub struct StaleDraftSweeper<S, C> {
    store: Arc<S>,
    contacts: Arc<dyn ContactDirectory>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<C>,
    reminder_after_days: i64,
}

/// Outcome of one sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub reminded: Vec<ApplicationId>,
    pub skipped: Vec<SkippedReminder>,
}

/// A row left untouched by this run, with the reason it was skipped.
#[derive(Debug, PartialEq, Eq)]
pub struct SkippedReminder {
    pub application: ApplicationId,
    pub reason: SkipReason,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The applicant's contact identity could not be resolved.
    UnknownContact,
    /// The delivery collaborator rejected the hand-off.
    Delivery(String),
}

/// Error aborting a whole sweep; per-row problems end up in the report instead.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl<S, C> StaleDraftSweeper<S, C>
where
    S: ApplicationStore,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        contacts: Arc<dyn ContactDirectory>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<C>,
        reminder_after_days: i64,
    ) -> Self {
        Self {
            store,
            contacts,
            mailer,
            clock,
            reminder_after_days,
        }
    }

    /// Build a sweeper with the threshold taken from configuration.
    pub fn from_config(
        store: Arc<S>,
        contacts: Arc<dyn ContactDirectory>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<C>,
        config: &OnboardingConfig,
    ) -> Self {
        Self::new(store, contacts, mailer, clock, config.reminder_after_days)
    }

    pub fn run(&self) -> Result<SweepReport, SweepError> {
        let cutoff = self.clock.now() - Duration::days(self.reminder_after_days);
        let stale = self.store.stale_unreminded(cutoff)?;

        let mut report = SweepReport {
            examined: stale.len(),
            ..SweepReport::default()
        };

        for app in &stale {
            let contact = match self.contacts.contact(&app.applicant_id)? {
                Some(contact) => contact,
                None => {
                    warn!(application = %app.id, applicant = %app.applicant_id, "no contact on file, skipping reminder");
                    report.skipped.push(SkippedReminder {
                        application: app.id.clone(),
                        reason: SkipReason::UnknownContact,
                    });
                    continue;
                }
            };

            let (subject, body) = mail::draft_reminder(app, &contact.first_name);
            match self.mailer.send(OutboundEmail {
                to: contact.email,
                subject,
                body,
            }) {
                Ok(()) => report.reminded.push(app.id.clone()),
                Err(err) => {
                    warn!(application = %app.id, error = %err, "reminder hand-off failed");
                    report.skipped.push(SkippedReminder {
                        application: app.id.clone(),
                        reason: SkipReason::Delivery(err.to_string()),
                    });
                }
            }
        }

        if !report.reminded.is_empty() {
            self.store.mark_reminded(&report.reminded)?;
        }

        info!(
            examined = report.examined,
            reminded = report.reminded.len(),
            skipped = report.skipped.len(),
            "stale-draft sweep finished"
        );

        Ok(report)
    }
}
