use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for onboarding applications.
///
/// The upstream schema issues zero-padded 8-digit ids; the core treats the
/// value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for applicants and reviewers alike.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roles recognized by the onboarding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Sme,
    Staff,
}

/// Reviewer identity as exposed by the directory; load is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: UserId,
    pub role: UserRole,
}

/// The party an acknowledgement or derived notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Applicant,
    Reviewer,
}

/// Closed status set for the onboarding workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    UnderReview,
    UnderManualReview,
    RequiresAction,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::UnderManualReview => "Under Manual Review",
            ApplicationStatus::RequiresAction => "Requires Action",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }

    /// No transitions are defined out of a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved
                | ApplicationStatus::Rejected
                | ApplicationStatus::Withdrawn
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The workflow unit tracked by the core.
///
/// `is_open_applicant` / `is_open_reviewer` are true once the respective
/// party has acknowledged the latest state change. `version` backs the
/// optimistic write-back check in [`super::repository::ApplicationStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub reviewer_id: Option<UserId>,
    pub business_name: String,
    pub previous_status: Option<ApplicationStatus>,
    pub current_status: ApplicationStatus,
    pub reason: Option<String>,
    pub is_open_applicant: bool,
    pub is_open_reviewer: bool,
    pub reminder_sent: bool,
    pub last_modified: DateTime<FixedOffset>,
    pub version: u64,
}

impl Application {
    /// Fresh draft, nothing pending acknowledgement yet.
    pub fn draft(
        id: ApplicationId,
        applicant_id: UserId,
        business_name: impl Into<String>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id,
            applicant_id,
            reviewer_id: None,
            business_name: business_name.into(),
            previous_status: None,
            current_status: ApplicationStatus::Draft,
            reason: None,
            is_open_applicant: true,
            is_open_reviewer: true,
            reminder_sent: false,
            last_modified: now,
            version: 1,
        }
    }

    /// Express path: created directly under automated review, as if a draft
    /// had been submitted in the same breath.
    pub fn submitted(
        id: ApplicationId,
        applicant_id: UserId,
        business_name: impl Into<String>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let mut app = Self::draft(id, applicant_id, business_name, now);
        app.previous_status = Some(ApplicationStatus::Draft);
        app.current_status = ApplicationStatus::UnderReview;
        app.is_open_applicant = false;
        app
    }

    pub fn acknowledged_by(&self, party: Party) -> bool {
        match party {
            Party::Applicant => self.is_open_applicant,
            Party::Reviewer => self.is_open_reviewer,
        }
    }
}

/// Contact details resolved for outbound reminders and notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub first_name: String,
}

/// Offset of the business timezone (Asia/Singapore, no DST).
pub const BUSINESS_UTC_OFFSET_HOURS: i32 = 8;

/// Time source pinned to the business timezone; injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Production clock reporting Singapore time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessClock;

impl Clock for BusinessClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(BUSINESS_UTC_OFFSET_HOURS * 3600)
            .expect("business offset is within range");
        Utc::now().with_timezone(&offset)
    }
}
