use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, TimeZone};

use crate::workflows::onboarding::domain::{
    Application, ApplicationId, ApplicationStatus, Clock, Contact, Party, Reviewer, UserId,
    UserRole, BUSINESS_UTC_OFFSET_HOURS,
};
use crate::workflows::onboarding::lifecycle::LifecycleEngine;
use crate::workflows::onboarding::repository::{
    ApplicationStore, ContactDirectory, DeliveryError, DirectoryError, Mailer, OutboundEmail,
    ReviewerDirectory, ReviewerLease, StoreError,
};

pub(super) fn sgt(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(BUSINESS_UTC_OFFSET_HOURS * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .expect("valid time")
}

pub(super) fn base_time() -> DateTime<FixedOffset> {
    sgt(2025, 3, 10, 9)
}

pub(super) fn application(
    id: &str,
    status: ApplicationStatus,
    previous: Option<ApplicationStatus>,
) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        applicant_id: UserId("sme-0001".to_string()),
        reviewer_id: None,
        business_name: "Tan Logistics Pte Ltd".to_string(),
        previous_status: previous,
        current_status: status,
        reason: None,
        is_open_applicant: true,
        is_open_reviewer: true,
        reminder_sent: false,
        last_modified: base_time(),
        version: 1,
    }
}

/// Deterministic, advanceable clock pinned to business time.
pub(super) struct FrozenClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FrozenClock {
    pub(super) fn at(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += Duration::days(days);
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// In-memory store with the same version-checked write-back contract the
/// production persistence collaborator provides.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl MemoryStore {
    pub(super) fn seed(&self, app: Application) {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(app.id.clone(), app);
    }

    pub(super) fn get(&self, id: &ApplicationId) -> Option<Application> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl ApplicationStore for MemoryStore {
    fn insert(&self, app: Application) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        if records.contains_key(&app.id) {
            return Err(StoreError::Conflict);
        }
        records.insert(app.id.clone(), app.clone());
        Ok(app)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned())
    }

    fn update(&self, app: Application) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let stored = records.get(&app.id).ok_or(StoreError::NotFound)?;
        if stored.version != app.version {
            return Err(StoreError::Conflict);
        }
        let mut committed = app;
        committed.version += 1;
        records.insert(committed.id.clone(), committed.clone());
        Ok(committed)
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn active_caseloads(&self) -> Result<BTreeMap<UserId, usize>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        let mut loads = BTreeMap::new();
        for app in records.values() {
            if app.current_status.is_terminal() {
                continue;
            }
            if let Some(reviewer) = &app.reviewer_id {
                *loads.entry(reviewer.clone()).or_insert(0) += 1;
            }
        }
        Ok(loads)
    }

    fn stale_unreminded(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> Result<Vec<Application>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        Ok(records
            .values()
            .filter(|app| {
                matches!(
                    app.current_status,
                    ApplicationStatus::Draft | ApplicationStatus::RequiresAction
                ) && !app.reminder_sent
                    && app.last_modified < cutoff
            })
            .cloned()
            .collect())
    }

    fn mark_reminded(&self, ids: &[ApplicationId]) -> Result<usize, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let mut affected = 0;
        for id in ids {
            if let Some(app) = records.get_mut(id) {
                if !app.reminder_sent {
                    app.reminder_sent = true;
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    fn mark_open(&self, party: Party, id: &ApplicationId) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let app = records.get_mut(id).ok_or(StoreError::NotFound)?;
        match party {
            Party::Applicant => app.is_open_applicant = true,
            Party::Reviewer => app.is_open_reviewer = true,
        }
        Ok(())
    }

    fn mark_all_open(&self, party: Party, holder: &UserId) -> Result<usize, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let mut flipped = 0;
        for app in records.values_mut() {
            match party {
                Party::Applicant if &app.applicant_id == holder && !app.is_open_applicant => {
                    app.is_open_applicant = true;
                    flipped += 1;
                }
                Party::Reviewer
                    if app.reviewer_id.as_ref() == Some(holder) && !app.is_open_reviewer =>
                {
                    app.is_open_reviewer = true;
                    flipped += 1;
                }
                _ => {}
            }
        }
        Ok(flipped)
    }
}

/// In-memory reviewer directory with a non-blocking lease set.
pub(super) struct MemoryDirectory {
    staff: Vec<Reviewer>,
    locked: Arc<Mutex<HashSet<UserId>>>,
}

impl MemoryDirectory {
    pub(super) fn with_staff(ids: &[&str]) -> Self {
        Self {
            staff: ids
                .iter()
                .map(|id| Reviewer {
                    id: UserId(id.to_string()),
                    role: UserRole::Staff,
                })
                .collect(),
            locked: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub(super) fn empty() -> Self {
        Self::with_staff(&[])
    }
}

impl ReviewerDirectory for MemoryDirectory {
    fn staff(&self) -> Result<Vec<Reviewer>, DirectoryError> {
        Ok(self.staff.clone())
    }

    fn try_lock(&self, id: &UserId) -> Result<Option<ReviewerLease>, DirectoryError> {
        let mut locked = self.locked.lock().expect("lease mutex poisoned");
        if !locked.insert(id.clone()) {
            return Ok(None);
        }
        let set = Arc::clone(&self.locked);
        let held = id.clone();
        Ok(Some(ReviewerLease::new(
            id.clone(),
            Box::new(move || {
                set.lock().expect("lease mutex poisoned").remove(&held);
            }),
        )))
    }
}

/// Contact lookup backed by a map; unknown ids resolve to `None`.
#[derive(Default)]
pub(super) struct MemoryContacts {
    entries: HashMap<UserId, Contact>,
}

impl MemoryContacts {
    pub(super) fn with(entries: &[(&str, &str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(id, email, first_name)| {
                    (
                        UserId(id.to_string()),
                        Contact {
                            email: email.to_string(),
                            first_name: first_name.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl ContactDirectory for MemoryContacts {
    fn contact(&self, id: &UserId) -> Result<Option<Contact>, DirectoryError> {
        Ok(self.entries.get(id).cloned())
    }
}

/// Mailer capturing every hand-off, optionally refusing specific recipients.
#[derive(Default)]
pub(super) struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    refuse: Mutex<HashSet<String>>,
}

impl MemoryMailer {
    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn refuse(&self, recipient: &str) {
        self.refuse
            .lock()
            .expect("mailer mutex poisoned")
            .insert(recipient.to_string());
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: OutboundEmail) -> Result<(), DeliveryError> {
        if self
            .refuse
            .lock()
            .expect("mailer mutex poisoned")
            .contains(&message.to)
        {
            return Err(DeliveryError::Transport("mailbox rejected".to_string()));
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(())
    }
}

/// Mailer whose transport is permanently down.
pub(super) struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _message: OutboundEmail) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn build_engine(
    store: Arc<MemoryStore>,
    reviewers: Arc<MemoryDirectory>,
    clock: Arc<FrozenClock>,
) -> LifecycleEngine<MemoryStore, MemoryDirectory, FrozenClock> {
    LifecycleEngine::new(store, reviewers, clock)
}
