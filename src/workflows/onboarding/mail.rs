//! Outbound email wording for the onboarding workflow.
//!
//! Builders return `(subject, body)`; delivery stays behind the
//! [`super::repository::Mailer`] port.

use super::domain::Application;

const WEBSITE_URL: &str = "https://placeholder-bank.com";
const INTERNAL_URL: &str = "https://internal-placeholder-bank.com";

pub fn draft_saved(app: &Application) -> (String, String) {
    let subject = "Draft Application Saved – Action Required".to_string();
    let body = format!(
        "Hi,\n\n\
         You have saved a draft application for:\n\n\
         Business Name: {business}\n\
         Application ID: {id}\n\n\
         Your application has not been submitted yet.\n\
         Please return to complete and submit your application.\n\n\
         Regards,\n\
         SME Onboarding Team\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}

pub fn application_submitted(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Application Submitted Successfully".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application to open a business account for \"{business}\" has been \
         successfully submitted.\n\n\
         Application ID: {id}\n\
         Current Status: Under Review\n\n\
         Track your application here:\n\
         {WEBSITE_URL}/applications/{id}\n\n\
         Best regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}

pub fn approved(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Application Approved".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application to open a business account for \"{business}\" has been \
         approved.\n\n\
         Application ID: {id}\n\n\
         Next steps:\n\
         {WEBSITE_URL}/applications/{id}\n\n\
         Best regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}

pub fn rejected(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Application Unsuccessful".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application to open a business account for \"{business}\" was \
         unsuccessful.\n\n\
         Application ID: {id}\n\n\
         Reason:\n\
         {reason}\n\n\
         View details here:\n\
         {WEBSITE_URL}/applications/{id}\n\n\
         Best regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
        reason = app.reason.as_deref().unwrap_or("Not provided"),
    );
    (subject, body)
}

pub fn action_required(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Action Required: Application Update Needed".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application for \"{business}\" requires further action.\n\n\
         Application ID: {id}\n\n\
         Staff Notes:\n\
         {reason}\n\n\
         Please update your application here:\n\
         {WEBSITE_URL}/applications/{id}\n\n\
         Regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
        reason = app.reason.as_deref().unwrap_or("Not provided"),
    );
    (subject, body)
}

pub fn applicant_manual_review(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Application Under Manual Review".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application for \"{business}\" is undergoing additional review.\n\n\
         Application ID: {id}\n\n\
         We will notify you if further information is required.\n\n\
         Regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}

pub fn staff_manual_review(app: &Application, staff_first_name: &str) -> (String, String) {
    let subject = format!("Manual Review Required: Application {}", app.id);
    let body = format!(
        "Dear {staff_first_name},\n\n\
         Application ID: {id}\n\
         Business Name: {business}\n\n\
         This application requires manual review.\n\n\
         Access application here:\n\
         {INTERNAL_URL}/applications/{id}\n\n\
         Regards,\n\
         Onboarding System\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}

pub fn draft_reminder(app: &Application, first_name: &str) -> (String, String) {
    let subject = "Reminder: Incomplete Application".to_string();
    let body = format!(
        "Dear {first_name},\n\n\
         Your application for \"{business}\" is still incomplete.\n\n\
         Application ID: {id}\n\n\
         Please return to complete and submit your application.\n\n\
         Resume here:\n\
         {WEBSITE_URL}/applications/{id}\n\n\
         Best regards,\n\
         Onboarding Team\n",
        business = app.business_name,
        id = app.id,
    );
    (subject, body)
}
