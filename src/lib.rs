//! Core library for the SME business-onboarding review workflow.
//!
//! The crate models the application lifecycle state machine, the
//! load-balanced reviewer assignment, the notification derivation that reads
//! off application state, and the stale-draft reminder sweep. Everything
//! infrastructural (the record store, reviewer directory, contact lookup,
//! and email transport) is consumed through the traits in
//! [`workflows::onboarding::repository`], so the core carries no process-wide
//! mutable state of its own.

pub mod config;
pub mod telemetry;
pub mod workflows;

pub use workflows::onboarding;
