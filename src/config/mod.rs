use std::env;

/// Tunables for the onboarding core, loaded from the environment.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Days a Draft / Requires Action row may sit untouched before the
    /// sweeper reminds the applicant.
    pub reminder_after_days: i64,
    pub telemetry: TelemetryConfig,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            reminder_after_days: 2,
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl OnboardingConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let reminder_after_days = match env::var("ONBOARDING_REMINDER_AFTER_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::InvalidReminderDays { value: raw })?,
            Err(_) => defaults.reminder_after_days,
        };

        let log_level = env::var("ONBOARDING_LOG_LEVEL")
            .unwrap_or_else(|_| defaults.telemetry.log_level.clone());

        Ok(Self {
            reminder_after_days,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Error raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ONBOARDING_REMINDER_AFTER_DAYS must be a positive integer, got '{value}'")]
    InvalidReminderDays { value: String },
}
