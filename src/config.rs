//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use secrecy::SecretString;

use crate::delivery::smtp::SmtpConfig;
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::readings::fetcher::DEFAULT_SOURCE_URL;

pub const DEFAULT_SEND_AT: &str = "06:00";
pub const DEFAULT_DB_PATH: &str = "./data/daily-readings.db";
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// The timezone runs are scheduled and dated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// An IANA zone such as `America/Chicago`.
    Named(Tz),
    /// Whatever the host is set to.
    Local,
}

impl Zone {
    /// Parse an IANA zone name.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        Tz::from_str(name.trim())
            .map(Zone::Named)
            .map_err(|e| ConfigError::InvalidValue {
                key: "DAILY_READINGS_TIMEZONE".to_string(),
                message: format!("unknown timezone '{name}': {e}"),
            })
    }

    /// Today's date in this zone.
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Calendar date of an instant in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Named(tz) => instant.with_timezone(tz).date_naive(),
            Zone::Local => instant.with_timezone(&Local).date_naive(),
        }
    }

    /// Next fire time of `schedule` after now, evaluated in this zone.
    pub fn next_fire(&self, schedule: &cron::Schedule) -> Option<DateTime<Utc>> {
        match self {
            Zone::Named(tz) => schedule.upcoming(*tz).next().map(|t| t.with_timezone(&Utc)),
            Zone::Local => schedule.upcoming(Local).next().map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Display name for health output and logs.
    pub fn name(&self) -> String {
        match self {
            Zone::Named(tz) => tz.name().to_string(),
            Zone::Local => "local".to_string(),
        }
    }
}

/// Parse a local `HH:MM` send time into a daily 6-field cron expression.
pub fn daily_cron(send_at: &str) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "DAILY_READINGS_SEND_AT".to_string(),
        message,
    };

    let (hour, minute) = send_at
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid(format!("expected HH:MM, got '{send_at}'")))?;
    let hour: u32 = hour
        .parse()
        .map_err(|_| invalid(format!("invalid hour in '{send_at}'")))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| invalid(format!("invalid minute in '{send_at}'")))?;
    if hour > 23 || minute > 59 {
        return Err(invalid(format!("time out of range: '{send_at}'")));
    }
    Ok(format!("0 {minute} {hour} * * *"))
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub zone: Zone,
    /// Six-field cron expression for the daily run.
    pub schedule: String,
    pub source_url: String,
    pub db_path: PathBuf,
    pub http_port: u16,
    pub log_dir: Option<PathBuf>,
    /// `None` selects the fixed fallback reflection.
    pub llm: Option<LlmConfig>,
    /// `None` disables sending.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let zone = match var("DAILY_READINGS_TIMEZONE") {
            Some(name) => Zone::parse(&name)?,
            None => Zone::Local,
        };

        let schedule = match var("DAILY_READINGS_CRON") {
            Some(expr) => expr,
            None => daily_cron(&var("DAILY_READINGS_SEND_AT").unwrap_or_else(|| DEFAULT_SEND_AT.to_string()))?,
        };
        cron::Schedule::from_str(&schedule).map_err(|e| ConfigError::InvalidValue {
            key: "DAILY_READINGS_CRON".to_string(),
            message: format!("invalid cron '{schedule}': {e}"),
        })?;

        let http_port = match var("DAILY_READINGS_HTTP_PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DAILY_READINGS_HTTP_PORT".to_string(),
                message: format!("not a port number: '{port}'"),
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        let llm = llm_from_lookup(&var);
        let smtp = smtp_from_lookup(&var)?;

        Ok(Self {
            zone,
            schedule,
            source_url: var("DAILY_READINGS_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            db_path: var("DAILY_READINGS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            http_port,
            log_dir: var("DAILY_READINGS_LOG_DIR").map(PathBuf::from),
            llm,
            smtp,
        })
    }
}

fn llm_from_lookup(var: &impl Fn(&str) -> Option<String>) -> Option<LlmConfig> {
    let (backend, api_key) = if let Some(key) = var("ANTHROPIC_API_KEY") {
        (LlmBackend::Anthropic, key)
    } else if let Some(key) = var("OPENAI_API_KEY") {
        (LlmBackend::OpenAi, key)
    } else {
        return None;
    };

    let model = var("DAILY_READINGS_MODEL").unwrap_or_else(|| backend.default_model().to_string());
    Some(LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model,
    })
}

fn smtp_from_lookup(var: &impl Fn(&str) -> Option<String>) -> Result<Option<SmtpConfig>, ConfigError> {
    let Some(host) = var("SMTP_HOST") else {
        return Ok(None);
    };

    let port = match var("SMTP_PORT") {
        Some(port) => port.parse().map_err(|_| ConfigError::InvalidValue {
            key: "SMTP_PORT".to_string(),
            message: format!("not a port number: '{port}'"),
        })?,
        None => 587,
    };
    let username = var("SMTP_USERNAME").unwrap_or_default();
    let from_address = var("SMTP_FROM")
        .or_else(|| (!username.is_empty()).then(|| username.clone()))
        .ok_or_else(|| ConfigError::MissingEnvVar("SMTP_FROM".to_string()))?;

    Ok(Some(SmtpConfig {
        host,
        port,
        username,
        password: SecretString::from(var("SMTP_PASSWORD").unwrap_or_default()),
        from_address,
    }))
}
