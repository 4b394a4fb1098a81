//! Fires the pipeline on a cron schedule in the configured zone.
//!
//! The loop awaits each run before computing the next fire time, so runs
//! never overlap.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Zone;
use crate::error::ConfigError;
use crate::pipeline::DailyPipeline;

/// Parse a 6-field cron expression.
pub fn parse_schedule(expr: &str) -> Result<cron::Schedule, ConfigError> {
    cron::Schedule::from_str(expr).map_err(|e| ConfigError::InvalidValue {
        key: "DAILY_READINGS_CRON".to_string(),
        message: format!("invalid cron '{expr}': {e}"),
    })
}

/// How long to sleep from `now` until `next`.
pub fn wait_until(now: DateTime<Utc>, next: DateTime<Utc>) -> std::time::Duration {
    (next - now).to_std().unwrap_or_default()
}

/// Spawn the daily trigger loop.
pub fn spawn_daily_trigger(
    pipeline: Arc<DailyPipeline>,
    schedule: cron::Schedule,
    zone: Zone,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(next) = zone.next_fire(&schedule) else {
                warn!("Schedule has no upcoming fire time, daily trigger stopping");
                return;
            };
            info!(next_fire = %next, zone = %zone.name(), "Next readings run scheduled");
            tokio::time::sleep(wait_until(Utc::now(), next)).await;

            match pipeline.run(zone.date_of(next)).await {
                Ok(summary) => info!(
                    success = summary.success_count,
                    failed = summary.failure_count,
                    "Scheduled run complete"
                ),
                Err(e) => error!(error = %e, "Scheduled run failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_until_future() {
        let now = Utc::now();
        let next = now + chrono::Duration::seconds(90);
        assert_eq!(wait_until(now, next).as_secs(), 90);
    }

    #[test]
    fn wait_until_past_is_zero() {
        let now = Utc::now();
        let past = now - chrono::Duration::seconds(5);
        assert!(wait_until(now, past).is_zero());
    }

    #[test]
    fn parse_schedule_rejects_garbage() {
        assert!(parse_schedule("every day please").is_err());
        assert!(parse_schedule("0 0 6 * * *").is_ok());
    }

    #[test]
    fn daily_schedule_fires_at_local_time() {
        let schedule = parse_schedule("0 30 6 * * *").unwrap();
        let zone = Zone::parse("Asia/Tokyo").unwrap();
        let next = zone.next_fire(&schedule).unwrap();
        let local = next.with_timezone(&chrono_tz::Asia::Tokyo);
        assert_eq!(local.format("%H:%M:%S").to_string(), "06:30:00");
    }
}
