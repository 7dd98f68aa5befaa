//! Publish scheduler
//!
//! Polls the queue on a fixed interval and decides on every tick whether a
//! publish attempt is due. The decision itself is the pure [`decide`]
//! function; [`Scheduler`] owns the clients and the last-failure timestamp.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{parse_duration_field, SchedulerConfig};
use crate::error::{AutopressError, ConfigError, Result};
use crate::service::{PublishOutcome, Publisher, StatusReport};

const STATUS_LOG_EVERY: std::time::Duration = std::time::Duration::from_secs(6 * 3600);

/// What a tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing has ever been published
    PublishFirst,
    /// The interval since the last publish has elapsed
    PublishDue,
    /// Interval not yet elapsed
    Wait { next_at: DateTime<Utc> },
    /// A recent failure is still cooling down
    CoolingDown { until: DateTime<Utc> },
}

impl Decision {
    pub fn should_publish(&self) -> bool {
        matches!(self, Decision::PublishFirst | Decision::PublishDue)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::PublishFirst => write!(f, "no previous publish, publishing now"),
            Decision::PublishDue => write!(f, "interval elapsed, publishing now"),
            Decision::Wait { next_at } => write!(f, "next publish at {}", next_at),
            Decision::CoolingDown { until } => write!(f, "cooling down until {}", until),
        }
    }
}

/// Decide whether to publish at `now`
///
/// An active failure cooldown wins over everything else. Without a previous
/// publish the first plan goes out immediately; otherwise the interval must
/// have fully elapsed.
pub fn decide(
    now: DateTime<Utc>,
    last_publish: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    interval: Duration,
    cooldown: Duration,
) -> Decision {
    if let Some(failed_at) = last_failure {
        if now - failed_at < cooldown {
            return Decision::CoolingDown {
                until: failed_at + cooldown,
            };
        }
    }

    match last_publish {
        None => Decision::PublishFirst,
        Some(last) if now - last >= interval => Decision::PublishDue,
        Some(last) => Decision::Wait {
            next_at: last + interval,
        },
    }
}

/// Timing knobs resolved from `[scheduler]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub interval: Duration,
    pub cooldown: Duration,
    pub poll_interval: std::time::Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval: Duration::days(3),
            cooldown: Duration::minutes(60),
            poll_interval: std::time::Duration::from_secs(300),
        }
    }
}

impl ScheduleSettings {
    pub fn from_config(config: &SchedulerConfig) -> Result<Self> {
        Ok(Self {
            interval: to_chrono("scheduler.publish_interval", &config.publish_interval)?,
            cooldown: to_chrono("scheduler.failure_cooldown", &config.failure_cooldown)?,
            poll_interval: parse_duration_field("scheduler.poll_interval", &config.poll_interval)?,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: std::time::Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

fn to_chrono(field: &str, value: &str) -> Result<Duration> {
    let std_duration = parse_duration_field(field, value)?;
    Duration::from_std(std_duration).map_err(|_| {
        AutopressError::Config(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is out of range", value),
        })
    })
}

/// Result of one scheduler tick
#[derive(Debug)]
pub enum TickOutcome {
    Published(PublishOutcome),
    QueueEmpty,
    Skipped(Decision),
    Failed(AutopressError),
}

pub struct Scheduler {
    publisher: Publisher,
    settings: ScheduleSettings,
    last_failure: Option<DateTime<Utc>>,
}

impl Scheduler {
    pub fn new(publisher: Publisher, settings: ScheduleSettings) -> Self {
        Self {
            publisher,
            settings,
            last_failure: None,
        }
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        self.last_failure
    }

    /// Run one polling step as if the clock read `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if let Some(failed_at) = self.last_failure {
            if now - failed_at >= self.settings.cooldown {
                debug!("Failure cooldown elapsed");
                self.last_failure = None;
            }
        }

        let last_publish = match self.publisher.db().last_publish_time().await {
            Ok(last) => last,
            Err(e) => {
                error!("Could not read queue status: {}", e);
                self.last_failure = Some(now);
                return TickOutcome::Failed(e);
            }
        };

        let decision = decide(
            now,
            last_publish,
            self.last_failure,
            self.settings.interval,
            self.settings.cooldown,
        );
        if !decision.should_publish() {
            debug!("Skipping tick: {}", decision);
            return TickOutcome::Skipped(decision);
        }
        info!("Publishing: {}", decision);

        match self.publisher.publish_next().await {
            Ok(Some(outcome)) => {
                self.last_failure = None;
                self.log_status().await;
                TickOutcome::Published(outcome)
            }
            Ok(None) => TickOutcome::QueueEmpty,
            Err(e) => {
                error!(upstream = e.is_upstream(), "Publish attempt failed: {}", e);
                warn!(
                    "Cooling down for {} minutes",
                    self.settings.cooldown.num_minutes()
                );
                self.last_failure = Some(now);
                TickOutcome::Failed(e)
            }
        }
    }

    /// Poll until `shutdown` is set
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) -> Result<()> {
        info!(
            "Scheduler started: interval {}h, cooldown {}m, poll every {}s",
            self.settings.interval.num_hours(),
            self.settings.cooldown.num_minutes(),
            self.settings.poll_interval.as_secs()
        );
        self.log_status().await;
        let mut last_status_log = Instant::now();

        while !shutdown.load(Ordering::Relaxed) {
            self.tick(Utc::now()).await;

            if last_status_log.elapsed() >= STATUS_LOG_EVERY {
                self.log_status().await;
                last_status_log = Instant::now();
            }

            sleep_until_shutdown(self.settings.poll_interval, &shutdown).await;
        }

        info!("Shutdown requested, scheduler stopped");
        Ok(())
    }

    async fn log_status(&self) {
        match StatusReport::collect(self.publisher.db(), self.settings.interval).await {
            Ok(report) => info!(
                pending = report.pending,
                published = report.published,
                posts = report.posts,
                "Queue status: last publish {}, next publish {}",
                report
                    .last_publish
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
                report
                    .next_publish
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "immediately".to_string())
            ),
            Err(e) => warn!("Could not read queue status: {}", e),
        }
    }
}

/// Sleep for `duration`, waking at least once per second to check `shutdown`
async fn sleep_until_shutdown(duration: std::time::Duration, shutdown: &AtomicBool) {
    let step = std::time::Duration::from_secs(1);
    let mut remaining = duration;
    while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
        let chunk = remaining.min(step);
        sleep(chunk).await;
        remaining -= chunk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_first_publish_is_immediate() {
        let decision = decide(at(12), None, None, Duration::days(3), Duration::minutes(60));
        assert_eq!(decision, Decision::PublishFirst);
        assert!(decision.should_publish());
    }

    #[test]
    fn test_interval_boundary() {
        let last = at(0);
        let interval = Duration::hours(6);
        let cooldown = Duration::minutes(60);

        assert_eq!(
            decide(at(5), Some(last), None, interval, cooldown),
            Decision::Wait { next_at: at(6) }
        );
        assert_eq!(
            decide(at(6), Some(last), None, interval, cooldown),
            Decision::PublishDue
        );
        assert_eq!(
            decide(at(7), Some(last), None, interval, cooldown),
            Decision::PublishDue
        );
    }

    #[test]
    fn test_cooldown_blocks_until_elapsed() {
        let failed = at(10);
        let cooldown = Duration::minutes(60);

        let during = decide(
            failed + Duration::minutes(59),
            None,
            Some(failed),
            Duration::days(3),
            cooldown,
        );
        assert_eq!(during, Decision::CoolingDown { until: at(11) });
        assert!(!during.should_publish());

        assert_eq!(
            decide(at(11), None, Some(failed), Duration::days(3), cooldown),
            Decision::PublishFirst
        );
    }

    #[test]
    fn test_cooldown_wins_over_due_interval() {
        let failed = at(11) + Duration::minutes(30);
        let decision = decide(
            at(12),
            Some(at(0)),
            Some(failed),
            Duration::hours(1),
            Duration::minutes(60),
        );
        assert_eq!(
            decision,
            Decision::CoolingDown {
                until: at(12) + Duration::minutes(30)
            }
        );

        // Once the window closes the overdue interval publishes
        assert_eq!(
            decide(
                at(12) + Duration::minutes(30),
                Some(at(0)),
                Some(failed),
                Duration::hours(1),
                Duration::minutes(60),
            ),
            Decision::PublishDue
        );
    }

    #[test]
    fn test_settings_from_config() {
        let settings = ScheduleSettings::from_config(&SchedulerConfig::default()).unwrap();
        assert_eq!(settings, ScheduleSettings::default());

        let custom = SchedulerConfig {
            publish_interval: "12h".to_string(),
            failure_cooldown: "15m".to_string(),
            poll_interval: "30s".to_string(),
        };
        let settings = ScheduleSettings::from_config(&custom).unwrap();
        assert_eq!(settings.interval, Duration::hours(12));
        assert_eq!(settings.cooldown, Duration::minutes(15));
        assert_eq!(settings.poll_interval, std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_settings_reject_bad_duration() {
        let bad = SchedulerConfig {
            publish_interval: "every tuesday".to_string(),
            ..Default::default()
        };
        let err = ScheduleSettings::from_config(&bad).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("scheduler.publish_interval"));
    }

    #[tokio::test]
    async fn test_sleep_returns_early_on_shutdown() {
        let shutdown = AtomicBool::new(true);
        let started = Instant::now();
        sleep_until_shutdown(std::time::Duration::from_secs(30), &shutdown).await;
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
