//! Queue status summary shared by `press-send --status` and the daemon's periodic log

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use crate::db::Database;
use crate::error::Result;
use crate::types::QueueStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub pending: i64,
    pub published: i64,
    pub total: i64,
    pub posts: i64,
    pub last_publish: Option<DateTime<Utc>>,
    /// `None` means the next tick may publish right away
    pub next_publish: Option<DateTime<Utc>>,
}

impl StatusReport {
    pub fn from_status(status: QueueStatus, interval: Duration) -> Self {
        Self {
            pending: status.pending,
            published: status.published,
            total: status.total,
            posts: status.posts,
            last_publish: status.last_publish,
            next_publish: status.last_publish.map(|last| last + interval),
        }
    }

    pub async fn collect(db: &Database, interval: Duration) -> Result<Self> {
        Ok(Self::from_status(db.queue_status().await?, interval))
    }
}

fn format_time(time: Option<DateTime<Utc>>, missing: &str) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| missing.to_string())
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pending:      {}", self.pending)?;
        writeln!(f, "Published:    {}", self.published)?;
        writeln!(f, "Total:        {}", self.total)?;
        writeln!(f, "Posts:        {}", self.posts)?;
        writeln!(f, "Last publish: {}", format_time(self.last_publish, "never"))?;
        write!(f, "Next publish: {}", format_time(self.next_publish, "immediately"))
    }
}
