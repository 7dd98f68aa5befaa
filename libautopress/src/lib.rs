//! Autopress - queue-driven article generation and publishing
//!
//! This library holds the plan queue, the generative content and CMS
//! adapters, social mirroring, and the publish scheduler used by the
//! `press-send` and `press-queue` binaries.

pub mod cms;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod logging;
pub mod platforms;
pub mod plans;
pub mod scheduler;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{AutopressError, Result};
pub use scheduler::{decide, Decision, ScheduleSettings, Scheduler};
pub use service::{PublishOutcome, Publisher, StatusReport};
pub use types::{NewPlan, PlanItem, PlanStatus, PostRecord, QueueStatus};
