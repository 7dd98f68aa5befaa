//! Service layer: the publish pipeline and its helpers
//!
//! - `pipeline`: one publish attempt for the oldest pending plan
//! - `mirror`: cross-posting summaries to social networks
//! - `status`: queue summary with the next publish time

pub mod mirror;
pub mod pipeline;
pub mod status;

pub use mirror::{MirrorCoordinator, MirrorResult};
pub use pipeline::{PublishOutcome, Publisher};
pub use status::StatusReport;
