//! Schedule planning
//!
//! Approved drafts become a [`Plan`]: an ordered list of [`PlanItem`]s, each
//! bound to a remote account and an absolute send time. Plans are written to
//! disk for review and later replayed against the posting service.
//!
//! - [`builder`] selects drafts and computes send times
//! - [`store`] persists plans as JSON
//! - [`apply`] submits plan items one by one

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::Network;

pub mod apply;
pub mod builder;
pub mod store;

pub use apply::{ApplyPolicy, ApplyResult, FailedItem, ItemFailure, PlanApplier, ScheduledItem};
pub use builder::{PlanBuilder, PlanRequest};
pub use store::PlanStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub created_at: DateTime<Utc>,
    /// IANA name the send times were computed in
    pub timezone: String,
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub draft: PathBuf,
    pub platform: Network,
    pub scheduled_at: DateTime<FixedOffset>,
    pub account_id: String,
}
