//! Social Engine - file-based content pipeline
//!
//! Ideas are ingested from local sources, turned into per-network drafts,
//! reviewed by hand, planned onto a schedule and submitted to a hosted
//! posting service. All state is plain files in the workspace.

pub mod accounts;
pub mod analytics;
pub mod compose;
pub mod config;
pub mod drafts;
pub mod error;
pub mod events;
pub mod frontmatter;
pub mod ideas;
pub mod ingest;
pub mod logging;
pub mod planner;
pub mod queue;
pub mod remote;
pub mod scheduling;
pub mod status;
pub mod types;

pub use accounts::AccountResolver;
pub use config::Config;
pub use drafts::{Draft, DraftStore};
pub use error::{ConfigError, RemoteError, Result, SocialError};
pub use events::{Event, EventKind, EventLog};
pub use ideas::{Idea, IdeaStore, NewIdea};
pub use planner::{Plan, PlanApplier, PlanBuilder, PlanItem, PlanRequest, PlanStore};
pub use remote::PostingApi;
pub use types::{DraftStatus, IdeaStatus, Network};
