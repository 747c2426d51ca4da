//! Building plans from approved drafts

use chrono::{DateTime, Utc};

use super::{Plan, PlanItem};
use crate::accounts::AccountResolver;
use crate::config::ScheduleConfig;
use crate::drafts::DraftStore;
use crate::error::Result;
use crate::scheduling::{add_days, localize, parse_start_date, parse_time, parse_timezone, tomorrow};
use crate::types::{DraftStatus, Network};

/// Knobs for a single plan build; `None` falls back to `[schedule]` config
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub platform: Option<Network>,
    pub count: Option<usize>,
    /// `YYYY-MM-DD` or natural language; defaults to tomorrow
    pub start_date: Option<String>,
    /// `HH:MM`
    pub start_time: Option<String>,
    pub interval_days: Option<u32>,
    pub timezone: Option<String>,
}

pub struct PlanBuilder<'a> {
    drafts: &'a DraftStore,
    resolver: &'a mut AccountResolver,
    defaults: &'a ScheduleConfig,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        drafts: &'a DraftStore,
        resolver: &'a mut AccountResolver,
        defaults: &'a ScheduleConfig,
    ) -> Self {
        Self {
            drafts,
            resolver,
            defaults,
        }
    }

    pub async fn build(&mut self, request: &PlanRequest) -> Result<Plan> {
        self.build_at(request, Utc::now()).await
    }

    /// Build a plan as if the current time were `now`
    ///
    /// Approved drafts are taken in file-name order and item `i` is placed
    /// `i * interval` calendar days after the base send time, at the same
    /// wall-clock time. Every item's account is resolved before the plan is
    /// returned; one unresolved account fails the whole build.
    pub async fn build_at(&mut self, request: &PlanRequest, now: DateTime<Utc>) -> Result<Plan> {
        let tz_name = request
            .timezone
            .as_deref()
            .unwrap_or(&self.defaults.timezone)
            .trim()
            .to_string();
        let tz = parse_timezone(&tz_name)?;
        let time = parse_time(
            request
                .start_time
                .as_deref()
                .unwrap_or(&self.defaults.default_time),
        )?;
        let start_date = match request.start_date.as_deref() {
            Some(input) => parse_start_date(input, tz, now)?,
            None => tomorrow(tz, now),
        };
        let interval = u64::from(request.interval_days.unwrap_or(self.defaults.interval_days));
        let fallback_network = request
            .platform
            .clone()
            .unwrap_or_else(|| Network::from_name(&self.defaults.default_network));

        let mut eligible = self
            .drafts
            .list(Some(DraftStatus::Approved), request.platform.as_ref())?;
        if let Some(count) = request.count {
            eligible.truncate(count);
        }

        let mut items = Vec::with_capacity(eligible.len());
        for (i, draft) in eligible.into_iter().enumerate() {
            let platform = draft.platform.clone().unwrap_or_else(|| fallback_network.clone());
            let account_id = self.resolver.resolve(&platform).await?;
            let date = add_days(start_date, i as u64 * interval)?;
            let scheduled_at = localize(date, time, tz)?;

            tracing::debug!("Planned {} for {} on {}", draft.id, scheduled_at, platform);
            items.push(PlanItem {
                draft: draft.path,
                platform,
                scheduled_at,
                account_id,
            });
        }

        tracing::info!("Built plan with {} items", items.len());
        Ok(Plan {
            created_at: now,
            timezone: tz_name,
            items,
        })
    }
}
