//! Post insights for a connected account

use chrono::NaiveDate;
use std::sync::Arc;

use crate::accounts::AccountResolver;
use crate::error::Result;
use crate::remote::{InsightsRequest, PostingApi};
use crate::types::Network;

/// Which account to report on
#[derive(Debug, Clone, PartialEq)]
pub enum InsightsTarget {
    /// A remote account id, used as given
    Account(String),
    /// The account connected for this network
    Network(Network),
}

pub struct Analytics {
    api: Arc<dyn PostingApi>,
    resolver: AccountResolver,
}

impl Analytics {
    pub fn new(api: Arc<dyn PostingApi>) -> Self {
        Self {
            resolver: AccountResolver::new(api.clone()),
            api,
        }
    }

    /// Fetch insights for posts published between `from` and `to`
    pub async fn post_insights(
        &mut self,
        target: &InsightsTarget,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<serde_json::Value> {
        let account_id = match target {
            InsightsTarget::Account(id) => id.clone(),
            InsightsTarget::Network(network) => self.resolver.resolve(network).await?,
        };
        let request = InsightsRequest::new(account_id, from, to)?;

        tracing::debug!(
            "Fetching insights for {} from {} to {}",
            request.account_id,
            request.from,
            request.to
        );
        Ok(self.api.post_insights(&request).await?)
    }
}
