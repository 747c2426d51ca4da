//! Platform to remote account id resolution

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, SocialError};
use crate::remote::{Account, PostingApi, Workspace};
use crate::types::Network;

/// Account list snapshot, written under the state directory
pub const ACCOUNTS_FILE: &str = "accounts.json";

/// Resolves networks to account ids, fetching the account list once
///
/// The cache lives as long as the resolver. Call [`invalidate`] after
/// connecting or removing accounts on the remote side.
///
/// [`invalidate`]: AccountResolver::invalidate
pub struct AccountResolver {
    api: Arc<dyn PostingApi>,
    cache: Option<Vec<Account>>,
}

impl AccountResolver {
    pub fn new(api: Arc<dyn PostingApi>) -> Self {
        Self { api, cache: None }
    }

    async fn accounts(&mut self) -> Result<&[Account]> {
        if self.cache.is_none() {
            let accounts = self.api.list_accounts().await?;
            tracing::debug!("Fetched {} remote accounts", accounts.len());
            self.cache = Some(accounts);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Account id for `network`, matching the provider case-insensitively
    pub async fn resolve(&mut self, network: &Network) -> Result<String> {
        let target = network.as_str();
        self.accounts()
            .await?
            .iter()
            .find(|account| Network::from_name(&account.provider).as_str() == target)
            .map(|account| account.id.clone())
            .ok_or_else(|| SocialError::AccountNotFound {
                platform: target.to_string(),
            })
    }

    /// Drop the cached account list
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

/// Who the API key belongs to and which workspaces it can reach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthCheck {
    pub profile: serde_json::Value,
    pub workspaces: Vec<Workspace>,
}

/// Verify the credential against the service
pub async fn check_auth(api: &dyn PostingApi) -> Result<AuthCheck> {
    let profile = api.me().await?;
    let workspaces = api.list_workspaces().await?;
    tracing::debug!("Credential valid, {} workspaces visible", workspaces.len());
    Ok(AuthCheck {
        profile,
        workspaces,
    })
}

/// Write the account list to `state_dir/accounts.json`
pub fn save_accounts(accounts: &[Account], state_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(state_dir)?;
    let path = state_dir.join(ACCOUNTS_FILE);
    let json = serde_json::to_string_pretty(accounts)
        .map_err(|e| SocialError::InvalidInput(format!("Accounts are not serializable: {}", e)))?;
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::mock::{MockApi, MockConfig};

    #[tokio::test]
    async fn test_x_and_twitter_resolve_to_same_account() {
        let api = Arc::new(MockApi::with_default_accounts());
        let mut resolver = AccountResolver::new(api.clone());

        let x = resolver.resolve(&Network::from_name("x")).await.unwrap();
        let twitter = resolver.resolve(&Network::from_name("twitter")).await.unwrap();
        assert_eq!(x, "tw-1");
        assert_eq!(x, twitter);
    }

    #[tokio::test]
    async fn test_provider_match_is_case_insensitive() {
        let api = Arc::new(MockApi::new(
            MockConfig::default().with_account("li-9", "LinkedIn"),
        ));
        let mut resolver = AccountResolver::new(api);
        assert_eq!(resolver.resolve(&Network::LinkedIn).await.unwrap(), "li-9");
    }

    #[tokio::test]
    async fn test_accounts_fetched_once_until_invalidated() {
        let api = Arc::new(MockApi::with_default_accounts());
        let mut resolver = AccountResolver::new(api.clone());

        resolver.resolve(&Network::Twitter).await.unwrap();
        resolver.resolve(&Network::LinkedIn).await.unwrap();
        assert_eq!(api.accounts_call_count(), 1);

        resolver.invalidate();
        resolver.resolve(&Network::Twitter).await.unwrap();
        assert_eq!(api.accounts_call_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_platform_is_account_not_found() {
        let api = Arc::new(MockApi::with_default_accounts());
        let mut resolver = AccountResolver::new(api);

        let err = resolver
            .resolve(&Network::from_name("mastodon"))
            .await
            .unwrap_err();
        match err {
            SocialError::AccountNotFound { platform } => assert_eq!(platform, "mastodon"),
            other => panic!("Expected AccountNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let mut config = MockConfig::default();
        config.accounts_error = Some(RemoteError::Http {
            status: 401,
            body: "bad key".to_string(),
        });
        let mut resolver = AccountResolver::new(Arc::new(MockApi::new(config)));

        let err = resolver.resolve(&Network::Twitter).await.unwrap_err();
        assert!(matches!(err, SocialError::Remote(RemoteError::Http { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_check_auth_collects_workspaces() {
        let api = MockApi::new(
            MockConfig::default()
                .with_workspace("ws-1", "Main")
                .with_workspace("ws-2", "Clients"),
        );
        let check = check_auth(&api).await.unwrap();
        assert_eq!(check.workspaces.len(), 2);
        assert_eq!(check.workspaces[1].name.as_deref(), Some("Clients"));
    }

    #[tokio::test]
    async fn test_check_auth_without_key() {
        let api = MockApi::new(MockConfig::default().unconfigured());
        let err = check_auth(&api).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_save_accounts_snapshot() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = temp_dir.path().join("state");
        let accounts = vec![Account {
            id: "li-1".to_string(),
            provider: "linkedin".to_string(),
            name: Some("Work".to_string()),
        }];

        let path = save_accounts(&accounts, &state).unwrap();
        assert_eq!(path, state.join(ACCOUNTS_FILE));
        let saved: Vec<Account> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved, accounts);
    }
}
