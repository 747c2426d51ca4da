//! Configuration management for Social Engine

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Name of the per-workspace config file picked up from the current directory
pub const LOCAL_CONFIG_FILE: &str = "social.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub publer: PublerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
}

/// Where the pipeline keeps its files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub root: String,
    pub ideas_dir: String,
    pub drafts_dir: String,
    pub queue_dir: String,
    pub state_dir: String,
    pub prompts_dir: String,
    pub transcripts_dir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            ideas_dir: "ideas".to_string(),
            drafts_dir: "drafts".to_string(),
            queue_dir: "queue".to_string(),
            state_dir: "state".to_string(),
            prompts_dir: "prompts".to_string(),
            transcripts_dir: "inputs/transcripts".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Workspace root with `~` expanded
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.root).to_string())
    }

    fn join(&self, dir: &str) -> PathBuf {
        let expanded = shellexpand::tilde(dir).to_string();
        let path = Path::new(&expanded);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path().join(path)
        }
    }

    pub fn ideas_path(&self) -> PathBuf {
        self.join(&self.ideas_dir)
    }

    pub fn drafts_path(&self) -> PathBuf {
        self.join(&self.drafts_dir)
    }

    pub fn queue_path(&self) -> PathBuf {
        self.join(&self.queue_dir)
    }

    /// Default location of the schedule plan
    pub fn plan_path(&self) -> PathBuf {
        self.queue_path().join("plan.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.join(&self.state_dir)
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.join(&self.prompts_dir)
    }

    pub fn transcripts_path(&self) -> PathBuf {
        self.join(&self.transcripts_dir)
    }
}

/// Remote posting service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublerConfig {
    pub base_url: String,
    /// Sent as the workspace-scope header when present
    pub workspace_id: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for PublerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.publer.com/api/v1".to_string(),
            workspace_id: None,
            api_key_env: "PUBLER_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl PublerConfig {
    /// Read the API key from the configured environment variable
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(SecretString::from)
    }
}

/// Defaults for plan building
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA timezone name, e.g. "America/Chicago"
    pub timezone: String,
    /// Send time of the first item, "HH:MM"
    pub default_time: String,
    pub interval_days: u32,
    /// Network used when neither the draft nor the filter names one
    pub default_network: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            default_time: "09:00".to_string(),
            interval_days: 1,
            default_network: "twitter".to_string(),
        }
    }
}

/// Plan application policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    /// Delay before each job-status check, in seconds
    pub poll_delay_secs: u64,
    /// How many job-status checks to make after a submission
    pub poll_attempts: u32,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            poll_delay_secs: 2,
            poll_attempts: 1,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Falls back to built-in defaults when no config file exists.
    pub fn load() -> Result<Self> {
        match resolve_config_path()? {
            Some(path) => Self::load_from_path(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default_config())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Default configuration rooted at the given workspace directory
    pub fn for_workspace(root: &Path) -> Self {
        let mut config = Self::default();
        config.workspace.root = root.to_string_lossy().to_string();
        config
    }
}

/// Resolve the configuration file path
///
/// Order: `SOCIAL_CONFIG`, `./social.toml`, then the XDG config directory.
/// An explicit `SOCIAL_CONFIG` is returned even if the file is missing so the
/// read error surfaces.
pub fn resolve_config_path() -> Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("SOCIAL_CONFIG") {
        return Ok(Some(PathBuf::from(shellexpand::tilde(&path).to_string())));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Ok(Some(local));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;
    let xdg = config_dir.join("social-engine").join("config.toml");

    Ok(xdg.exists().then_some(xdg))
}
