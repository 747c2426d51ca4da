//! Core value types shared across the pipeline

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::error::SocialError;

/// A target social network
///
/// `x` and `twitter` are the same network. Unknown names are kept,
/// lower-cased, so drafts for networks we have no template for still flow
/// through planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Network {
    #[default]
    Twitter,
    LinkedIn,
    Other(String),
}

impl Network {
    pub fn from_name(name: &str) -> Self {
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "x" | "twitter" => Network::Twitter,
            "linkedin" => Network::LinkedIn,
            _ => Network::Other(lowered),
        }
    }

    /// Canonical name, also the key used in remote payloads
    pub fn as_str(&self) -> &str {
        match self {
            Network::Twitter => "twitter",
            Network::LinkedIn => "linkedin",
            Network::Other(name) => name,
        }
    }

    /// Networks that get drafts when none are requested explicitly
    pub fn defaults() -> Vec<Network> {
        vec![Network::LinkedIn, Network::Twitter]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Network::from_name(s))
    }
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Network::from_name(&name))
    }
}

/// Draft lifecycle: `draft` -> `approved` -> `scheduled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Approved,
    Scheduled,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Approved => "approved",
            DraftStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DraftStatus {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(DraftStatus::Draft),
            "approved" => Ok(DraftStatus::Approved),
            "scheduled" => Ok(DraftStatus::Scheduled),
            other => Err(SocialError::InvalidInput(format!(
                "Unknown draft status '{}'. Valid options: draft, approved, scheduled",
                other
            ))),
        }
    }
}

/// Idea lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    /// Ready to be drafted
    Ready,
    /// Drafts exist
    Drafted,
    /// Needs a human look before drafting (repo ingests)
    Review,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Ready => "ready",
            IdeaStatus::Drafted => "drafted",
            IdeaStatus::Review => "review",
        }
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IdeaStatus {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ready" => Ok(IdeaStatus::Ready),
            "drafted" => Ok(IdeaStatus::Drafted),
            "review" => Ok(IdeaStatus::Review),
            other => Err(SocialError::InvalidInput(format!(
                "Unknown idea status '{}'. Valid options: ready, drafted, review",
                other
            ))),
        }
    }
}
