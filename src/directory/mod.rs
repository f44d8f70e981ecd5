//! Point lookups against the relational store.
//!
//! Only two reads are needed: the display name of a message sender and the
//! summary of a business card. Both are `select ... where id = X limit 1`.

mod in_memory;
mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use in_memory::InMemoryDirectory;
pub use rest::{RestDirectory, RestDirectoryConfig};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("config error: {0}")]
    Config(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInfo {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Display name of a user, `None` when the profile is missing or unnamed.
    async fn sender_name(&self, user_id: &str) -> Result<Option<String>, DirectoryError>;

    async fn card_info(&self, mcard_id: &str) -> Result<Option<CardInfo>, DirectoryError>;
}

/// Join first and last name, ignoring blank parts.
pub(crate) fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
