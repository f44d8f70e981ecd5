use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{display_name, CardInfo, Directory, DirectoryError};

const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestDirectoryConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Directory backed by the hosted REST endpoint (`/rest/v1/<table>`).
pub struct RestDirectory {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestDirectory {
    pub fn new(config: RestDirectoryConfig) -> Result<Self, DirectoryError> {
        if config.base_url.trim().is_empty() {
            return Err(DirectoryError::Config(
                "directory base url cannot be empty".to_string(),
            ));
        }
        if config.api_key.trim().is_empty() {
            return Err(DirectoryError::Config(
                "directory api key cannot be empty".to_string(),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(DirectoryError::Config(
                "directory timeout must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .map_err(|error| DirectoryError::Config(error.to_string()))?,
        })
    }

    async fn select_one<T>(
        &self,
        table: &str,
        columns: &str,
        id: &str,
    ) -> Result<Option<T>, DirectoryError>
    where
        T: serde::de::DeserializeOwned,
    {
        let endpoint = format!(
            "{}/rest/v1/{table}?select={columns}&id=eq.{}&limit=1",
            self.base_url,
            urlencoding::encode(id)
        );
        let response = self
            .client
            .get(&endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Request(format!(
                "{table} lookup returned status {}: {body}",
                status.as_u16()
            )));
        }

        let mut rows: Vec<T> = response.json().await.map_err(|error| {
            DirectoryError::InvalidResponse(format!("failed to parse {table} rows: {error}"))
        })?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }
}

#[async_trait]
impl Directory for RestDirectory {
    async fn sender_name(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
        let row: Option<ProfileRow> = self
            .select_one("profiles", "first_name,last_name", user_id)
            .await?;
        Ok(row.and_then(|row| display_name(row.first_name.as_deref(), row.last_name.as_deref())))
    }

    async fn card_info(&self, mcard_id: &str) -> Result<Option<CardInfo>, DirectoryError> {
        self.select_one("mcards", "id,full_name,user_id", mcard_id).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn directory(server: &MockServer) -> RestDirectory {
        RestDirectory::new(RestDirectoryConfig {
            base_url: server.base_url(),
            api_key: "anon-key".to_string(),
            timeout_ms: 5_000,
        })
        .expect("directory should initialize")
    }

    #[tokio::test]
    async fn sender_name_joins_profile_names() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.u1")
                .query_param("limit", "1")
                .header("apikey", "anon-key");
            then.status(200)
                .json_body(json!([{ "first_name": "Awa", "last_name": "Diop" }]));
        });

        let name = directory(&server).sender_name("u1").await.unwrap();
        mock.assert();
        assert_eq!(name.as_deref(), Some("Awa Diop"));
    }

    #[tokio::test]
    async fn missing_profile_yields_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200).json_body(json!([]));
        });

        assert_eq!(directory(&server).sender_name("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn card_info_parses_row() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/mcards")
                .query_param("id", "eq.c1");
            then.status(200)
                .json_body(json!([{ "id": "c1", "full_name": "Boutique Amina", "user_id": "u1" }]));
        });

        let card = directory(&server).card_info("c1").await.unwrap().unwrap();
        assert_eq!(card.full_name.as_deref(), Some("Boutique Amina"));
        assert_eq!(card.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn server_errors_surface_as_request_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(500).body("boom");
        });

        let err = directory(&server).sender_name("u1").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Request(message) if message.contains("500")));
    }

    #[test]
    fn rejects_empty_config() {
        let err = RestDirectory::new(RestDirectoryConfig {
            base_url: " ".to_string(),
            api_key: "k".to_string(),
            timeout_ms: 10,
        })
        .err()
        .unwrap();
        assert!(matches!(err, DirectoryError::Config(_)));
    }
}
