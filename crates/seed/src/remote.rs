use std::time::Duration;

use panscan_core::{Dataset, SeedConfig};
use reqwest::StatusCode;
use serde::Serialize;

use crate::SeedError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SeedRow<'a> {
    pan_number: &'a str,
    full_name: &'a str,
}

/// Upserts extracted records into a PostgREST-style table endpoint.
pub struct RemoteSeeder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RemoteSeeder {
    pub fn new(base_url: &str, table: &str, api_key: impl Into<String>) -> Result<Self, SeedError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{table}", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    /// Build from config. The API key is read from the environment variable
    /// named by `api_key_env`.
    pub fn from_config(config: &SeedConfig) -> Result<Self, SeedError> {
        let url = config.remote_url.as_deref().ok_or(SeedError::MissingUrl)?;
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SeedError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(url, &config.remote_table, api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send all records in one request; duplicates are merged remotely.
    /// Returns the number of records sent.
    pub async fn upsert(&self, dataset: &Dataset) -> Result<usize, SeedError> {
        if dataset.is_empty() {
            tracing::warn!("No records to seed");
            return Ok(0);
        }

        let rows: Vec<SeedRow<'_>> = dataset
            .iter()
            .map(|r| SeedRow { pan_number: r.identifier(), full_name: r.name() })
            .collect();

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(SeedError::Rejected { status: status.as_u16(), body });
        }

        tracing::info!("Inserted/updated {} records at {}", rows.len(), self.endpoint);
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use panscan_core::ExtractionRecord;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, HeaderMap, serde_json::Value)>>>;

    async fn spawn_server(status: axum::http::StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let state = Arc::clone(&captured);
        let app = Router::new().route(
            "/rest/v1/{table}",
            post(move |Path(table): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let state = Arc::clone(&state);
                async move {
                    state.lock().unwrap().push((table, headers, body));
                    (status, "duplicate key")
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), captured)
    }

    fn dataset() -> Dataset {
        [
            ExtractionRecord::new("ABCPE1234F", "JOHN DOE", "a.jpg").unwrap(),
            ExtractionRecord::new("PQRST6789Z", "", "b.jpg").unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn upsert_posts_rows_with_headers() {
        let (url, captured) = spawn_server(axum::http::StatusCode::CREATED).await;
        let seeder = RemoteSeeder::new(&format!("{url}/"), "pan_users", "secret").unwrap();

        assert_eq!(seeder.upsert(&dataset()).await.unwrap(), 2);

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (table, headers, body) = &calls[0];
        assert_eq!(table, "pan_users");
        assert_eq!(headers["apikey"], "secret");
        assert_eq!(headers["authorization"], "Bearer secret");
        assert_eq!(headers["prefer"], "resolution=merge-duplicates");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(
            body,
            &serde_json::json!([
                {"pan_number": "ABCPE1234F", "full_name": "JOHN DOE"},
                {"pan_number": "PQRST6789Z", "full_name": ""}
            ])
        );
    }

    #[tokio::test]
    async fn rejection_carries_status_and_body() {
        let (url, _) = spawn_server(axum::http::StatusCode::CONFLICT).await;
        let seeder = RemoteSeeder::new(&url, "pan_users", "secret").unwrap();

        match seeder.upsert(&dataset()).await {
            Err(SeedError::Rejected { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "duplicate key");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_dataset_sends_nothing() {
        let (url, captured) = spawn_server(axum::http::StatusCode::OK).await;
        let seeder = RemoteSeeder::new(&url, "pan_users", "secret").unwrap();

        assert_eq!(seeder.upsert(&Dataset::new()).await.unwrap(), 0);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn config_requires_url_and_key() {
        let mut config = SeedConfig::default();
        assert!(matches!(RemoteSeeder::from_config(&config), Err(SeedError::MissingUrl)));

        config.remote_url = Some("https://db.example.org".into());
        config.api_key_env = "PANSCAN_TEST_KEY_THAT_IS_NEVER_SET".into();
        assert!(matches!(
            RemoteSeeder::from_config(&config),
            Err(SeedError::MissingApiKey(var)) if var == "PANSCAN_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn endpoint_joins_table() {
        let seeder = RemoteSeeder::new("https://db.example.org/", "pan_users", "k").unwrap();
        assert_eq!(seeder.endpoint(), "https://db.example.org/rest/v1/pan_users");
    }
}
