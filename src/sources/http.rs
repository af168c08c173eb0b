use crate::error::{SourceError, SourceResult};
use crate::models::{PropertyRecord, UserSummary};
use crate::sources::traits::{PropertySource, UserSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const PROPERTIES_SOURCE: &str = "properties";
const USERS_SOURCE: &str = "users";

/// Marketplace REST backend reached over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend client with the default 30 second timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, None, Duration::from_secs(30))
    }

    /// Create a backend client, optionally authenticating with a bearer token
    pub fn with_options(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("listing-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        source_name: &'static str,
    ) -> SourceResult<Vec<T>> {
        let url = self.endpoint(path);
        debug!("Fetching {} from {}", source_name, url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| SourceError::Request { source_name, error })?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", url, response.status());
            return Err(SourceError::Status {
                source_name,
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|error| SourceError::Request { source_name, error })?;

        debug!("Downloaded {} bytes of {}", body.len(), source_name);
        decode_collection(&body, source_name)
    }
}

/// The backend answers either with a bare array or wraps it in an object
#[derive(Deserialize)]
#[serde(untagged)]
enum Collection {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(alias = "properties", alias = "users", alias = "data")]
        items: Vec<Value>,
    },
}

/// Decode the envelope, then each row on its own so one malformed
/// document only costs that row.
pub(crate) fn decode_collection<T: DeserializeOwned>(
    body: &str,
    source_name: &'static str,
) -> SourceResult<Vec<T>> {
    let collection: Collection =
        serde_json::from_str(body).map_err(|error| SourceError::Decode { source_name, error })?;

    let rows = match collection {
        Collection::Bare(rows) | Collection::Wrapped { items: rows } => rows,
    };

    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed {} row {}: {}", source_name, index, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!("Kept {} of {} {} rows", decoded.len(), total, source_name);
    }
    Ok(decoded)
}

#[async_trait]
impl PropertySource for HttpBackend {
    async fn fetch_all_properties(&self) -> SourceResult<Vec<PropertyRecord>> {
        let mut properties: Vec<PropertyRecord> =
            self.get_collection("properties", PROPERTIES_SOURCE).await?;

        properties.retain(|p| match p.validate() {
            Ok(()) => true,
            Err(reason) => {
                warn!("Dropping malformed listing: {}", reason);
                false
            }
        });

        Ok(properties)
    }
}

#[async_trait]
impl UserSource for HttpBackend {
    async fn fetch_all_users(&self) -> SourceResult<Vec<UserSummary>> {
        self.get_collection("users/all", USERS_SOURCE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyStatus;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let backend = HttpBackend::new("http://localhost:5000/api/").unwrap();
        assert_eq!(backend.endpoint("properties"), "http://localhost:5000/api/properties");
        assert_eq!(backend.endpoint("/users/all"), "http://localhost:5000/api/users/all");
    }

    #[test]
    fn decodes_bare_array_and_envelopes() {
        let bare = r#"[{"_id": "u1", "name": "Asha"}]"#;
        let users: Vec<UserSummary> = decode_collection(bare, USERS_SOURCE).unwrap();
        assert_eq!(users[0].id, "u1");

        let wrapped = r#"{"users": [{"id": "u2", "name": "Ravi", "role": "agent"}]}"#;
        let users: Vec<UserSummary> = decode_collection(wrapped, USERS_SOURCE).unwrap();
        assert_eq!(users[0].name, "Ravi");

        let data = r#"{"data": [{
            "_id": "p1", "title": "Loft", "price": 12000,
            "features": {"status": "for-rent", "bedrooms": 1}
        }]}"#;
        let properties: Vec<PropertyRecord> = decode_collection(data, PROPERTIES_SOURCE).unwrap();
        assert_eq!(properties[0].features.status, PropertyStatus::ForRent);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let body = r#"{"properties": [
            {"_id": "ok", "title": "Loft", "price": 12000, "features": {"status": "for-rent"}},
            {"_id": "bad-status", "title": "Flat", "price": 9000, "features": {"status": "For Rent"}},
            {"_id": "no-title", "price": 9000, "features": {"status": "sold"}},
            {"_id": "string-price", "title": "Villa", "price": "lots", "features": {"status": "for-sale"}}
        ]}"#;

        let properties: Vec<PropertyRecord> = decode_collection(body, PROPERTIES_SOURCE).unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].id, "ok");
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        let err = decode_collection::<UserSummary>("<html>oops</html>", USERS_SOURCE).unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
        assert_eq!(err.source_name(), USERS_SOURCE);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        // Nothing listens on port 9 (discard) on test machines
        let backend =
            HttpBackend::with_options("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
        let err = backend.fetch_all_users().await.unwrap_err();
        assert!(matches!(err, SourceError::Request { .. }));
    }
}
