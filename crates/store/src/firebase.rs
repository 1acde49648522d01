//! Firebase Realtime Database REST client.
//!
//! Readings live at `{base_url}/{metric}.json`; alerts are pushed to
//! `{base_url}/{collection}.json`, which answers with the generated key as
//! `{"name": "<id>"}`. When an auth token is configured it is sent as the
//! `auth` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use vitals_core::{Alert, Metric};

use crate::error::StoreError;
use crate::sink::AlertSink;
use crate::source::MetricSource;

/// HTTP request timeout for a single store call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Collection alerts are pushed to unless configured otherwise.
pub const DEFAULT_ALERT_COLLECTION: &str = "new_notifications";

/// Response body of a Realtime Database push (`POST`).
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// HTTP client for one Realtime Database instance.
#[derive(Clone)]
pub struct RealtimeDatabase {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RealtimeDatabase {
    /// Create a client for the database at `base_url`,
    /// e.g. `https://project-default-rtdb.firebaseio.com`.
    pub fn new(base_url: String, auth_token: Option<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url, auth_token))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    /// Handle for pushing alerts into `collection`.
    pub fn collection(&self, collection: impl Into<String>) -> AlertCollection {
        AlertCollection {
            db: self.clone(),
            collection: collection.into(),
        }
    }

    /// Absolute REST URL for a database path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    /// Ensure the response has a success status code, capturing the body
    /// for diagnostics otherwise.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MetricSource for RealtimeDatabase {
    async fn fetch(&self, metric: Metric) -> Result<Option<f64>, StoreError> {
        let request = self.authorize(self.client.get(self.url(metric.key())));
        let response = Self::ensure_success(request.send().await?).await?;
        let value: serde_json::Value = response.json().await?;

        tracing::debug!(metric = %metric, %value, "Fetched reading");
        parse_reading(metric.key(), value)
    }
}

/// Alert sink backed by a Realtime Database list.
#[derive(Clone)]
pub struct AlertCollection {
    db: RealtimeDatabase,
    collection: String,
}

impl AlertCollection {
    pub fn name(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl AlertSink for AlertCollection {
    async fn add(&self, alert: &Alert) -> Result<String, StoreError> {
        let request = self
            .db
            .authorize(self.db.client.post(self.db.url(&self.collection)))
            .json(alert);
        let response = RealtimeDatabase::ensure_success(request.send().await?).await?;

        let body: PushResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(body.name)
    }
}

/// Interpret the JSON stored at a metric key.
///
/// `null` is a missing reading; numbers are readings; anything else is a
/// data-shape error.
pub fn parse_reading(key: &str, value: serde_json::Value) -> Result<Option<f64>, StoreError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(reading) => Ok(Some(reading)),
            None => Err(StoreError::UnexpectedType {
                key: key.to_string(),
                value: serde_json::Value::Number(n),
            }),
        },
        other => Err(StoreError::UnexpectedType {
            key: key.to_string(),
            value: other,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn db(base: &str) -> RealtimeDatabase {
        RealtimeDatabase::new(base.to_string(), None).unwrap()
    }

    #[test]
    fn url_strips_trailing_slashes() {
        let db = db("https://vitals-default-rtdb.firebaseio.com/");
        assert_eq!(
            db.url("BPM"),
            "https://vitals-default-rtdb.firebaseio.com/BPM.json"
        );
        assert_eq!(
            db.url("/new_notifications/"),
            "https://vitals-default-rtdb.firebaseio.com/new_notifications.json"
        );
    }

    #[test]
    fn collection_keeps_its_name() {
        let sink = db("https://example.test").collection(DEFAULT_ALERT_COLLECTION);
        assert_eq!(sink.name(), "new_notifications");
    }

    #[test]
    fn auth_token_is_sent_as_query_parameter() {
        let db = RealtimeDatabase::new("https://example.test".into(), Some("s3cret".into()))
            .unwrap();
        let request = db.authorize(db.client.get(db.url("Spo2"))).build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://example.test/Spo2.json?auth=s3cret"
        );
    }

    #[test]
    fn parses_numbers_and_null() {
        assert_eq!(parse_reading("BPM", json!(72)).unwrap(), Some(72.0));
        assert_eq!(parse_reading("DegreeC", json!(38.7)).unwrap(), Some(38.7));
        assert_eq!(parse_reading("Spo2", json!(null)).unwrap(), None);
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_matches!(
            parse_reading("BPM", json!("fast")),
            Err(StoreError::UnexpectedType { ref key, .. }) if key == "BPM"
        );
        assert_matches!(
            parse_reading("BPM", json!({ "value": 1 })),
            Err(StoreError::UnexpectedType { .. })
        );
    }

    #[test]
    fn store_error_display_http_status() {
        let err = StoreError::HttpStatus {
            status: 401,
            body: "Permission denied".into(),
        };
        assert_eq!(err.to_string(), "Store returned HTTP 401: Permission denied");
    }
}
