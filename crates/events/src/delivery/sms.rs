//! SMS delivery through an HTTP gateway.
//!
//! [`SmsDelivery`] sends one `GET` request per message with the gateway's
//! credentials as query parameters (`user_id`, `api_key`, `sender_id`, `to`,
//! `message`). The recipient's leading digit is replaced by the configured
//! country code before sending. There is no retry.

use std::time::Duration;

use async_trait::async_trait;
use vitals_core::Alert;

use super::{Notifier, NotifyError};

/// HTTP request timeout for a single gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default gateway endpoint.
pub const DEFAULT_SMS_API_URL: &str = "https://app.notify.lk/api/v1/send";

/// Default sender id shown to recipients.
pub const DEFAULT_SENDER_ID: &str = "NotifyDEMO";

/// Default country code replacing the leading trunk digit.
pub const DEFAULT_COUNTRY_CODE: &str = "94";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for SMS delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("SMS gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The recipient number cannot be normalized.
    #[error("Invalid mobile number: '{0}'")]
    InvalidNumber(String),
}

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMS gateway.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_url: String,
    pub user_id: String,
    pub api_key: String,
    pub sender_id: String,
    /// Local-format number that receives every alert, e.g. `0712345678`.
    pub recipient: String,
    pub country_code: String,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `SMS_ENABLED` is `true` (or `1`) and all
    /// required variables are present; SMS delivery is then skipped.
    ///
    /// | Variable           | Required | Default                             |
    /// |--------------------|----------|-------------------------------------|
    /// | `SMS_ENABLED`      | no       | `false`                             |
    /// | `SMS_API_URL`      | no       | `https://app.notify.lk/api/v1/send` |
    /// | `SMS_USER_ID`      | yes      | none                                |
    /// | `SMS_API_KEY`      | yes      | none                                |
    /// | `SMS_SENDER_ID`    | no       | `NotifyDEMO`                        |
    /// | `SMS_RECIPIENT`    | yes      | none                                |
    /// | `SMS_COUNTRY_CODE` | no       | `94`                                |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("SMS_ENABLED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        let required = |name: &str| {
            let value = lookup(name);
            if value.is_none() {
                tracing::warn!(var = name, "SMS enabled but variable is missing, SMS disabled");
            }
            value
        };

        Some(Self {
            api_url: lookup("SMS_API_URL").unwrap_or_else(|| DEFAULT_SMS_API_URL.to_string()),
            user_id: required("SMS_USER_ID")?,
            api_key: required("SMS_API_KEY")?,
            sender_id: lookup("SMS_SENDER_ID").unwrap_or_else(|| DEFAULT_SENDER_ID.to_string()),
            recipient: required("SMS_RECIPIENT")?,
            country_code: lookup("SMS_COUNTRY_CODE")
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
        })
    }
}

/// Replace the leading digit of a local number with `country_code`.
///
/// `0712345678` with `94` becomes `94712345678`.
pub fn normalize_mobile(mobile: &str, country_code: &str) -> Result<String, SmsError> {
    let mobile = mobile.trim();
    let mut chars = mobile.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() && !chars.as_str().is_empty() => {
            Ok(format!("{country_code}{}", chars.as_str()))
        }
        _ => Err(SmsError::InvalidNumber(mobile.to_string())),
    }
}

// ---------------------------------------------------------------------------
// SmsDelivery
// ---------------------------------------------------------------------------

/// Sends alert messages through the SMS gateway.
pub struct SmsDelivery {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsDelivery {
    /// Create a new delivery service with a pre-configured HTTP client.
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Send `message` to a local-format `mobile` number.
    ///
    /// Returns the gateway's JSON response body.
    pub async fn send(&self, mobile: &str, message: &str) -> Result<serde_json::Value, SmsError> {
        let request = self.build_request(mobile, message)?;
        let response = self.client.execute(request).await?;
        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        tracing::info!(to = %mask(mobile), response = %body, "SMS sent");
        Ok(body)
    }

    fn build_request(&self, mobile: &str, message: &str) -> Result<reqwest::Request, SmsError> {
        let to = normalize_mobile(mobile, &self.config.country_code)?;
        let request = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("user_id", self.config.user_id.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("sender_id", self.config.sender_id.as_str()),
                ("to", to.as_str()),
                ("message", message),
            ])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl Notifier for SmsDelivery {
    fn channel(&self) -> &'static str {
        "sms"
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.send(&self.config.recipient, &alert.message).await?;
        Ok(())
    }
}

/// Keep only the last three digits of a number for log output.
fn mask(mobile: &str) -> String {
    let digits: Vec<char> = mobile.chars().collect();
    let visible = digits.len().min(3);
    let tail: String = digits[digits.len() - visible..].iter().collect();
    format!("{}{tail}", "*".repeat(digits.len() - visible))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use serde_json::json;
    use vitals_core::{Metric, Snapshot, ThresholdTable};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config() -> SmsConfig {
        SmsConfig {
            api_url: "https://sms.example.test/api/v1/send".into(),
            user_id: "1001".into(),
            api_key: "key".into(),
            sender_id: "Vitals".into(),
            recipient: "0712345678".into(),
            country_code: DEFAULT_COUNTRY_CODE.into(),
        }
    }

    #[test]
    fn normalize_replaces_leading_digit() {
        assert_eq!(normalize_mobile("0712345678", "94").unwrap(), "94712345678");
        assert_eq!(normalize_mobile(" 0712345678 ", "44").unwrap(), "44712345678");
    }

    #[test]
    fn normalize_rejects_empty_or_non_numeric() {
        assert_matches!(normalize_mobile("", "94"), Err(SmsError::InvalidNumber(_)));
        assert_matches!(normalize_mobile("0", "94"), Err(SmsError::InvalidNumber(_)));
        assert_matches!(
            normalize_mobile("+94712345678", "94"),
            Err(SmsError::InvalidNumber(_))
        );
    }

    #[test]
    fn request_carries_gateway_parameters() {
        let delivery = SmsDelivery::new(config()).unwrap();
        let request = delivery
            .build_request("0712345678", "BPM Alert!")
            .unwrap();

        assert_eq!(*request.method(), reqwest::Method::GET);
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("to".into(), "94712345678".into())));
        assert!(pairs.contains(&("sender_id".into(), "Vitals".into())));
        assert!(pairs.contains(&("message".into(), "BPM Alert!".into())));
        assert!(pairs.contains(&("user_id".into(), "1001".into())));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_any_request() {
        let delivery = SmsDelivery::new(config()).unwrap();
        assert_matches!(
            delivery.send("not-a-number", "hello").await,
            Err(SmsError::InvalidNumber(_))
        );
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn config_is_none_unless_enabled() {
        assert!(SmsConfig::from_lookup(lookup(&[])).is_none());
        assert!(SmsConfig::from_lookup(lookup(&[
            ("SMS_ENABLED", "false"),
            ("SMS_USER_ID", "1001"),
            ("SMS_API_KEY", "key"),
            ("SMS_RECIPIENT", "0712345678"),
        ]))
        .is_none());
    }

    #[test]
    fn config_is_none_when_a_required_variable_is_missing() {
        let config = SmsConfig::from_lookup(lookup(&[
            ("SMS_ENABLED", "true"),
            ("SMS_USER_ID", "1001"),
            ("SMS_RECIPIENT", "0712345678"),
        ]));
        assert!(config.is_none());
    }

    #[test]
    fn config_applies_defaults() {
        let config = SmsConfig::from_lookup(lookup(&[
            ("SMS_ENABLED", "1"),
            ("SMS_USER_ID", "1001"),
            ("SMS_API_KEY", "key"),
            ("SMS_RECIPIENT", "0712345678"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, DEFAULT_SMS_API_URL);
        assert_eq!(config.sender_id, DEFAULT_SENDER_ID);
        assert_eq!(config.country_code, DEFAULT_COUNTRY_CODE);
        assert_eq!(config.recipient, "0712345678");
    }

    async fn gateway(status: u16) -> (MockServer, SmsDelivery) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/send"))
            .and(query_param("to", "94712345678"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "status": "success" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let delivery = SmsDelivery::new(SmsConfig {
            api_url: format!("{}/api/v1/send", server.uri()),
            ..config()
        })
        .unwrap();
        (server, delivery)
    }

    #[tokio::test]
    async fn send_returns_gateway_body_on_success() {
        let (_server, delivery) = gateway(200).await;
        let body = delivery.send("0712345678", "BPM Alert!").await.unwrap();
        assert_eq!(body, json!({ "status": "success" }));
    }

    #[tokio::test]
    async fn send_surfaces_gateway_error_status() {
        let (_server, delivery) = gateway(503).await;
        assert_matches!(
            delivery.send("0712345678", "BPM Alert!").await,
            Err(SmsError::HttpStatus(503))
        );
    }

    #[tokio::test]
    async fn notify_maps_gateway_error_status() {
        let (_server, delivery) = gateway(401).await;
        let alert = Alert::out_of_range(
            Metric::Bpm,
            120.0,
            ThresholdTable::default().get(Metric::Bpm),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Snapshot::new(),
        );
        assert_matches!(
            delivery.notify(&alert).await,
            Err(NotifyError::Sms(SmsError::HttpStatus(401)))
        );
    }

    #[test]
    fn mask_hides_all_but_last_digits() {
        assert_eq!(mask("0712345678"), "*******678");
        assert_eq!(mask("12"), "12");
    }

    #[test]
    fn sms_error_display_http_status() {
        let err = SmsError::HttpStatus(503);
        assert_eq!(err.to_string(), "SMS gateway returned HTTP 503");
    }
}
