#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use vitals_api::config::ServerConfig;
use vitals_api::router::build_app;
use vitals_api::snapshot::SnapshotStore;
use vitals_api::state::AppState;
use vitals_core::Alert;
use vitals_events::{Notifier, NotifyError};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

/// Build the full application router around the given snapshot store.
pub fn build_test_app(snapshot: Arc<SnapshotStore>) -> Router {
    build_app(AppState {
        config: Arc::new(test_config()),
        snapshot,
    })
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Notifier that records every alert it is handed, optionally failing.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Alert>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.sent.lock().await.push(alert.clone());
        if self.fail {
            return Err(NotifyError::Other("gateway down".into()));
        }
        Ok(())
    }
}
