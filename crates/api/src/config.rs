use vitals_core::{CoreError, Metric, ThresholdRange, ThresholdTable};
use vitals_store::firebase::DEFAULT_ALERT_COLLECTION;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for the monitor task, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
        }
    }
}

/// Where readings come from and alerts go to.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// Firebase Realtime Database over REST.
    Firebase {
        database_url: String,
        auth_token: Option<String>,
    },
    /// In-process store; readings stay absent unless written by code.
    Memory,
}

/// Vitals monitor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between the end of one cycle and the start of the next (default: `60`).
    pub poll_interval_secs: u64,
    /// Upper bound on a single metric fetch (default: `10`).
    pub fetch_timeout_secs: u64,
    pub thresholds: ThresholdTable,
    pub store: StoreBackend,
    /// Collection alerts are pushed to (default: `new_notifications`).
    pub alert_collection: String,
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                   |
    /// |------------------------------|---------------------------|
    /// | `STORE_BACKEND`              | `firebase`                |
    /// | `FIREBASE_DATABASE_URL`      | required for `firebase`   |
    /// | `FIREBASE_AUTH_TOKEN`        | unset                     |
    /// | `ALERT_COLLECTION`           | `new_notifications`       |
    /// | `POLL_INTERVAL_SECS`         | `60`                      |
    /// | `FETCH_TIMEOUT_SECS`         | `10`                      |
    /// | `THRESHOLD_<METRIC>_MIN/MAX` | built-in safe ranges      |
    ///
    /// Panics on invalid values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firebase".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "firebase" => StoreBackend::Firebase {
                database_url: std::env::var("FIREBASE_DATABASE_URL")
                    .expect("FIREBASE_DATABASE_URL must be set"),
                auth_token: std::env::var("FIREBASE_AUTH_TOKEN").ok(),
            },
            other => panic!("STORE_BACKEND must be 'firebase' or 'memory', got '{other}'"),
        };

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let fetch_timeout_secs: u64 = std::env::var("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("FETCH_TIMEOUT_SECS must be a valid u64");

        let thresholds = thresholds_from(|name| std::env::var(name).ok())
            .unwrap_or_else(|e| panic!("Invalid threshold configuration: {e}"));

        Self {
            poll_interval_secs,
            fetch_timeout_secs,
            thresholds,
            store,
            alert_collection: std::env::var("ALERT_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_ALERT_COLLECTION.to_string()),
        }
    }
}

/// Build the threshold table from `THRESHOLD_<METRIC>_MIN` / `_MAX` lookups,
/// falling back to the built-in range for any bound that is not set.
pub fn thresholds_from<F>(lookup: F) -> Result<ThresholdTable, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ThresholdTable::default();

    let range_for = |metric: Metric| -> Result<ThresholdRange, CoreError> {
        let default = defaults.get(metric);
        let bound = |suffix: &str, fallback: f64| -> Result<f64, CoreError> {
            let name = format!("THRESHOLD_{}_{suffix}", metric.env_key());
            match lookup(&name) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    CoreError::Validation(format!("{name} must be a number, got '{raw}'"))
                }),
                None => Ok(fallback),
            }
        };
        ThresholdRange::new(bound("MIN", default.min())?, bound("MAX", default.max())?)
    };

    Ok(ThresholdTable::new(
        range_for(Metric::Bpm)?,
        range_for(Metric::DegreeC)?,
        range_for(Metric::Spo2)?,
    ))
}
