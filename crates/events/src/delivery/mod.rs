//! External delivery channels for alerts.

pub mod sms;

use async_trait::async_trait;
use vitals_core::Alert;

/// Error returned by any [`Notifier`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Sms(#[from] sms::SmsError),

    #[error("Notification failed: {0}")]
    Other(String),
}

/// Pushes an alert to a person outside the platform.
///
/// Calls are best-effort: the caller logs failures and never retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in log fields.
    fn channel(&self) -> &'static str;

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}
