//! Outbound notification channels for vitals alerts.
//!
//! - [`Notifier`]: the seam the monitor calls once per alert.
//! - [`delivery::sms`]: SMS gateway delivery (notify.lk compatible).

pub mod delivery;

pub use delivery::sms::{SmsConfig, SmsDelivery, SmsError};
pub use delivery::{Notifier, NotifyError};
