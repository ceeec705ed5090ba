//! Notification adapters.
//!
//! - `ToastCenter` - In-memory toast list with broadcast subscribers
//! - `TracingNotificationSink` - Logs toasts; for headless use

mod toast_center;
mod tracing_sink;

pub use toast_center::ToastCenter;
pub use tracing_sink::TracingNotificationSink;
