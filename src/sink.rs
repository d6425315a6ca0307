//! Pluggable sink for handler failures.
//!
//! A handler that returns an error or panics must never break the
//! publication that invoked it. The dispatcher catches the failure and
//! reports it here; the default sink logs through `tracing`.

use crate::ids::SubscriptionId;

/// Receives handler failures swallowed by the dispatcher.
///
/// Implementations must be cheap and must not panic; they run on the
/// handler's coroutine after the failure has been caught.
pub trait ErrorSink: Send + Sync {
    /// Called once per failed handler invocation.
    fn handler_failure(&self, topic: &str, subscription_id: SubscriptionId, error: &anyhow::Error);
}

/// Default sink: structured `tracing::error!` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn handler_failure(&self, topic: &str, subscription_id: SubscriptionId, error: &anyhow::Error) {
        tracing::error!(
            topic = %topic,
            subscription_id = %subscription_id,
            error = %error,
            "Handler failed"
        );
    }
}
