//! Process-wide default bus.
//!
//! Convenience façade over a lazily created [`Bus`] shared by the whole
//! process. Library code that wants an isolated subscription set should own
//! its own [`Bus`] instead; the default instance exists for application
//! wiring where one bus per process is the point.

use once_cell::sync::Lazy;
use serde_json::Value;

use super::core::{Bus, OnceToken, PublishHandle};
use crate::ids::SubscriptionId;
use crate::pattern::PatternError;

static DEFAULT_BUS: Lazy<Bus> = Lazy::new(Bus::new);

/// The process-wide default bus.
pub fn default_bus() -> &'static Bus {
    &DEFAULT_BUS
}

/// [`Bus::subscribe`] on the default bus.
pub fn subscribe<F>(pattern: &str, handler: F) -> Result<SubscriptionId, PatternError>
where
    F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
{
    default_bus().subscribe(pattern, handler)
}

/// [`Bus::subscribe_once`] on the default bus.
pub fn subscribe_once<F>(pattern: &str, handler: F) -> Result<SubscriptionId, PatternError>
where
    F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
{
    default_bus().subscribe_once(pattern, handler)
}

/// [`Bus::unsubscribe`] on the default bus.
pub fn unsubscribe(id: SubscriptionId) {
    default_bus().unsubscribe(id);
}

/// [`Bus::unsubscribe_matching`] on the default bus.
pub fn unsubscribe_matching(topic: &str) {
    default_bus().unsubscribe_matching(topic);
}

/// [`Bus::once`] on the default bus.
pub fn once(topic: &str) -> Result<OnceToken, PatternError> {
    default_bus().once(topic)
}

/// [`Bus::publish`] on the default bus.
pub fn publish(topic: &str, user_args: Option<Value>) -> PublishHandle {
    default_bus().publish(topic, user_args)
}

/// [`Bus::in_flight`] on the default bus.
pub fn in_flight() -> usize {
    default_bus().in_flight()
}

/// Drop every subscription on the default bus. For tests.
pub fn reset() {
    default_bus().reset();
}
