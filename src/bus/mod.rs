//! # Bus Module
//!
//! Coroutine-based publish/subscribe dispatch.
//!
//! ## Overview
//!
//! The bus is the concurrent heart of the crate. It:
//! - Maintains a registry of pattern subscriptions
//! - Fans each publication out to every matching handler
//! - Tracks in-flight publications through an observable counter
//! - Catches handler failures so one subscriber cannot break another
//!
//! ## Architecture
//!
//! The bus uses the `may` coroutine runtime for concurrency:
//!
//! - Each `publish` call freezes a subscription snapshot synchronously,
//!   then runs matching and delivery on a dispatch coroutine
//! - Each selected handler runs in its own coroutine (lightweight thread)
//! - Handler panics and `Err` returns are caught and reported to a
//!   pluggable [`ErrorSink`](crate::sink::ErrorSink)
//! - Stack size is configurable via the `PATHBUS_STACK_SIZE` environment
//!   variable
//!
//! ## Publication Flow
//!
//! 1. Caller invokes `publish(topic, args)` → in-flight counter increments,
//!    snapshot is frozen, handle returned
//! 2. Dispatch coroutine yields once, then matches the topic against each
//!    snapshotted subscription through its per-topic memo
//! 3. One more yield per matched subscription, then its handler is invoked
//!    with the deep-merged args
//! 4. `once` subscriptions are removed after their first delivery
//! 5. The publication completes when every handler has settled
//!
//! ## Delivery Guarantees
//!
//! - Subscribers registered before `publish` returns are delivered to;
//!   later ones are not
//! - Unsubscribes during delivery do not cancel already-selected handlers
//! - No relative ordering across the handlers of one publication
//! - No retries, no timeouts: a failed handler is logged and the
//!   publication moves on

mod core;
pub mod global;

pub use core::{Bus, Handler, OnceToken, PublishHandle};
