use may::coroutine;
use may::sync::mpsc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::ids::SubscriptionId;
use crate::merge::deep_merge;
use crate::pattern::{normalize_path, ParamVec, PathMatcher, PatternError, WildcardVec};
use crate::runtime_config::RuntimeConfig;
use crate::sink::{ErrorSink, TracingSink};

/// Boxed handler callable. Runs on its own coroutine per delivery; an `Err`
/// return is reported to the error sink and swallowed.
pub type Handler = Arc<dyn Fn(Value) -> anyhow::Result<()> + Send + Sync>;

/// Captures memoized per subscription and topic.
#[derive(Debug, Clone)]
struct MatchCapture {
    params: ParamVec,
    wildcards: WildcardVec,
}

/// One registered subscription: a compiled pattern paired with a handler.
struct Subscription {
    id: SubscriptionId,
    pattern: String,
    matcher: PathMatcher,
    handler: Handler,
    once: bool,
    /// Cleared by unsubscribe, and claimed by the first publication to fire
    /// a `once` subscription. A cleared subscription is never selected.
    active: AtomicBool,
    /// Successful match captures keyed by normalized topic. Unbounded; the
    /// topic cardinality of an in-process bus is the bound in practice.
    memo: Mutex<HashMap<String, MatchCapture>>,
}

impl Subscription {
    /// Match `topic` through the per-topic memo.
    ///
    /// Only successful matches are cached; a topic this pattern does not
    /// match is re-tested on every publication.
    fn captured(&self, topic: &str) -> Option<MatchCapture> {
        {
            let memo = self.memo.lock().unwrap();
            if let Some(hit) = memo.get(topic) {
                return Some(hit.clone());
            }
        }
        let result = self.matcher.match_path(topic);
        if !result.matched {
            return None;
        }
        let capture = MatchCapture {
            params: result.params,
            wildcards: result.wildcards,
        };
        self.memo
            .lock()
            .unwrap()
            .insert(topic.to_string(), capture.clone());
        Some(capture)
    }
}

struct BusInner {
    subscriptions: RwLock<Vec<Arc<Subscription>>>,
    in_flight: AtomicUsize,
    sink: RwLock<Arc<dyn ErrorSink>>,
    stack_size: usize,
}

impl BusInner {
    fn remove(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write().unwrap();
        if let Some(pos) = subs.iter().position(|s| s.id == id) {
            subs.remove(pos);
        }
    }
}

/// Completion of a `publish` call.
///
/// The publication is already running when the handle is returned;
/// [`wait`](PublishHandle::wait) blocks until every selected handler has
/// settled. Dropping the handle detaches the publication.
pub struct PublishHandle {
    join: Option<coroutine::JoinHandle<()>>,
}

impl PublishHandle {
    /// Block until all handlers of this publication have settled.
    pub fn wait(self) {
        if let Some(join) = self.join {
            let _ = join.join();
        }
    }
}

/// Single-shot completion token returned by [`Bus::once`].
///
/// Resolves with the merged args of the next publication matching the
/// topic. A token created after a publication does not observe it.
pub struct OnceToken {
    id: SubscriptionId,
    rx: mpsc::Receiver<Value>,
}

impl OnceToken {
    /// The id of the backing subscription, usable with [`Bus::unsubscribe`].
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Block until the next matching publication delivers, returning its
    /// merged args. Returns `None` if the backing subscription was removed
    /// without ever firing.
    pub fn wait(self) -> Option<Value> {
        self.rx.recv().ok()
    }
}

/// In-process publish/subscribe bus with path-pattern topic routing.
///
/// Cloning is cheap and shares the same subscription set and in-flight
/// counter. A process-wide default instance lives in [`crate::bus::global`].
///
/// # Example
///
/// ```rust,ignore
/// use pathbus::Bus;
/// use serde_json::json;
///
/// let bus = Bus::new();
/// bus.subscribe("/order/:status/:item", |args| {
///     println!("order event: {args}");
///     Ok(())
/// })?;
/// bus.publish("/order/created/book", Some(json!({"qty": 1}))).wait();
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Create a bus configured from the environment
    /// (see [`RuntimeConfig::from_env`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    /// Create a bus with an explicit runtime configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Bus {
            inner: Arc::new(BusInner {
                subscriptions: RwLock::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                sink: RwLock::new(Arc::new(TracingSink)),
                stack_size: config.stack_size,
            }),
        }
    }

    /// Replace the sink that receives handler failures.
    pub fn set_error_sink(&self, sink: Arc<dyn ErrorSink>) {
        *self.inner.sink.write().unwrap() = sink;
    }

    /// Register a handler for every publication matching `pattern`.
    ///
    /// Compiles the pattern synchronously; malformed patterns fail here.
    /// Subscribing the same handler to the same pattern twice creates two
    /// independent subscriptions, each fired once per matching publication.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> Result<SubscriptionId, PatternError>
    where
        F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(pattern, Arc::new(handler), false)
    }

    /// Like [`subscribe`](Bus::subscribe), but the subscription is removed
    /// after its first delivery.
    pub fn subscribe_once<F>(
        &self,
        pattern: &str,
        handler: F,
    ) -> Result<SubscriptionId, PatternError>
    where
        F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(pattern, Arc::new(handler), true)
    }

    fn register(
        &self,
        pattern: &str,
        handler: Handler,
        once: bool,
    ) -> Result<SubscriptionId, PatternError> {
        let matcher = PathMatcher::new(pattern)?;
        let subscription = Arc::new(Subscription {
            id: SubscriptionId::new(),
            pattern: pattern.to_string(),
            matcher,
            handler,
            once,
            active: AtomicBool::new(true),
            memo: Mutex::new(HashMap::new()),
        });
        let id = subscription.id;

        let mut subs = self.inner.subscriptions.write().unwrap();
        subs.push(subscription);
        info!(
            subscription_id = %id,
            pattern = %pattern,
            once = once,
            total_subscriptions = subs.len(),
            "Subscription registered"
        );
        Ok(id)
    }

    /// Remove a subscription by handle. Idempotent; unknown handles are a
    /// silent no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.inner.subscriptions.write().unwrap();
        if let Some(pos) = subs.iter().position(|s| s.id == id) {
            subs[pos].active.store(false, Ordering::SeqCst);
            subs.remove(pos);
            debug!(subscription_id = %id, "Subscription removed");
        }
    }

    /// Remove every subscription whose compiled pattern matches `topic` as
    /// if it were a published topic.
    ///
    /// Handlers already selected by an in-flight publication keep running.
    pub fn unsubscribe_matching(&self, topic: &str) {
        let mut subs = self.inner.subscriptions.write().unwrap();
        let before = subs.len();
        subs.retain(|sub| {
            let matched = sub.matcher.match_path(topic).matched;
            if matched {
                sub.active.store(false, Ordering::SeqCst);
            }
            !matched
        });
        debug!(
            topic = %topic,
            removed = before - subs.len(),
            "Subscriptions removed by topic"
        );
    }

    /// Register a single-shot subscription and return a token that resolves
    /// with the merged args of the next matching publication.
    pub fn once(&self, topic: &str) -> Result<OnceToken, PatternError> {
        let (tx, rx) = mpsc::channel::<Value>();
        let tx = Mutex::new(tx);
        let id = self.register(
            topic,
            Arc::new(move |args: Value| {
                let _ = tx.lock().unwrap().send(args);
                Ok(())
            }),
            true,
        )?;
        Ok(OnceToken { id, rx })
    }

    /// Publish `topic` to every matching subscriber.
    ///
    /// The in-flight counter is incremented and the subscription snapshot
    /// is frozen before this call returns, so a subscriber registered after
    /// `publish` returns never observes the publication. Handlers then run
    /// concurrently on their own coroutines; their failures are reported to
    /// the error sink and never surface here. The returned handle completes
    /// once every handler has settled.
    pub fn publish(&self, topic: &str, user_args: Option<Value>) -> PublishHandle {
        let inner = self.inner.clone();

        // Counter and snapshot move together, before any suspension point:
        // an observer reading in_flight right after this call sees the
        // increment, and later subscribers are invisible to this dispatch.
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let snapshot: Vec<Arc<Subscription>> = inner.subscriptions.read().unwrap().clone();

        let topic = topic.to_string();
        let stack_size = inner.stack_size;
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || dispatch(inner, snapshot, topic, user_args))
        };

        match spawn_result {
            Ok(join) => PublishHandle { join: Some(join) },
            Err(e) => {
                error!(error = %e, "Failed to spawn dispatch coroutine - CRITICAL");
                self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
                PublishHandle { join: None }
            }
        }
    }

    /// Number of `publish` calls currently between start and completion.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().unwrap().len()
    }

    /// Print all registered subscriptions to stdout.
    ///
    /// Useful for debugging and verifying that subscriptions are registered
    /// correctly.
    pub fn dump_subscriptions(&self) {
        let subs = self.inner.subscriptions.read().unwrap();
        println!("[subscriptions] count={}", subs.len());
        for sub in subs.iter() {
            println!(
                "[subscription] {} {} once={}",
                sub.id, sub.pattern, sub.once
            );
        }
    }

    /// Drop every subscription. Intended for tests that share a
    /// process-wide bus.
    pub fn reset(&self) {
        let mut subs = self.inner.subscriptions.write().unwrap();
        for sub in subs.iter() {
            sub.active.store(false, Ordering::SeqCst);
        }
        subs.clear();
    }
}

/// Body of the dispatch coroutine: select, fan out, settle, decrement.
fn dispatch(
    inner: Arc<BusInner>,
    snapshot: Vec<Arc<Subscription>>,
    topic: String,
    user_args: Option<Value>,
) {
    // Cooperative tick: the publisher's synchronous continuation runs to
    // completion before any matching or delivery happens.
    coroutine::yield_now();

    let normalized = normalize_path(&topic);

    let mut selected: Vec<(Arc<Subscription>, MatchCapture)> = Vec::new();
    for sub in snapshot {
        if !sub.active.load(Ordering::SeqCst) {
            continue;
        }
        let Some(capture) = sub.captured(&normalized) else {
            continue;
        };
        if sub.once {
            // Claim the single shot; a concurrent publication may have won.
            if !sub.active.swap(false, Ordering::SeqCst) {
                continue;
            }
            inner.remove(sub.id);
        }
        selected.push((sub, capture));
    }

    debug!(
        topic = %normalized,
        matched = selected.len(),
        "Publication matched"
    );

    let mut joins = Vec::with_capacity(selected.len());
    for (sub, capture) in selected {
        // One tick per handler: deliveries interleave instead of running in
        // the selection loop's own time slice.
        coroutine::yield_now();

        let args = compose_args(&normalized, user_args.as_ref(), &capture);
        let handler = sub.handler.clone();
        let sink = inner.sink.read().unwrap().clone();
        let subscription_id = sub.id;
        let handler_topic = normalized.clone();

        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(inner.stack_size)
                .spawn(move || {
                    let execution_start = Instant::now();
                    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| handler(args)));
                    match outcome {
                        Ok(Ok(())) => {
                            debug!(
                                topic = %handler_topic,
                                subscription_id = %subscription_id,
                                execution_time_ms =
                                    execution_start.elapsed().as_millis() as u64,
                                "Handler complete"
                            );
                        }
                        Ok(Err(err)) => {
                            sink.handler_failure(&handler_topic, subscription_id, &err);
                        }
                        Err(panic) => {
                            let err = anyhow::anyhow!("handler panicked: {panic:?}");
                            sink.handler_failure(&handler_topic, subscription_id, &err);
                        }
                    }
                })
        };

        match spawn_result {
            Ok(join) => joins.push(join),
            Err(e) => {
                error!(
                    subscription_id = %sub.id,
                    error = %e,
                    "Failed to spawn handler coroutine - CRITICAL"
                );
            }
        }
    }

    // A publication completes when all its handlers settle, success or not.
    for join in joins {
        let _ = join.join();
    }
    inner.in_flight.fetch_sub(1, Ordering::SeqCst);
}

/// Build the args delivered to one handler.
///
/// Precedence, lowest to highest: caller-supplied args, captured named
/// params, then the reserved keys `_` (wildcards) and `topic`.
fn compose_args(topic: &str, user_args: Option<&Value>, capture: &MatchCapture) -> Value {
    let base = user_args
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let mut params = Map::new();
    for (name, value) in &capture.params {
        params.insert(name.to_string(), value.to_json());
    }

    let mut reserved = Map::new();
    reserved.insert(
        "_".to_string(),
        Value::Array(capture.wildcards.iter().cloned().map(Into::into).collect()),
    );
    reserved.insert("topic".to_string(), Value::String(topic.to_string()));

    let merged = deep_merge(&base, &Value::Object(params));
    deep_merge(&merged, &Value::Object(reserved))
}
