//! Shared test setup: coroutine stack size and tracing output.

use std::sync::Once;

static INIT: Once = Once::new();

/// Configure the may runtime and install a test tracing subscriber.
///
/// Call at the top of every test; repeated calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let size = std::env::var("PATHBUS_STACK_SIZE")
            .ok()
            .and_then(|v| {
                if let Some(hex) = v.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).ok()
                } else {
                    v.parse().ok()
                }
            })
            .unwrap_or(0x8000);
        may::config().set_stack_size(size);

        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
