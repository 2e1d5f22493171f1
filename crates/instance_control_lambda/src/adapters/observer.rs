use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Per-invocation sink for handler lifecycle events.
pub trait InvocationObserver: Send + Sync {
    fn info(&self, event: &str, details: Value);
    fn error(&self, event: &str, details: Value);
}

/// Emits each handler event as a structured `tracing` record.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    component: &'static str,
    request_id: String,
}

impl TracingObserver {
    pub fn new(component: &'static str, request_id: impl Into<String>) -> Self {
        Self {
            component,
            request_id: request_id.into(),
        }
    }
}

impl InvocationObserver for TracingObserver {
    fn info(&self, event: &str, details: Value) {
        tracing::info!(
            component = self.component,
            request_id = %self.request_id,
            event,
            details = %details,
            "{event}"
        );
    }

    fn error(&self, event: &str, details: Value) {
        tracing::error!(
            component = self.component,
            request_id = %self.request_id,
            event,
            details = %details,
            "{event}"
        );
    }
}

/// JSON lines on stdout for CloudWatch. The platform stamps time, so the
/// formatter omits it.
pub fn init_json_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .without_time()
                .with_target(false),
        )
        .init();
}
