// Tracing log adapter - Structured logging using tracing crate

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::ports::*;

/// Tracing log adapter
///
/// Subscriber setup lives in `utils::logging`; this adapter only emits.
#[derive(Debug, Clone)]
pub struct TracingLogAdapter {
    min_level: LogLevel,
}

impl TracingLogAdapter {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn render_context(event: &LogEvent) -> String {
        event
            .context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TracingLogAdapter {
    fn default() -> Self {
        Self::new(LogLevel::Trace)
    }
}

#[async_trait]
impl LogPort for TracingLogAdapter {
    async fn warn(&self, message: &str) {
        if self.should_log(LogLevel::Warn) {
            warn!("{}", message);
        }
    }

    async fn debug(&self, message: &str) {
        if self.should_log(LogLevel::Debug) {
            debug!("{}", message);
        }
    }

    async fn log_event(&self, event: &LogEvent) {
        if !self.should_log(event.level) {
            return;
        }

        let run_id = event.context.get("run_id").map(String::as_str).unwrap_or("-");
        let state = event.context.get("state").map(String::as_str).unwrap_or("-");
        let context = Self::render_context(event);

        match event.level {
            LogLevel::Error => error!(run_id, state, context = %context, "{}", event.message),
            LogLevel::Warn => warn!(run_id, state, context = %context, "{}", event.message),
            LogLevel::Info => info!(run_id, state, context = %context, "{}", event.message),
            LogLevel::Debug => debug!(run_id, state, context = %context, "{}", event.message),
            LogLevel::Trace => {
                tracing::trace!(run_id, state, context = %context, "{}", event.message)
            }
        }
    }
}
