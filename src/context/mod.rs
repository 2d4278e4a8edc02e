// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Correlation contexts tie the entries of one logical flow together.
//!
//! A [`LogContext`] carries a correlation id through a unit of work. Loggers
//! derived from it stamp that id on every entry, and the context can buffer
//! sub-threshold entries for retroactive delivery when the flow runs into
//! trouble. Call [`LogContext::stop`] exactly once when the flow finishes, or
//! let [`with_log_context`] do it for you.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use crate::config::Config;
use crate::config::PartialConfig;
use crate::logger::Logger;

mod manager;

pub(crate) use self::manager::global;
pub use self::manager::ContextManager;

/// A handle for one logical flow of work.
///
/// Cheap to clone; all clones share the same correlation id, buffered entries,
/// and liveness flag. A context must be stopped exactly once via [`stop`],
/// which flushes whatever its manager buffered for it. Using a stopped context
/// to derive loggers or siblings is a programming error and panics.
///
/// # Examples
///
/// ```
/// use flowlog::{data, LogContext, PartialConfig};
///
/// let context = LogContext::start(PartialConfig::default().tag("trade"));
/// let logger = context.logger(PartialConfig::default());
///
/// logger.i("trade opened", data! { "from" => 156, "to" => 2012 })?;
/// context.stop()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// [`stop`]: LogContext::stop
#[derive(Clone)]
pub struct LogContext {
    correlation_id: Arc<str>,
    config: Arc<Config>,
    dead: Arc<AtomicBool>,
    manager: Arc<ContextManager>,
}

impl LogContext {
    /// Starts a flow against the process-wide context manager.
    ///
    /// `config` is resolved against the built-in defaults only; the default
    /// configuration applies later, when loggers are derived, so changes to it
    /// between `start` and [`logger`](LogContext::logger) are still honored.
    pub fn start(config: PartialConfig) -> Self {
        LogContext::start_in(manager::global(), config)
    }

    /// Starts a flow against a caller-supplied manager.
    ///
    /// Buffered entries never cross managers, which makes this the way to keep
    /// tests from seeing each other's flows.
    pub fn start_in(manager: Arc<ContextManager>, config: PartialConfig) -> Self {
        let config = Config::merge([&config]);
        let correlation_id = match &config.correlation_generator {
            Some(generator) => generator(),
            None => default_correlation_id(),
        };
        LogContext {
            correlation_id: correlation_id.into(),
            config: Arc::new(config),
            dead: Arc::new(AtomicBool::new(false)),
            manager,
        }
    }

    /// The id stamped on every entry of this flow.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The configuration captured at [`start`](LogContext::start), after any
    /// sibling overrides.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether [`stop`](LogContext::stop) has run.
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    pub(crate) fn manager(&self) -> &Arc<ContextManager> {
        &self.manager
    }

    /// A sibling context: same correlation id and manager, with `config`
    /// merged on top.
    ///
    /// The sibling is independently live, so it needs its own
    /// [`stop`](LogContext::stop).
    ///
    /// # Panics
    ///
    /// Panics if this context is already stopped.
    pub fn with_config(&self, config: PartialConfig) -> LogContext {
        assert!(
            !self.is_dead(),
            "attempted to use a dead LogContext via `LogContext::with_config`"
        );
        let merged = Config::merge([&PartialConfig::from(&*self.config), &config]);
        LogContext {
            correlation_id: self.correlation_id.clone(),
            config: Arc::new(merged),
            dead: Arc::new(AtomicBool::new(false)),
            manager: self.manager.clone(),
        }
    }

    /// A logger bound to this context.
    ///
    /// Its configuration is the default configuration, then this context's,
    /// then `config`, most specific last.
    ///
    /// # Panics
    ///
    /// Panics if this context is already stopped.
    pub fn logger(&self, config: PartialConfig) -> Logger {
        assert!(
            !self.is_dead(),
            "attempted to use a dead LogContext via `LogContext::logger`"
        );
        Logger::create(Some(config), Some(self.clone()), true)
    }

    /// Ends the flow, flushing anything buffered for its correlation id.
    ///
    /// Idempotent: later calls (from this handle or any clone) do nothing and
    /// return `Ok`. Errors come from sinks failing during the flush.
    pub fn stop(&self) -> anyhow::Result<()> {
        if self.dead.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.manager.flush(&self.correlation_id)
    }

    /// A same-id context carrying `config`, used when a logger snapshots its
    /// resolved configuration. Shares the liveness flag so stopping any handle
    /// stops them all.
    pub(crate) fn rebind(&self, config: Config) -> LogContext {
        LogContext {
            correlation_id: self.correlation_id.clone(),
            config: Arc::new(config),
            dead: self.dead.clone(),
            manager: self.manager.clone(),
        }
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("correlation_id", &self.correlation_id)
            .field("config", &self.config)
            .field("dead", &self.is_dead())
            .finish_non_exhaustive()
    }
}

/// Timestamp-prefixed so ids sort roughly by start time in log storage.
fn default_correlation_id() -> String {
    format!("{}_{}", Timestamp::now().as_second(), Uuid::new_v4())
}

/// Runs `f` inside a fresh context, stopping it afterwards even on panic.
///
/// # Examples
///
/// ```
/// use flowlog::{data, with_log_context, PartialConfig};
///
/// with_log_context(PartialConfig::default().tag("checkout"), |context| {
///     let logger = context.logger(PartialConfig::default());
///     logger.i("cart settled", data! {})
/// })?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn with_log_context<R>(
    config: PartialConfig,
    f: impl FnOnce(&LogContext) -> anyhow::Result<R>,
) -> anyhow::Result<R> {
    with_log_context_in(manager::global(), config, f)
}

/// [`with_log_context`] against a caller-supplied manager.
pub fn with_log_context_in<R>(
    manager: Arc<ContextManager>,
    config: PartialConfig,
    f: impl FnOnce(&LogContext) -> anyhow::Result<R>,
) -> anyhow::Result<R> {
    let context = LogContext::start_in(manager, config);
    let guard = StopGuard {
        context: context.clone(),
    };
    let result = f(&context)?;
    std::mem::forget(guard);
    context.stop()?;
    Ok(result)
}

/// Stops the context when the closure unwinds or errors out.
struct StopGuard {
    context: LogContext,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        if let Err(error) = self.context.stop() {
            log::error!(
                "flowlog failed to flush context {}: {error:#}",
                self.context.correlation_id()
            );
        }
    }
}
