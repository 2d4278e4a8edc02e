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

use jiff::Timestamp;

use crate::config::default_config;
use crate::config::Config;
use crate::config::PartialConfig;
use crate::context::LogContext;
use crate::enrich::enrich;
use crate::entry::LogEntry;
use crate::entry::SourceMetadata;
use crate::level::LogLevel;
use crate::serialize::serialize;
use crate::sink::dispatch;
use crate::value::LogData;

/// The logging front end.
///
/// A logger snapshots its configuration at creation time: the process-wide
/// defaults (unless [detached](Logger::detached)), then the attached
/// [`LogContext`]'s configuration if any, then its own overrides, most
/// specific last. Cheap to clone and thread-safe.
///
/// # Examples
///
/// ```
/// use flowlog::{data, Logger, PartialConfig};
///
/// let logger = Logger::new(PartialConfig::default().tag("main"));
/// logger.i("Hello world!", data! { "players" => 3 })?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    config: Config,
    context: Option<LogContext>,
}

impl Logger {
    /// Creates a logger layered on the process-wide default configuration.
    pub fn new(config: PartialConfig) -> Self {
        Logger::create(Some(config), None, true)
    }

    /// Creates a logger that ignores the default configuration entirely.
    ///
    /// Without a sink of its own, such a logger sends entries nowhere.
    pub fn detached(config: PartialConfig) -> Self {
        Logger::create(Some(config), None, false)
    }

    pub(crate) fn create(
        config: Option<PartialConfig>,
        context: Option<LogContext>,
        inherit_default: bool,
    ) -> Logger {
        let mut partials: Vec<PartialConfig> = Vec::new();
        if inherit_default {
            partials.push(PartialConfig::from(&default_config()));
        }
        if let Some(context) = &context {
            partials.push(PartialConfig::from(context.config()));
        }
        if let Some(config) = config {
            partials.push(config);
        }
        let merged = Config::merge(partials.iter());
        // entries carry the context, so it must reflect the resolved config
        let context = context.map(|context| context.rebind(merged.clone()));
        Logger {
            config: merged,
            context,
        }
    }

    /// The resolved configuration this logger stamps on its entries.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The attached correlation context, if any.
    pub fn context(&self) -> Option<&LogContext> {
        self.context.as_ref()
    }

    /// A derived logger with `config` merged on top of this one's.
    ///
    /// Note the tag is not carried over; set it again on `config` if the
    /// derived logger should keep it.
    pub fn with_config(&self, config: PartialConfig) -> Logger {
        let merged = Config::merge([&PartialConfig::from(&self.config), &config]);
        let context = self
            .context
            .as_ref()
            .map(|context| context.rebind(merged.clone()));
        Logger {
            config: merged,
            context,
        }
    }

    /// A derived logger with a different minimum level.
    pub fn with_min_level(&self, level: LogLevel) -> Logger {
        self.with_config(PartialConfig::default().min_level(level))
    }

    /// A derived logger with a different tag.
    pub fn with_tag(&self, tag: impl Into<String>) -> Logger {
        self.with_config(PartialConfig::default().tag(tag))
    }

    /// A logger bound to `context`, re-resolving configuration so the
    /// context's settings slot in under this logger's own overrides.
    pub fn with_context(&self, context: &LogContext) -> Logger {
        Logger::create(
            Some(PartialConfig::from(&self.config)),
            Some(context.clone()),
            false,
        )
    }

    /// Creates and routes one entry.
    ///
    /// Entries below the minimum level are dropped, unless this logger has a
    /// context and `context_bypass` is set, in which case they are buffered
    /// for retroactive delivery should the flow be flagged. At or above the
    /// threshold, a `Warning` or worse flags the flow; the entry is then
    /// buffered when `suspend_context` is set and dispatched to the sinks
    /// otherwise.
    ///
    /// Errors surface only from sinks that run inline; buffered entries
    /// report sink failures from [`LogContext::stop`] instead.
    #[track_caller]
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        data: LogData,
    ) -> anyhow::Result<()> {
        let source_metadata = SourceMetadata::capture();

        let mut is_override = false;
        if level < self.config.min_level {
            if self.context.is_none() || !self.config.context_bypass {
                return Ok(());
            }
            is_override = true;
        }
        let is_flag = self.context.is_some() && level >= LogLevel::Warning;

        let encoded_data = serialize(&self.config.serialization, &data);
        let entry = LogEntry {
            level,
            message: message.into(),
            data,
            encoded_data,
            config: self.config.clone(),
            context: self.context.clone(),
            timestamp: Timestamp::now().as_millisecond(),
            source_metadata,
        };

        let enrichers = entry.config.enrichers.clone();
        let entry = enrich(entry, &enrichers);

        // enrichers may detach the context, opting the entry out of buffering
        if is_override {
            if let Some(context) = entry.context.clone() {
                context.manager().save(entry, &context);
            }
            return Ok(());
        }

        if is_flag {
            if let Some(context) = entry.context.clone() {
                context.manager().flag(&entry);
            }
        }

        if entry.config.suspend_context {
            if let Some(context) = entry.context.clone() {
                context.manager().push(entry, &context);
                return Ok(());
            }
        }

        dispatch(&entry, &entry.config.sinks)
    }

    /// Logs at [`LogLevel::Verbose`].
    #[track_caller]
    pub fn verbose(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Verbose, message, data)
    }

    /// Shorthand for [`verbose`](Logger::verbose).
    #[track_caller]
    pub fn v(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Verbose, message, data)
    }

    /// Logs at [`LogLevel::Debug`].
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Debug, message, data)
    }

    /// Shorthand for [`debug`](Logger::debug).
    #[track_caller]
    pub fn d(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Debug, message, data)
    }

    /// Logs at [`LogLevel::Info`].
    #[track_caller]
    pub fn info(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Info, message, data)
    }

    /// Shorthand for [`info`](Logger::info).
    #[track_caller]
    pub fn i(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Info, message, data)
    }

    /// Logs at [`LogLevel::Warning`].
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Warning, message, data)
    }

    /// Shorthand for [`warning`](Logger::warning).
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Warning, message, data)
    }

    /// Shorthand for [`warning`](Logger::warning).
    #[track_caller]
    pub fn w(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Warning, message, data)
    }

    /// Logs at [`LogLevel::Error`].
    #[track_caller]
    pub fn error(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Error, message, data)
    }

    /// Shorthand for [`error`](Logger::error).
    #[track_caller]
    pub fn e(&self, message: impl Into<String>, data: LogData) -> anyhow::Result<()> {
        self.log(LogLevel::Error, message, data)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(PartialConfig::default())
    }
}
