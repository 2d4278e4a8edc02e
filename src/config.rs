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

//! Configuration records and the merge rules that resolve them.

use std::fmt;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::enrich::Enricher;
use crate::level::LogLevel;
use crate::sink::Console;
use crate::sink::Sink;

/// A caller-supplied correlation id factory.
///
/// Must return values unique across concurrently live contexts; collisions are
/// not detected.
pub type CorrelationGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Settings for encoding entry data into its log-safe form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeConfig {
    /// Whether [`Rich`](crate::LogValue::Rich) values expand through their
    /// [`Encode`](crate::Encode) impl. When disabled they render as
    /// `"<TypeName>"`.
    pub encode_rich_types: bool,
    /// Whether nested maps are encoded recursively. When disabled, nested maps
    /// pass through untouched; arrays are always encoded element-wise.
    pub deep_encode: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        SerializeConfig {
            encode_rich_types: true,
            deep_encode: true,
        }
    }
}

/// Partial override of [`SerializeConfig`]; absent fields inherit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialSerializeConfig {
    /// Overrides [`SerializeConfig::encode_rich_types`] when present.
    pub encode_rich_types: Option<bool>,
    /// Overrides [`SerializeConfig::deep_encode`] when present.
    pub deep_encode: Option<bool>,
}

/// Resolved settings for a [`Logger`](crate::Logger) or
/// [`LogContext`](crate::LogContext).
///
/// Produced by [`Config::merge`]; treat as immutable once attached (loggers
/// and contexts snapshot it, entries carry their own copy).
#[derive(Clone)]
pub struct Config {
    /// Entries below this level are dropped, unless the context bypass applies.
    pub min_level: LogLevel,
    /// Settings for encoding entry data.
    pub serialization: SerializeConfig,
    /// A label prepended to messages. Never inherited across merges: each
    /// override resets it to its own value, absent or not.
    pub tag: Option<String>,
    /// Consumers invoked for every dispatched entry, in order.
    pub sinks: Vec<Arc<dyn Sink>>,
    /// Mutators applied to every entry before dispatch, in order.
    pub enrichers: Vec<Arc<dyn Enricher>>,
    /// Factory for correlation ids; a default scheme applies when absent.
    pub correlation_generator: Option<CorrelationGenerator>,
    /// Lets sub-threshold entries with a context be buffered for retroactive
    /// delivery once the flow sees a `Warning` or above.
    pub context_bypass: bool,
    /// Defers every entry of a flow until its context stops.
    pub suspend_context: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            // verbose while developing, quiet in production builds
            min_level: if cfg!(debug_assertions) {
                LogLevel::Verbose
            } else {
                LogLevel::Warning
            },
            serialization: SerializeConfig::default(),
            tag: None,
            sinks: Vec::new(),
            enrichers: Vec::new(),
            correlation_generator: None,
            context_bypass: false,
            suspend_context: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("min_level", &self.min_level)
            .field("serialization", &self.serialization)
            .field("tag", &self.tag)
            .field("sinks", &self.sinks.len())
            .field("enrichers", &self.enrichers.len())
            .field("has_correlation_generator", &self.correlation_generator.is_some())
            .field("context_bypass", &self.context_bypass)
            .field("suspend_context", &self.suspend_context)
            .finish()
    }
}

impl Config {
    /// Resolves a chain of partial overrides against the built-in defaults.
    ///
    /// Later partials win for scalar fields, except `tag`, which is reset to
    /// each partial's own value so it never leaks onto a fresh instance.
    /// `serialization` merges field-wise at the same precedence. Sink and
    /// enricher lists are unioned de-duplicated by callback identity
    /// ([`Arc::ptr_eq`]), scanned from the most specific partial backward so
    /// descendant-declared ordering wins ties. Never fails.
    pub fn merge<'a>(partials: impl IntoIterator<Item = &'a PartialConfig>) -> Config {
        let partials: Vec<&PartialConfig> = partials.into_iter().collect();

        let mut merged = Config::default();
        for partial in &partials {
            if let Some(level) = partial.min_level {
                merged.min_level = level;
            }
            if let Some(encode) = partial.serialization.encode_rich_types {
                merged.serialization.encode_rich_types = encode;
            }
            if let Some(deep) = partial.serialization.deep_encode {
                merged.serialization.deep_encode = deep;
            }
            if let Some(generator) = &partial.correlation_generator {
                merged.correlation_generator = Some(generator.clone());
            }
            if let Some(bypass) = partial.context_bypass {
                merged.context_bypass = bypass;
            }
            if let Some(suspend) = partial.suspend_context {
                merged.suspend_context = suspend;
            }
            // tags are per-instance labels, not ambient state
            merged.tag = partial.tag.clone();
        }

        merged.sinks = union_by_identity(partials.iter().map(|partial| &partial.sinks));
        merged.enrichers = union_by_identity(partials.iter().map(|partial| &partial.enrichers));
        merged
    }
}

fn union_by_identity<'a, T: ?Sized + 'a>(
    lists: impl DoubleEndedIterator<Item = &'a Vec<Arc<T>>>,
) -> Vec<Arc<T>> {
    let mut result: Vec<Arc<T>> = Vec::new();
    for list in lists.rev() {
        for callback in list {
            if !result.iter().any(|seen| Arc::ptr_eq(seen, callback)) {
                result.push(callback.clone());
            }
        }
    }
    result
}

/// Partial override of [`Config`]; absent fields inherit through
/// [`Config::merge`].
///
/// # Examples
///
/// ```
/// use flowlog::{LogLevel, PartialConfig};
///
/// let config = PartialConfig::default()
///     .min_level(LogLevel::Debug)
///     .tag("main")
///     .suspend_context(true);
/// ```
#[derive(Clone, Default)]
pub struct PartialConfig {
    /// Overrides [`Config::min_level`] when present.
    pub min_level: Option<LogLevel>,
    /// Field-wise overrides of [`Config::serialization`].
    pub serialization: PartialSerializeConfig,
    /// The tag this override carries. Applied verbatim, including `None`.
    pub tag: Option<String>,
    /// Sinks contributed by this override.
    pub sinks: Vec<Arc<dyn Sink>>,
    /// Enrichers contributed by this override.
    pub enrichers: Vec<Arc<dyn Enricher>>,
    /// Overrides [`Config::correlation_generator`] when present.
    pub correlation_generator: Option<CorrelationGenerator>,
    /// Overrides [`Config::context_bypass`] when present.
    pub context_bypass: Option<bool>,
    /// Overrides [`Config::suspend_context`] when present.
    pub suspend_context: Option<bool>,
}

impl PartialConfig {
    /// Sets the minimum level.
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Sets the tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Adds a sink.
    pub fn sink(self, sink: impl Sink) -> Self {
        self.sink_arc(Arc::new(sink))
    }

    /// Adds an already-shared sink. Sharing the same [`Arc`] across configs is
    /// what makes merge de-duplication recognize it.
    pub fn sink_arc(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Adds an enricher.
    pub fn enricher(self, enricher: impl Enricher) -> Self {
        self.enricher_arc(Arc::new(enricher))
    }

    /// Adds an already-shared enricher.
    pub fn enricher_arc(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    /// Sets whether rich values expand through [`Encode`](crate::Encode).
    pub fn encode_rich_types(mut self, encode: bool) -> Self {
        self.serialization.encode_rich_types = Some(encode);
        self
    }

    /// Sets whether nested maps are encoded recursively.
    pub fn deep_encode(mut self, deep: bool) -> Self {
        self.serialization.deep_encode = Some(deep);
        self
    }

    /// Sets the correlation id factory.
    pub fn correlation_generator(
        mut self,
        generator: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.correlation_generator = Some(Arc::new(generator));
        self
    }

    /// Sets the context bypass flag.
    pub fn context_bypass(mut self, bypass: bool) -> Self {
        self.context_bypass = Some(bypass);
        self
    }

    /// Sets the suspend flag.
    pub fn suspend_context(mut self, suspend: bool) -> Self {
        self.suspend_context = Some(suspend);
        self
    }
}

impl From<&Config> for PartialConfig {
    fn from(config: &Config) -> Self {
        PartialConfig {
            min_level: Some(config.min_level),
            serialization: PartialSerializeConfig {
                encode_rich_types: Some(config.serialization.encode_rich_types),
                deep_encode: Some(config.serialization.deep_encode),
            },
            tag: config.tag.clone(),
            sinks: config.sinks.clone(),
            enrichers: config.enrichers.clone(),
            correlation_generator: config.correlation_generator.clone(),
            context_bypass: Some(config.context_bypass),
            suspend_context: Some(config.suspend_context),
        }
    }
}

static DEFAULT_CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(base_config()));

fn base_config() -> Config {
    let mut config = Config::default();
    config.sinks.push(Arc::new(Console::default()));
    config
}

/// A clone of the process-wide default configuration.
///
/// Every [`Logger`](crate::Logger) that inherits defaults merges on top of
/// this. Ships with a [`Console`] sink preinstalled.
pub fn default_config() -> Config {
    DEFAULT_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the default configuration with `config` resolved against the
/// built-in defaults.
///
/// Note this replaces the sink list wholesale; call
/// [`reset_default_config`] to get the console sink back. Loggers already
/// created keep their snapshots.
pub fn set_default_config(config: PartialConfig) {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Config::merge([&config]);
}

/// Merges `config` on top of the current default configuration.
pub fn update_default_config(config: PartialConfig) {
    let mut guard = DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let current = PartialConfig::from(&*guard);
    *guard = Config::merge([&current, &config]);
}

/// Restores the built-in default configuration, console sink included.
pub fn reset_default_config() {
    *DEFAULT_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner) = base_config();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogEntry;

    fn noop_sink() -> Arc<dyn Sink> {
        Arc::new(|_: &LogEntry| -> anyhow::Result<bool> { Ok(false) })
    }

    #[test]
    fn later_partials_win_for_scalars() {
        let first = PartialConfig::default()
            .min_level(LogLevel::Error)
            .context_bypass(true);
        let second = PartialConfig::default().min_level(LogLevel::Debug);

        let merged = Config::merge([&first, &second]);
        assert_eq!(merged.min_level, LogLevel::Debug);
        assert!(merged.context_bypass);
        assert!(!merged.suspend_context);
    }

    #[test]
    fn tag_is_never_inherited() {
        let a = PartialConfig::default().tag("a");
        let b = PartialConfig::default().tag("b");
        let c_with_tag = PartialConfig::default().tag("c");
        let c_without_tag = PartialConfig::default().min_level(LogLevel::Info);

        assert_eq!(Config::merge([&a, &b, &c_with_tag]).tag.as_deref(), Some("c"));
        assert_eq!(Config::merge([&a, &b, &c_without_tag]).tag, None);
    }

    #[test]
    fn serialization_merges_field_wise() {
        let first = PartialConfig::default().encode_rich_types(false);
        let second = PartialConfig::default().deep_encode(false);

        let merged = Config::merge([&first, &second]);
        assert!(!merged.serialization.encode_rich_types);
        assert!(!merged.serialization.deep_encode);
    }

    #[test]
    fn sinks_dedupe_with_descendant_order_first() {
        let shared = noop_sink();
        let extra = noop_sink();
        let parent = PartialConfig::default()
            .sink_arc(shared.clone())
            .sink_arc(extra.clone());
        let child = PartialConfig::default().sink_arc(shared.clone());

        let merged = Config::merge([&parent, &child]);
        assert_eq!(merged.sinks.len(), 2);
        // the child declared `shared` so it comes first; `extra` follows
        assert!(Arc::ptr_eq(&merged.sinks[0], &shared));
        assert!(Arc::ptr_eq(&merged.sinks[1], &extra));
    }

    #[test]
    fn merge_of_nothing_is_the_default() {
        let merged = Config::merge([]);
        assert_eq!(merged.serialization, SerializeConfig::default());
        assert!(merged.sinks.is_empty());
        assert!(merged.enrichers.is_empty());
        assert_eq!(merged.tag, None);
    }

    #[test]
    fn full_configs_act_as_overrides() {
        let full = Config::merge([&PartialConfig::default()
            .min_level(LogLevel::Error)
            .tag("kept")]);
        let merged = Config::merge([&PartialConfig::from(&full)]);
        assert_eq!(merged.min_level, LogLevel::Error);
        assert_eq!(merged.tag.as_deref(), Some("kept"));
    }
}
