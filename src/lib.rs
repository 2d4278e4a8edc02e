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

//! Flowlog is a context-aware structured logging library for game-server
//! scripts and other flow-oriented services.
//!
//! # Overview
//!
//! Every entry carries a level, a message, and a structured data payload.
//! Entries run through configurable [enrichers](enrich) before reaching
//! [sinks](sink), and a [`LogContext`] ties the entries of one logical flow
//! together under a correlation id, optionally buffering them for retroactive
//! or deferred delivery.
//!
//! # Examples
//!
//! Plain logging against the default console sink:
//!
//! ```
//! use flowlog::{data, Logger, PartialConfig};
//!
//! let logger = Logger::new(PartialConfig::default().tag("main"));
//! logger.i("Player joined", data! { "player" => 1338 })?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Correlating a flow, with quiet entries surfacing only if it goes wrong:
//!
//! ```
//! use flowlog::{data, with_log_context, LogLevel, PartialConfig};
//!
//! let config = PartialConfig::default()
//!     .min_level(LogLevel::Warning)
//!     .context_bypass(true);
//!
//! with_log_context(config, |context| {
//!     let logger = context.logger(PartialConfig::default());
//!     logger.d("reserving seat", data! { "seat" => 4 })?;
//!     // the debug entry above is delivered retroactively only if the flow
//!     // logs a warning or worse before the context stops
//!     Ok(())
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod enrich;
pub mod sink;

mod config;
mod context;
mod entry;
mod level;
mod logger;
mod serialize;
mod value;

pub use config::default_config;
pub use config::reset_default_config;
pub use config::set_default_config;
pub use config::update_default_config;
pub use config::Config;
pub use config::CorrelationGenerator;
pub use config::PartialConfig;
pub use config::PartialSerializeConfig;
pub use config::SerializeConfig;
pub use context::with_log_context;
pub use context::with_log_context_in;
pub use context::ContextManager;
pub use context::LogContext;
pub use entry::LogEntry;
pub use entry::SourceMetadata;
pub use level::LogLevel;
pub use logger::Logger;
pub use serialize::serialize;
pub use value::Encode;
pub use value::LogData;
pub use value::LogValue;
pub use value::SharedValue;

/// Flushes every flow that still has buffered entries, as if each were
/// flagged.
///
/// Call during shutdown so buffered diagnostics are not lost. Only affects
/// contexts started through [`LogContext::start`] or [`with_log_context`];
/// managers injected with [`LogContext::start_in`] must be flushed directly.
pub fn force_flush() -> anyhow::Result<()> {
    context::global().force_flush()
}
