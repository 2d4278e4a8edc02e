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

use std::io::Write;
use std::sync::Arc;

use serde_json::json;

use crate::entry::LogEntry;
use crate::level::LogLevel;
use crate::sink::Sink;

/// Renders an entry to the line the console sink prints.
pub type FormatFn = Arc<dyn Fn(&LogEntry) -> String + Send + Sync>;

/// The default sink. Prints entries to the console and consumes them.
///
/// Entries at [`LogLevel::Warning`] and above go to stderr, the rest to
/// stdout. The default format is `[LEVEL]: tag -> message` followed by a JSON
/// payload carrying the correlation id, timestamp, and encoded data.
///
/// Preinstalled on the process-wide default configuration, so every logger
/// that inherits defaults prints to the console unless an earlier sink
/// consumes the entry first.
///
/// # Examples
///
/// ```
/// use flowlog::sink::Console;
/// use flowlog::{LogLevel, Logger, PartialConfig};
///
/// let logger = Logger::detached(
///     PartialConfig::default().sink(Console::default().with_min_level(LogLevel::Info)),
/// );
/// ```
#[derive(Default)]
pub struct Console {
    min_level: Option<LogLevel>,
    disable: bool,
    format: Option<FormatFn>,
}

impl Console {
    /// Skips entries below `level` without consuming them, so they still reach
    /// later sinks.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Disables printing entirely. Useful for conditionally toggling console
    /// output without reshaping the sink list.
    pub fn disabled(mut self) -> Self {
        self.disable = true;
        self
    }

    /// Replaces the default line format.
    pub fn with_format(mut self, format: impl Fn(&LogEntry) -> String + Send + Sync + 'static) -> Self {
        self.format = Some(Arc::new(format));
        self
    }
}

impl Sink for Console {
    fn emit(&self, entry: &LogEntry) -> anyhow::Result<bool> {
        if self.disable {
            return Ok(false);
        }
        if let Some(min_level) = self.min_level {
            if entry.level < min_level {
                return Ok(false);
            }
        }

        let line = match &self.format {
            Some(format) => format(entry),
            None => default_format(entry)?,
        };

        if entry.level >= LogLevel::Warning {
            writeln!(std::io::stderr(), "{line}")?;
        } else {
            writeln!(std::io::stdout(), "{line}")?;
        }
        Ok(true)
    }
}

fn default_format(entry: &LogEntry) -> anyhow::Result<String> {
    let tag = match &entry.config.tag {
        Some(tag) => format!("{tag} -> "),
        None => String::new(),
    };

    let mut payload = json!({ "timestamp": entry.timestamp });
    if let Some(correlation_id) = entry.correlation_id() {
        payload["correlation_id"] = json!(correlation_id);
    }
    if !entry.encoded_data.is_empty() {
        payload["data"] = serde_json::to_value(&entry.encoded_data)?;
    }

    Ok(format!(
        "[{}]: {}{}\n{}",
        entry.level,
        tag,
        entry.message,
        serde_json::to_string(&payload)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entry::SourceMetadata;
    use crate::value::LogData;
    use crate::data;

    fn entry(level: LogLevel, tag: Option<&str>) -> LogEntry {
        let mut config = Config::default();
        config.tag = tag.map(str::to_owned);
        LogEntry {
            level,
            message: "Hello world!".to_owned(),
            data: LogData::new(),
            encoded_data: data! { "player" => 1338 },
            config,
            context: None,
            timestamp: 1234,
            source_metadata: SourceMetadata::capture(),
        }
    }

    #[test]
    fn default_format_carries_tag_and_payload() {
        let line = default_format(&entry(LogLevel::Info, Some("main"))).unwrap();
        assert!(line.starts_with("[INFO]: main -> Hello world!\n"));
        assert!(line.contains(r#""data":{"player":1338}"#));
        assert!(line.contains(r#""timestamp":1234"#));
        assert!(!line.contains("correlation_id"));
    }

    #[test]
    fn default_format_omits_empty_payload_fields() {
        let mut plain = entry(LogLevel::Debug, None);
        plain.encoded_data.clear();
        let line = default_format(&plain).unwrap();
        assert!(line.starts_with("[DEBUG]: Hello world!\n"));
        assert!(!line.contains("\"data\""));
    }

    #[test]
    fn below_min_level_passes_without_consuming() {
        let console = Console::default().with_min_level(LogLevel::Warning);
        assert!(!console.emit(&entry(LogLevel::Info, None)).unwrap());
    }

    #[test]
    fn disabled_console_never_consumes() {
        let console = Console::default().disabled();
        assert!(!console.emit(&entry(LogLevel::Error, None)).unwrap());
    }
}
