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

use std::fmt;
use std::panic::Location;

use serde::Serialize;

use crate::config::Config;
use crate::context::LogContext;
use crate::level::LogLevel;
use crate::value::LogData;
use crate::value::LogValue;

/// Best-effort information about where in the source a log call occurred.
///
/// File and line come from the call site via `#[track_caller]`. Function names
/// are not recoverable on stable Rust and stay `None` unless an enricher or
/// caller fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    /// The name of the function where the entry was created, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// The nearest enclosing function name, when known. Equal to
    /// `function_name` whenever that is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_function_name: Option<String>,
    /// The file where the entry was created.
    pub file_path: String,
    /// The line in `file_path` where the entry was created.
    pub line_number: u32,
}

impl SourceMetadata {
    /// Captures metadata for the current caller. Never fails.
    #[track_caller]
    pub fn capture() -> Self {
        let location = Location::caller();
        SourceMetadata {
            function_name: None,
            nearest_function_name: None,
            file_path: location.file().to_owned(),
            line_number: location.line(),
        }
    }

    /// The structured representation used by
    /// [`source_metadata_enricher`](crate::enrich::source_metadata_enricher).
    /// Absent optional fields are omitted.
    pub fn to_value(&self) -> LogValue {
        let mut map = LogData::new();
        if let Some(name) = &self.function_name {
            map.insert("function_name".to_owned(), LogValue::from(name.clone()));
        }
        if let Some(name) = &self.nearest_function_name {
            map.insert(
                "nearest_function_name".to_owned(),
                LogValue::from(name.clone()),
            );
        }
        map.insert(
            "file_path".to_owned(),
            LogValue::from(self.file_path.clone()),
        );
        map.insert("line_number".to_owned(), LogValue::Int(self.line_number.into()));
        LogValue::Map(map)
    }
}

/// A single logging event.
///
/// Once constructed, `level`, `message`, `timestamp`, and `source_metadata`
/// are settled; [enrichers](crate::enrich::Enricher) may still mutate `data`,
/// `encoded_data`, and `config`, and may detach `context` to opt the entry out
/// of buffering and correlation.
#[derive(Clone)]
pub struct LogEntry {
    /// The severity of the entry.
    pub level: LogLevel,
    /// The message associated with the entry.
    pub message: String,
    /// The raw key-value payload passed at the call site.
    pub data: LogData,
    /// The payload after [`serialize`](crate::serialize), safe for console or
    /// JSON output.
    pub encoded_data: LogData,
    /// A point-in-time snapshot of the configuration that produced this entry.
    pub config: Config,
    /// The correlation context active when the entry was created, if any.
    pub context: Option<LogContext>,
    /// Milliseconds since the Unix epoch at creation time.
    pub timestamp: i64,
    /// Where in the source the entry was created.
    pub source_metadata: SourceMetadata,
}

impl LogEntry {
    /// The correlation id of the attached context, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        self.context.as_ref().map(|context| context.correlation_id())
    }
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("level", &self.level)
            .field("message", &self.message)
            .field("data", &self.data)
            .field("encoded_data", &self.encoded_data)
            .field("correlation_id", &self.correlation_id())
            .field("timestamp", &self.timestamp)
            .field("source_metadata", &self.source_metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_points_at_the_caller() {
        let metadata = SourceMetadata::capture();
        assert!(metadata.file_path.ends_with("entry.rs"));
        assert!(metadata.line_number > 0);
        assert_eq!(metadata.function_name, None);
    }

    #[test]
    fn to_value_omits_absent_names() {
        let metadata = SourceMetadata {
            function_name: None,
            nearest_function_name: Some("handler".to_owned()),
            file_path: "src/main.rs".to_owned(),
            line_number: 7,
        };
        let value = metadata.to_value();
        let map = value.as_map().unwrap();
        assert!(!map.contains_key("function_name"));
        assert_eq!(
            map.get("nearest_function_name").and_then(LogValue::as_str),
            Some("handler")
        );
        assert_eq!(map.get("line_number"), Some(&LogValue::Int(7)));
    }
}
