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

//! Enrichers mutate log entries before dispatch.

use std::sync::Arc;

use crate::entry::LogEntry;

mod source;
mod tag;

pub use self::source::source_metadata_enricher;
pub use self::tag::file_tag_enricher;
pub use self::tag::function_tag_enricher;

/// A pipeline stage that augments or mutates an entry before dispatch.
///
/// Enrichers may add or overwrite keys in `data`/`encoded_data`, change
/// `config.tag`, or detach `context` to opt the entry out of buffering and
/// correlation. They must not alter `level`, `message`, or `timestamp`, must
/// not block, and are expected to be pure transforms.
///
/// Any `Fn(LogEntry) -> LogEntry` is an enricher:
///
/// ```
/// use flowlog::{Logger, PartialConfig};
///
/// let logger = Logger::new(PartialConfig::default().enricher(|mut entry: flowlog::LogEntry| {
///     entry.encoded_data.insert("service".to_owned(), "matchmaking".into());
///     entry
/// }));
/// ```
pub trait Enricher: Send + Sync + 'static {
    /// Transforms the entry, returning the same or a new one.
    fn enrich(&self, entry: LogEntry) -> LogEntry;
}

impl<F> Enricher for F
where
    F: Fn(LogEntry) -> LogEntry + Send + Sync + 'static,
{
    fn enrich(&self, entry: LogEntry) -> LogEntry {
        self(entry)
    }
}

/// Folds `entry` through `enrichers` in order, each receiving the output of
/// its predecessor.
pub fn enrich(entry: LogEntry, enrichers: &[Arc<dyn Enricher>]) -> LogEntry {
    enrichers
        .iter()
        .fold(entry, |entry, enricher| enricher.enrich(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entry::SourceMetadata;
    use crate::level::LogLevel;
    use crate::value::LogData;
    use crate::value::LogValue;

    fn entry() -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            message: "message".to_owned(),
            data: LogData::new(),
            encoded_data: LogData::new(),
            config: Config::default(),
            context: None,
            timestamp: 0,
            source_metadata: SourceMetadata::capture(),
        }
    }

    #[test]
    fn enrichers_fold_in_order() {
        let first: Arc<dyn Enricher> = Arc::new(|mut entry: LogEntry| {
            entry.encoded_data.insert("step".to_owned(), LogValue::from("first"));
            entry
        });
        let second: Arc<dyn Enricher> = Arc::new(|mut entry: LogEntry| {
            let step = entry
                .encoded_data
                .get("step")
                .and_then(LogValue::as_str)
                .unwrap_or_default()
                .to_owned();
            entry
                .encoded_data
                .insert("step".to_owned(), LogValue::from(format!("{step}-second")));
            entry
        });

        let enriched = enrich(entry(), &[first, second]);
        assert_eq!(
            enriched.encoded_data.get("step").and_then(LogValue::as_str),
            Some("first-second")
        );
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let enriched = enrich(entry(), &[]);
        assert_eq!(enriched.message, "message");
        assert!(enriched.encoded_data.is_empty());
    }
}
