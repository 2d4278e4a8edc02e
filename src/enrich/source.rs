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

use crate::entry::LogEntry;

/// Attaches the entry's source metadata to its output.
///
/// The metadata lands under the `source_metadata` key in `encoded_data`;
/// absent optional fields are not populated.
///
/// # Examples
///
/// ```
/// use flowlog::enrich::source_metadata_enricher;
/// use flowlog::{Logger, PartialConfig};
///
/// let logger = Logger::new(PartialConfig::default().enricher(source_metadata_enricher));
/// ```
pub fn source_metadata_enricher(mut entry: LogEntry) -> LogEntry {
    entry.encoded_data.insert(
        "source_metadata".to_owned(),
        entry.source_metadata.to_value(),
    );
    entry
}
