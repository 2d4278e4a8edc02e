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

/// Defaults the entry's tag to the file it was logged from, when no tag is
/// set.
///
/// # Examples
///
/// ```
/// use flowlog::enrich::file_tag_enricher;
/// use flowlog::{Logger, PartialConfig};
///
/// let logger = Logger::new(PartialConfig::default().enricher(file_tag_enricher));
/// ```
pub fn file_tag_enricher(mut entry: LogEntry) -> LogEntry {
    if entry.config.tag.is_none() {
        entry.config.tag = Some(entry.source_metadata.file_path.clone());
    }
    entry
}

/// Defaults the entry's tag to the nearest enclosing function name, when no
/// tag is set and a name is known.
pub fn function_tag_enricher(mut entry: LogEntry) -> LogEntry {
    if entry.config.tag.is_none() {
        entry.config.tag = entry.source_metadata.nearest_function_name.clone();
    }
    entry
}
