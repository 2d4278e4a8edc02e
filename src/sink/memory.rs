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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::entry::LogEntry;
use crate::sink::Sink;

/// A sink that captures entries in memory, for tests and examples.
///
/// Clones share the same backing storage, so keep one handle for inspection
/// and install another on the config.
///
/// # Examples
///
/// ```
/// use flowlog::sink::Memory;
/// use flowlog::{data, Logger, PartialConfig};
///
/// let captured = Memory::new();
/// let logger = Logger::detached(PartialConfig::default().sink(captured.clone()));
///
/// logger.i("Hello world!", data! {}).unwrap();
/// assert_eq!(captured.messages(), ["Hello world!"]);
/// ```
#[derive(Clone, Default)]
pub struct Memory {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    consuming: bool,
}

impl Memory {
    /// Creates an empty capture sink that passes entries on to later sinks.
    pub fn new() -> Self {
        Memory::default()
    }

    /// Makes the sink consume every entry it captures, short-circuiting later
    /// sinks.
    pub fn consuming(mut self) -> Self {
        self.consuming = true;
        self
    }

    /// A snapshot of the captured entries, in arrival order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The captured messages, in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }

    /// How many entries have been captured.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all captured entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for Memory {
    fn emit(&self, entry: &LogEntry) -> anyhow::Result<bool> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(self.consuming)
    }
}
