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

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::context::LogContext;
use crate::entry::LogEntry;
use crate::level::LogLevel;
use crate::sink::dispatch;

static GLOBAL: LazyLock<Arc<ContextManager>> = LazyLock::new(|| Arc::new(ContextManager::new()));

/// The process-wide manager backing [`LogContext::start`](crate::LogContext::start).
pub(crate) fn global() -> Arc<ContextManager> {
    GLOBAL.clone()
}

#[derive(Default)]
struct ManagerState {
    /// Contexts that have seen a `Warning`-or-above entry while buffering and
    /// will have their pending entries delivered on flush.
    flagged: HashSet<String>,
    /// Entries to deliver only if their context gets flagged.
    pending: HashMap<String, Vec<LogEntry>>,
    /// Entries to deliver when their context stops, flagged or not.
    promised: HashMap<String, Vec<LogEntry>>,
}

/// The registry of buffered entries for live correlation contexts.
///
/// One process-wide instance backs [`LogContext::start`]; tests inject their
/// own through [`LogContext::start_in`](crate::LogContext::start_in) to avoid
/// cross-test leakage. All operations take the internal lock, so sinks invoked
/// during a flush may themselves log.
///
/// [`LogContext::start`]: crate::LogContext::start
#[derive(Default)]
pub struct ContextManager {
    state: Mutex<ManagerState>,
}

impl ContextManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        ContextManager::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffers an entry to be delivered later if the context gets flagged.
    ///
    /// An entry at [`LogLevel::Warning`] or above flags the context on its
    /// own.
    pub fn save(&self, entry: LogEntry, context: &LogContext) {
        let id = context.correlation_id();
        let mut state = self.lock();
        if entry.level >= LogLevel::Warning {
            state.flagged.insert(id.to_owned());
        }
        state.pending.entry(id.to_owned()).or_default().push(entry);
    }

    /// Buffers an entry to be delivered when the context stops, flagged or
    /// not.
    pub fn push(&self, entry: LogEntry, context: &LogContext) {
        let id = context.correlation_id();
        let mut state = self.lock();
        if entry.level >= LogLevel::Warning {
            state.flagged.insert(id.to_owned());
        }
        state
            .pending
            .entry(id.to_owned())
            .or_default()
            .push(entry.clone());
        state.promised.entry(id.to_owned()).or_default().push(entry);
    }

    /// Flags the entry's context, if it still has one, so the pending entries
    /// are delivered on flush.
    pub fn flag(&self, entry: &LogEntry) {
        if let Some(context) = &entry.context {
            self.lock()
                .flagged
                .insert(context.correlation_id().to_owned());
        }
    }

    /// Delivers the buffered entries for `correlation_id` and evicts its
    /// state.
    ///
    /// When the context is flagged, the pending list is authoritative;
    /// otherwise the promised list is delivered, if any. Entries go through
    /// the sink pipeline in arrival order. State is purged even when nothing
    /// is dispatched, so a second flush of the same id is a no-op.
    pub fn flush(&self, correlation_id: &str) -> anyhow::Result<()> {
        let selected = {
            let mut state = self.lock();
            let was_flagged = state.flagged.remove(correlation_id);
            let pending = state.pending.remove(correlation_id);
            let promised = state.promised.remove(correlation_id);
            if was_flagged {
                Some(pending.unwrap_or_default())
            } else {
                promised
            }
        };

        if let Some(entries) = selected {
            if entries.is_empty() {
                log::warn!(
                    "flowlog has no buffered entries for correlation id {correlation_id}; \
                     this shouldn't happen"
                );
            }
            for entry in entries {
                dispatch(&entry, &entry.config.sinks)?;
            }
        }
        Ok(())
    }

    /// Flags every context with pending entries and flushes it.
    ///
    /// Intended for shutdown draining so no buffered entry is silently lost.
    pub fn force_flush(&self) -> anyhow::Result<()> {
        let ids: Vec<String> = self.lock().pending.keys().cloned().collect();
        for id in ids {
            self.lock().flagged.insert(id.clone());
            self.flush(&id)?;
        }
        Ok(())
    }

    /// Wipes all buffered state without dispatching anything.
    ///
    /// An escape hatch for test isolation; never called in normal operation.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.flagged.clear();
        state.pending.clear();
        state.promised.clear();
    }
}
