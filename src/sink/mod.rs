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

//! Sinks consume finished log entries.

use std::sync::Arc;

use crate::entry::LogEntry;

mod console;
mod memory;

pub use self::console::Console;
pub use self::console::FormatFn;
pub use self::memory::Memory;

/// A terminal consumer of log entries.
///
/// Returning `Ok(true)` consumes the entry and suppresses all later sinks in
/// the chain, the default console sink included. Errors are not caught by the
/// pipeline; they propagate to the caller of
/// [`Logger::log`](crate::Logger::log) (or of
/// [`LogContext::stop`](crate::LogContext::stop) for buffered entries).
///
/// Sinks must not perform blocking I/O inline; hand asynchronous work off to
/// an external queue instead.
///
/// Any `Fn(&LogEntry) -> anyhow::Result<bool>` is a sink:
///
/// ```
/// use flowlog::{LogEntry, Logger, PartialConfig};
///
/// let logger = Logger::new(PartialConfig::default().sink(
///     |entry: &LogEntry| -> anyhow::Result<bool> {
///         // forward `entry` somewhere, let later sinks run too
///         Ok(false)
///     },
/// ));
/// ```
pub trait Sink: Send + Sync + 'static {
    /// Processes an entry. `Ok(true)` means consumed.
    fn emit(&self, entry: &LogEntry) -> anyhow::Result<bool>;
}

impl<F> Sink for F
where
    F: Fn(&LogEntry) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    fn emit(&self, entry: &LogEntry) -> anyhow::Result<bool> {
        self(entry)
    }
}

/// Feeds `entry` through `sinks` in order until one consumes it.
///
/// An empty sink list is very likely a misconfiguration; it is reported as a
/// warning through the `log` facade and the entry goes nowhere. The first sink
/// error aborts the chain and propagates.
pub fn dispatch(entry: &LogEntry, sinks: &[Arc<dyn Sink>]) -> anyhow::Result<()> {
    if sinks.is_empty() {
        log::warn!(
            "flowlog entry has no sinks; nowhere to send message {:?}",
            entry.message
        );
        return Ok(());
    }

    for sink in sinks {
        if sink.emit(entry)? {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::config::Config;
    use crate::entry::SourceMetadata;
    use crate::level::LogLevel;
    use crate::value::LogData;

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

    fn counting_sink(counter: Arc<AtomicUsize>, consume: bool) -> Arc<dyn Sink> {
        Arc::new(move |_: &LogEntry| -> anyhow::Result<bool> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(consume)
        })
    }

    #[test]
    fn consumption_short_circuits_later_sinks() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));

        let sinks = [
            counting_sink(first.clone(), false),
            counting_sink(second.clone(), true),
            counting_sink(third.clone(), false),
        ];
        dispatch(&entry(), &sinks).unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_sink_list_is_a_warning_not_an_error() {
        dispatch(&entry(), &[]).unwrap();
    }

    #[test]
    fn sink_errors_propagate_and_abort_the_chain() {
        let failing: Arc<dyn Sink> = Arc::new(|_: &LogEntry| -> anyhow::Result<bool> {
            anyhow::bail!("sink exploded")
        });
        let after = Arc::new(AtomicUsize::new(0));

        let sinks = [failing, counting_sink(after.clone(), false)];
        let err = dispatch(&entry(), &sinks).unwrap_err();

        assert!(err.to_string().contains("sink exploded"));
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }
}
