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

//! End-to-end flows through contexts, buffering, and delivery.

use std::sync::Arc;

use flowlog::data;
use flowlog::sink::Memory;
use flowlog::with_log_context_in;
use flowlog::ContextManager;
use flowlog::LogContext;
use flowlog::LogLevel;
use flowlog::PartialConfig;

fn manager() -> Arc<ContextManager> {
    Arc::new(ContextManager::new())
}

fn bypass_config(memory: &Memory) -> PartialConfig {
    PartialConfig::default()
        .min_level(LogLevel::Warning)
        .context_bypass(true)
        .sink(memory.clone())
}

#[test]
fn quiet_flow_history_surfaces_after_a_warning() {
    let memory = Memory::new();
    let context = LogContext::start_in(manager(), bypass_config(&memory));
    let logger = context.logger(PartialConfig::default());

    logger.d("step one", data! {}).unwrap();
    logger.d("step two", data! {}).unwrap();
    assert!(memory.is_empty());

    // gate-passing entries go out right away and flag the flow
    logger.w("something off", data! {}).unwrap();
    assert_eq!(memory.messages(), ["something off"]);

    logger.d("step three", data! {}).unwrap();
    context.stop().unwrap();

    assert_eq!(
        memory.messages(),
        ["something off", "step one", "step two", "step three"]
    );
}

#[test]
fn quiet_flow_history_vanishes_without_a_warning() {
    let memory = Memory::new();
    let context = LogContext::start_in(manager(), bypass_config(&memory));
    let logger = context.logger(PartialConfig::default());

    logger.d("step one", data! {}).unwrap();
    logger.i("step two", data! {}).unwrap();
    context.stop().unwrap();

    assert!(memory.is_empty());
}

#[test]
fn suspended_flow_delivers_everything_in_order_on_stop() {
    let memory = Memory::new();
    let context = LogContext::start_in(
        manager(),
        PartialConfig::default()
            .min_level(LogLevel::Verbose)
            .suspend_context(true)
            .sink(memory.clone()),
    );
    let logger = context.logger(PartialConfig::default());

    for step in 1..=4 {
        logger.i(format!("step {step}"), data! { "step" => step }).unwrap();
    }
    assert!(memory.is_empty());

    context.stop().unwrap();
    assert_eq!(
        memory.messages(),
        ["step 1", "step 2", "step 3", "step 4"]
    );
}

#[test]
fn stopping_twice_never_replays_entries() {
    let memory = Memory::new();
    let context = LogContext::start_in(
        manager(),
        PartialConfig::default()
            .min_level(LogLevel::Verbose)
            .suspend_context(true)
            .sink(memory.clone()),
    );
    let logger = context.logger(PartialConfig::default());

    logger.i("once", data! {}).unwrap();
    context.stop().unwrap();
    context.stop().unwrap();

    assert_eq!(memory.messages(), ["once"]);
}

#[test]
fn interleaved_flows_never_cross_contaminate() {
    let manager = manager();
    let trades = Memory::new();
    let logins = Memory::new();

    let trade_flow = LogContext::start_in(manager.clone(), bypass_config(&trades));
    let login_flow = LogContext::start_in(manager, bypass_config(&logins));
    let trade_logger = trade_flow.logger(PartialConfig::default());
    let login_logger = login_flow.logger(PartialConfig::default());

    trade_logger.d("trade quiet", data! {}).unwrap();
    login_logger.d("login quiet", data! {}).unwrap();
    trade_logger.w("trade failed", data! {}).unwrap();

    trade_flow.stop().unwrap();
    login_flow.stop().unwrap();

    assert_eq!(trades.messages(), ["trade failed", "trade quiet"]);
    // the login flow never got flagged, so its history is discarded
    assert!(logins.is_empty());
}

#[test]
fn flows_share_ids_across_siblings() {
    let memory = Memory::new();
    let context = LogContext::start_in(
        manager(),
        PartialConfig::default()
            .min_level(LogLevel::Verbose)
            .sink(memory.clone()),
    );
    let sibling = context.with_config(PartialConfig::default().min_level(LogLevel::Warning));
    let logger = sibling.logger(PartialConfig::default());

    logger.e("escalated", data! {}).unwrap();

    let entry = &memory.entries()[0];
    assert_eq!(entry.correlation_id(), Some(context.correlation_id()));

    sibling.stop().unwrap();
    context.stop().unwrap();
}

#[test]
fn custom_generator_ids_reach_the_entries() {
    let memory = Memory::new();
    let context = LogContext::start_in(
        manager(),
        PartialConfig::default()
            .min_level(LogLevel::Verbose)
            .correlation_generator(|| "round-42".to_owned())
            .sink(memory.clone()),
    );
    let logger = context.logger(PartialConfig::default());

    logger.i("round started", data! {}).unwrap();
    assert_eq!(memory.entries()[0].correlation_id(), Some("round-42"));
    context.stop().unwrap();
}

#[test]
#[should_panic(expected = "dead LogContext")]
fn logging_from_a_stopped_flow_panics() {
    let context = LogContext::start_in(manager(), PartialConfig::default());
    context.stop().unwrap();
    context.logger(PartialConfig::default());
}

#[test]
fn scoped_flows_stop_themselves() {
    let memory = Memory::new();
    let config = PartialConfig::default()
        .min_level(LogLevel::Verbose)
        .suspend_context(true)
        .sink(memory.clone());

    with_log_context_in(manager(), config, |context| {
        let logger = context.logger(PartialConfig::default());
        logger.i("inside the flow", data! {})?;
        assert!(memory.is_empty());
        Ok(())
    })
    .unwrap();

    assert_eq!(memory.messages(), ["inside the flow"]);
}

#[test]
fn force_flush_rescues_buffered_history() {
    // the only test touching the process-wide manager, via force_flush
    let memory = Memory::new();
    let context = LogContext::start(bypass_config(&memory));
    let logger = context.logger(PartialConfig::default());

    logger.d("about to crash", data! {}).unwrap();
    assert!(memory.is_empty());

    flowlog::force_flush().unwrap();
    assert_eq!(memory.messages(), ["about to crash"]);

    // the flush already evicted the flow, so stop has nothing left to do
    context.stop().unwrap();
    assert_eq!(memory.len(), 1);
}
