//! In-process bridge for tests and benchmarks.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::bridge::Bridge;
use crate::error::BridgeError;

/// One call the bridge received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub service: String,
    pub method: String,
    pub args: Vec<JsonValue>,
}

/// Records calls and answers from a queue of scripted responses.
///
/// With the queue empty, `open` answers `{"dbHandle": "1"}` and everything else `[]`.
/// History is unbounded unless built with [`with_history_limit`](Self::with_history_limit)
/// or [`discarding`](Self::discarding); the oldest calls are dropped first.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Mutex<VecDeque<RecordedCall>>,
    history_limit: Option<usize>,
    invocations: AtomicUsize,
    responses: Mutex<VecDeque<Result<JsonValue, BridgeError>>>,
}

impl RecordingBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` of the most recent calls.
    #[must_use]
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Keep no call history. `call_count` still counts invocations.
    #[must_use]
    pub fn discarding() -> Self {
        Self::with_history_limit(0)
    }

    pub fn push_response(&self, response: Result<JsonValue, BridgeError>) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(response);
    }

    /// Retained calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Total invocations, including calls no longer retained.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    fn record(&self, call: RecordedCall) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        if self.history_limit == Some(0) {
            return;
        }
        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        calls.push_back(call);
        if let Some(limit) = self.history_limit {
            while calls.len() > limit {
                calls.pop_front();
            }
        }
    }
}

#[async_trait]
impl Bridge for RecordingBridge {
    async fn invoke(
        &self,
        service: &str,
        method: &str,
        args: Vec<JsonValue>,
    ) -> Result<JsonValue, BridgeError> {
        self.record(RecordedCall {
            service: service.to_string(),
            method: method.to_string(),
            args,
        });
        let scripted = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(response) => response,
            None if method == "open" => Ok(serde_json::json!({ "dbHandle": "1" })),
            None => Ok(JsonValue::Array(Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn invoke_n(bridge: &RecordingBridge, n: i64) {
        for i in 0..n {
            bridge.invoke("TPSQLite", "query", vec![json!(i)]).await.unwrap();
        }
    }

    #[tokio::test]
    async fn history_limit_keeps_most_recent_calls() {
        let bridge = RecordingBridge::with_history_limit(2);
        invoke_n(&bridge, 5).await;

        let kept: Vec<_> = bridge.calls().into_iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(kept, vec![json!(3), json!(4)]);
        assert_eq!(bridge.last_call().unwrap().args, vec![json!(4)]);
        assert_eq!(bridge.call_count(), 5);
    }

    #[tokio::test]
    async fn discarding_bridge_retains_nothing_but_still_answers() {
        let bridge = RecordingBridge::discarding();
        let opened = bridge.invoke("TPSQLite", "open", Vec::new()).await.unwrap();
        assert_eq!(opened, json!({"dbHandle": "1"}));
        invoke_n(&bridge, 3).await;

        assert!(bridge.calls().is_empty());
        assert!(bridge.last_call().is_none());
        assert_eq!(bridge.call_count(), 4);
    }

    #[tokio::test]
    async fn unbounded_by_default() {
        let bridge = RecordingBridge::new();
        invoke_n(&bridge, 3).await;
        assert_eq!(bridge.calls().len(), 3);
        assert_eq!(bridge.last_call().unwrap().args, vec![json!(2)]);
    }
}
