//! Scripted `LlmProvider` for tests. Replies are queued per shape name; free-text
//! replies have their own queue. Every call is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{LlmError, LlmProvider, ShapeSpec};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub shape: Option<&'static str>,
    pub system: String,
    pub user: String,
}

#[derive(Default)]
pub struct ScriptedProvider {
    json_replies: Mutex<HashMap<&'static str, VecDeque<Value>>>,
    text_replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, shape: &'static str, value: Value) -> Self {
        self.json_replies
            .lock()
            .unwrap()
            .entry(shape)
            .or_default()
            .push_back(value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.text_replies.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, shape: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.shape == Some(shape))
            .count()
    }

    fn record(&self, shape: Option<&'static str>, system: &str, user: &str) {
        self.calls.lock().unwrap().push(RecordedCall {
            shape,
            system: system.to_string(),
            user: user.to_string(),
        });
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.record(None, system, user);
        self.text_replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        shape: &ShapeSpec,
    ) -> Result<Value, LlmError> {
        self.record(Some(shape.name), system, user);
        self.json_replies
            .lock()
            .unwrap()
            .get_mut(shape.name)
            .and_then(VecDeque::pop_front)
            .ok_or(LlmError::EmptyContent)
    }
}
