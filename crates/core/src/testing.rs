//! Scripted [`LanguageModel`] double for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::models::{Completion, CompletionRequest, LanguageModel, ObjectRequest};

type CompletionHandler =
    Arc<dyn Fn(&CompletionRequest) -> anyhow::Result<Completion> + Send + Sync>;

/// Structured answers are queued per schema name; the last queued answer
/// repeats once the queue is down to one entry.
pub struct MockModel {
    name: String,
    objects: Mutex<HashMap<String, VecDeque<Option<Value>>>>,
    completion: Option<CompletionHandler>,
    object_calls: Mutex<HashMap<String, usize>>,
    completion_requests: Mutex<Vec<CompletionRequest>>,
}

impl MockModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: Mutex::new(HashMap::new()),
            completion: None,
            object_calls: Mutex::new(HashMap::new()),
            completion_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_object(self, schema_name: &str, value: Value) -> Self {
        self.push_object(schema_name, Some(value));
        self
    }

    pub fn with_object_error(self, schema_name: &str) -> Self {
        self.push_object(schema_name, None);
        self
    }

    pub fn with_completion<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CompletionRequest) -> anyhow::Result<Completion> + Send + Sync + 'static,
    {
        self.completion = Some(Arc::new(handler));
        self
    }

    pub fn object_calls(&self, schema_name: &str) -> usize {
        self.object_calls
            .lock()
            .unwrap()
            .get(schema_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn completion_requests(&self) -> Vec<CompletionRequest> {
        self.completion_requests.lock().unwrap().clone()
    }

    fn push_object(&self, schema_name: &str, value: Option<Value>) {
        self.objects
            .lock()
            .unwrap()
            .entry(schema_name.to_string())
            .or_default()
            .push_back(value);
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Completion> {
        self.completion_requests.lock().unwrap().push(request.clone());
        match &self.completion {
            Some(handler) => handler(&request),
            None => anyhow::bail!("mock: no completion handler"),
        }
    }

    async fn generate_object(&self, request: ObjectRequest) -> anyhow::Result<Value> {
        *self
            .object_calls
            .lock()
            .unwrap()
            .entry(request.schema_name.clone())
            .or_insert(0) += 1;

        let mut objects = self.objects.lock().unwrap();
        let queue = match objects.get_mut(&request.schema_name) {
            Some(queue) if !queue.is_empty() => queue,
            _ => anyhow::bail!("mock: nothing scripted for {}", request.schema_name),
        };
        let answer = if queue.len() > 1 {
            queue.pop_front().flatten()
        } else {
            queue.front().cloned().flatten()
        };
        answer.ok_or_else(|| anyhow::anyhow!("mock: scripted failure for {}", request.schema_name))
    }
}
