//! Scripted backend for tests and local runs.
//!
//! [`MockBackend`] returns a fixed [`Completion`] for non-streaming requests and
//! replays a fixed list of [`MockStep`]s as the update sequence for streaming ones.
//! It records every parameter set it received so tests can assert on normalization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{BackendError, ChatBackend, ClientFactory, Completion, Delta, DeltaStream};
use crate::normalize::ChatParams;

/// One scripted stream item.
#[derive(Clone, Debug)]
pub enum MockStep {
    Delta(Delta),
    /// Yields `BackendError::Remote(message)` at this point of the stream.
    Fail(String),
    /// Never yields again (simulates a stalled provider).
    Stall,
}

#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    completion: Completion,
    steps: Vec<MockStep>,
    /// When set, `complete` fails with this message.
    complete_error: Option<String>,
    /// When set, `stream` fails to open with this message.
    open_error: Option<String>,
    calls: Arc<Mutex<Vec<ChatParams>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-streaming reply.
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Streaming script; steps after a terminal usage update are still delivered.
    pub fn with_steps(mut self, steps: Vec<MockStep>) -> Self {
        self.steps = steps;
        self
    }

    /// Streaming script made only of deltas.
    pub fn with_deltas(self, deltas: Vec<Delta>) -> Self {
        self.with_steps(deltas.into_iter().map(MockStep::Delta).collect())
    }

    pub fn failing_complete(mut self, message: impl Into<String>) -> Self {
        self.complete_error = Some(message.into());
        self
    }

    pub fn failing_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Parameters of every call so far, oldest first.
    pub fn calls(&self) -> Vec<ChatParams> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, params: &ChatParams) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(params.clone());
        }
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, params: &ChatParams) -> Result<Completion, BackendError> {
        self.record(params);
        match &self.complete_error {
            Some(message) => Err(BackendError::Remote(message.clone())),
            None => Ok(self.completion.clone()),
        }
    }

    async fn stream(&self, params: &ChatParams) -> Result<DeltaStream, BackendError> {
        self.record(params);
        if let Some(message) = &self.open_error {
            return Err(BackendError::Remote(message.clone()));
        }
        let steps = self.steps.clone();
        let stalls = steps.iter().any(|s| matches!(s, MockStep::Stall));
        let items = steps
            .into_iter()
            .map_while(|step| match step {
                MockStep::Delta(delta) => Some(Ok(delta)),
                MockStep::Fail(message) => Some(Err(BackendError::Remote(message))),
                MockStep::Stall => None,
            })
            .collect::<Vec<_>>();
        let replay = stream::iter(items);
        if stalls {
            Ok(replay.chain(stream::pending()).boxed())
        } else {
            Ok(replay.boxed())
        }
    }
}

/// Factory handing out clones of one [`MockBackend`] template.
///
/// Clones share call records, so `factory.backend().calls()` sees every request
/// regardless of which cached client served it.
#[derive(Clone, Default)]
pub struct MockFactory {
    template: MockBackend,
    created: Arc<AtomicUsize>,
    endpoints: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockFactory {
    pub fn new(template: MockBackend) -> Self {
        Self {
            template,
            ..Default::default()
        }
    }

    pub fn backend(&self) -> &MockBackend {
        &self.template
    }

    /// Number of clients created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Endpoint passed to each `create`, in order.
    pub fn endpoints(&self) -> Vec<Option<String>> {
        self.endpoints.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ClientFactory for MockFactory {
    type Client = MockBackend;

    fn provider_name(&self) -> &str {
        "Mock"
    }

    fn create(&self, _credential: &str, endpoint: Option<&str>) -> MockBackend {
        self.created.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.push(endpoint.map(str::to_string));
        }
        self.template.clone()
    }
}
