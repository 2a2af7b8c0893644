//! Deterministic adapter for tests and offline play.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

use super::{AdapterError, AiAdapter, AiIdea};

/// Adapter that always answers with the same scripted reply.
pub struct ScriptedAdapter {
    reply: Result<Vec<AiIdea>, AdapterError>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedAdapter {
    fn with_reply(reply: Result<Vec<AiIdea>, AdapterError>) -> Self {
        Self {
            reply,
            delay: None,
            barrier: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Answer with `ideas`.
    pub fn ideas(ideas: Vec<AiIdea>) -> Self {
        Self::with_reply(Ok(ideas))
    }

    /// Answer with an empty idea list.
    pub fn empty() -> Self {
        Self::with_reply(Ok(Vec::new()))
    }

    /// Fail every call with `error`.
    pub fn failing(error: AdapterError) -> Self {
        Self::with_reply(Err(error))
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait on `barrier` before answering, so concurrent callers line up.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Input names of every call so far.
    pub fn seen_inputs(&self) -> Vec<Vec<String>> {
        self.seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AiAdapter for ScriptedAdapter {
    async fn propose(&self, input_names: &[String]) -> Result<Vec<AiIdea>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(input_names.to_vec());
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}
