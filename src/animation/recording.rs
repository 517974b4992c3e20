//! Headless renderer: records intents instead of drawing them

use super::{AnimationHandle, AnimationIntent, HistoryEntry, RenderError, Renderer};
use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::debug;

/// Renderer for headless runs and tests.
///
/// Inputs are answered from a scripted queue; an empty queue means the
/// learner cancelled the prompt.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    inputs: VecDeque<String>,
    next_handle: u64,
    /// Every intent passed to `play`, in order
    pub played: Vec<AnimationIntent>,
    /// Every entry passed to `reverse`, in order
    pub reversed: Vec<HistoryEntry>,
    /// Prompts shown by `capture_input`
    pub prompts: Vec<String>,
    pub clears: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RecordingRenderer {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, value: impl Into<String>) {
        self.inputs.push_back(value.into());
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn capture_input(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.inputs.pop_front()
    }

    async fn play(&mut self, intent: &AnimationIntent) -> Result<AnimationHandle, RenderError> {
        debug!(line = intent.line() + 1, "recorded animation");
        self.played.push(intent.clone());
        self.next_handle += 1;
        Ok(AnimationHandle(self.next_handle))
    }

    async fn reverse(&mut self, entry: &HistoryEntry) -> Result<(), RenderError> {
        self.reversed.push(*entry);
        Ok(())
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
