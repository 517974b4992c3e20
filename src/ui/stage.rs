//! Animation stage shared between the renderer and the draw loop
//!
//! [`TuiRenderer`] implements [`Renderer`]: each `play`/`reverse` updates the
//! [`StageState`], then sleeps for the tween's duration while the draw loop
//! reads the same state every frame and positions sparks by tween progress.

use crate::animation::tween::{
    Timing, Tween, ASSIGNMENT_SPARK, BOX_POP, CALCULATION_BOX, CONVERTER, INPUT_SPARK,
    OUTPUT_LINE, PRINT_SPARK, REVERSE,
};
use crate::animation::{
    AnimationHandle, AnimationIntent, HistoryEntry, HistoryKind, MemorySlot, RenderError,
    Renderer,
};
use crate::lesson::calls::PrintPart;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::debug;

/// Where a spark starts or lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// 0-based source line
    SourceLine(usize),
    /// Memory box for a name (the next free row if it does not exist yet)
    Memory(String),
    /// Next console line
    Console,
}

/// A value label in flight
#[derive(Debug, Clone)]
pub struct Spark {
    pub label: String,
    pub from: Anchor,
    pub to: Anchor,
    pub tween: Tween,
    pub started: Instant,
}

impl Spark {
    pub fn progress(&self) -> f64 {
        self.tween.progress(self.started.elapsed())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryBox {
    pub name: String,
    pub value: String,
    pub pop: Tween,
    pub changed: Instant,
}

impl MemoryBox {
    /// Still settling after being created or updated
    pub fn is_popping(&self) -> bool {
        !self.pop.is_finished(self.changed.elapsed())
    }
}

#[derive(Debug, Clone)]
pub struct OutputLine {
    pub handle: AnimationHandle,
    pub text: String,
    pub slide: Tween,
    pub appeared: Instant,
}

impl OutputLine {
    /// Columns still to slide in from the left
    pub fn indent(&self) -> u16 {
        self.slide.lerp(4.0, 0.0, self.appeared.elapsed()).round().max(0.0) as u16
    }
}

/// Element being faded out by a reversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fading {
    Memory(String),
    Output(AnimationHandle),
}

/// Input prompt waiting for the learner
pub struct InputRequest {
    pub prompt: String,
    pub value: String,
    reply: oneshot::Sender<Option<String>>,
}

impl InputRequest {
    pub fn submit(self) {
        let _ = self.reply.send(Some(self.value));
    }

    pub fn cancel(self) {
        let _ = self.reply.send(None);
    }
}

/// What a memory update replaced, so Back can restore it
#[derive(Debug, Clone)]
struct Revision {
    name: String,
    previous: Option<String>,
}

#[derive(Default)]
pub struct StageState {
    pub boxes: Vec<MemoryBox>,
    pub lines: Vec<OutputLine>,
    pub sparks: Vec<Spark>,
    pub fading: Option<Fading>,
    /// Label shown in the converter while `int(...)`/`float(...)` runs
    pub converting: Option<String>,
    pub input: Option<InputRequest>,
    revisions: FxHashMap<AnimationHandle, Revision>,
}

impl StageState {
    pub fn box_index(&self, name: &str) -> Option<usize> {
        self.boxes.iter().position(|b| b.name == name)
    }

    pub fn is_animating(&self) -> bool {
        !self.sparks.is_empty() || self.fading.is_some() || self.converting.is_some()
    }

    fn reset(&mut self) {
        if let Some(request) = self.input.take() {
            request.cancel();
        }
        *self = StageState::default();
    }
}

pub type SharedStage = Arc<Mutex<StageState>>;

/// Lock the stage, recovering from a poisoned lock
pub fn lock(stage: &SharedStage) -> MutexGuard<'_, StageState> {
    stage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TuiRenderer {
    stage: SharedStage,
    speed: f64,
    next_handle: u64,
}

impl TuiRenderer {
    pub fn new(stage: SharedStage, speed: f64) -> Self {
        TuiRenderer {
            stage,
            speed,
            next_handle: 0,
        }
    }

    fn tween(&self, timing: Timing) -> Tween {
        Tween::new(timing, self.speed)
    }

    async fn wait(&self, tween: Tween) {
        let duration = tween.duration();
        if duration > Duration::ZERO {
            tokio::time::sleep(duration).await;
        }
    }

    /// Launch `sparks` together and wait until they land
    async fn fly(&self, sparks: Vec<(String, Anchor, Anchor)>, timing: Timing) {
        if sparks.is_empty() {
            return;
        }
        let tween = self.tween(timing);
        {
            let mut stage = lock(&self.stage);
            let started = Instant::now();
            stage.sparks = sparks
                .into_iter()
                .map(|(label, from, to)| Spark {
                    label,
                    from,
                    to,
                    tween,
                    started,
                })
                .collect();
        }
        self.wait(tween).await;
        lock(&self.stage).sparks.clear();
    }

    async fn convert(&self, label: &str) {
        lock(&self.stage).converting = Some(label.to_string());
        self.wait(self.tween(CONVERTER)).await;
        lock(&self.stage).converting = None;
    }

    /// Create or update the memory box and remember what it replaced
    async fn land(&self, handle: AnimationHandle, slot: &MemorySlot, timing: Timing) {
        let pop = self.tween(timing);
        {
            let mut stage = lock(&self.stage);
            let previous = match stage.box_index(&slot.name) {
                Some(i) => {
                    let b = &mut stage.boxes[i];
                    let previous = std::mem::replace(&mut b.value, slot.value.clone());
                    b.pop = pop;
                    b.changed = Instant::now();
                    Some(previous)
                }
                None => {
                    stage.boxes.push(MemoryBox {
                        name: slot.name.clone(),
                        value: slot.value.clone(),
                        pop,
                        changed: Instant::now(),
                    });
                    None
                }
            };
            stage.revisions.insert(
                handle,
                Revision {
                    name: slot.name.clone(),
                    previous,
                },
            );
        }
        self.wait(pop).await;
    }

    fn issue_handle(&mut self) -> AnimationHandle {
        self.next_handle += 1;
        AnimationHandle(self.next_handle)
    }
}

#[async_trait]
impl Renderer for TuiRenderer {
    async fn capture_input(&mut self, prompt: &str) -> Option<String> {
        let (reply, answer) = oneshot::channel();
        lock(&self.stage).input = Some(InputRequest {
            prompt: prompt.to_string(),
            value: String::new(),
            reply,
        });
        answer.await.ok().flatten()
    }

    async fn play(&mut self, intent: &AnimationIntent) -> Result<AnimationHandle, RenderError> {
        let handle = self.issue_handle();
        debug!(handle = handle.0, line = intent.line() + 1, "playing animation");

        match intent {
            AnimationIntent::InputToMemory {
                value,
                converted,
                slot,
                ..
            } => {
                let Some(slot) = slot else {
                    return Ok(handle);
                };
                if *converted {
                    self.convert(value).await;
                }
                self.fly(
                    vec![(value.clone(), Anchor::Console, Anchor::Memory(slot.name.clone()))],
                    INPUT_SPARK,
                )
                .await;
                self.land(handle, slot, BOX_POP).await;
            }
            AnimationIntent::ValueToMemory { line, slot } => {
                let Some(slot) = slot else {
                    return Ok(handle);
                };
                self.fly(
                    vec![(
                        slot.value.clone(),
                        Anchor::SourceLine(*line),
                        Anchor::Memory(slot.name.clone()),
                    )],
                    ASSIGNMENT_SPARK,
                )
                .await;
                self.land(handle, slot, BOX_POP).await;
            }
            AnimationIntent::Calculation {
                line,
                operands,
                slot,
                ..
            } => {
                let Some(slot) = slot else {
                    return Ok(handle);
                };
                let target = Anchor::Memory(slot.name.clone());
                let sparks = operands
                    .iter()
                    .map(|o| (o.clone(), Anchor::SourceLine(*line), target.clone()))
                    .collect();
                self.fly(sparks, ASSIGNMENT_SPARK).await;
                self.land(handle, slot, CALCULATION_BOX).await;
            }
            AnimationIntent::PrintToOutput { line, sparks, text } => {
                let flights = sparks
                    .iter()
                    .map(|s| {
                        let from = match &s.part {
                            PrintPart::Variable { name } => Anchor::Memory(name.clone()),
                            PrintPart::Literal { .. } => Anchor::SourceLine(*line),
                        };
                        (s.label.clone(), from, Anchor::Console)
                    })
                    .collect();
                self.fly(flights, PRINT_SPARK).await;

                let text = text.clone().unwrap_or_else(|| {
                    sparks
                        .iter()
                        .map(|s| s.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                });
                let slide = self.tween(OUTPUT_LINE);
                lock(&self.stage).lines.push(OutputLine {
                    handle,
                    text,
                    slide,
                    appeared: Instant::now(),
                });
                self.wait(slide).await;
            }
        }
        Ok(handle)
    }

    async fn reverse(&mut self, entry: &HistoryEntry) -> Result<(), RenderError> {
        {
            let mut stage = lock(&self.stage);
            let fading = match entry.kind {
                HistoryKind::Memory => stage
                    .revisions
                    .get(&entry.handle)
                    .map(|r| Fading::Memory(r.name.clone())),
                HistoryKind::Output => Some(Fading::Output(entry.handle)),
            };
            if fading.is_none() {
                return Ok(());
            }
            stage.fading = fading;
        }
        self.wait(self.tween(REVERSE)).await;

        let mut stage = lock(&self.stage);
        stage.fading = None;
        match entry.kind {
            HistoryKind::Memory => {
                if let Some(revision) = stage.revisions.remove(&entry.handle) {
                    match (stage.box_index(&revision.name), revision.previous) {
                        (Some(i), Some(previous)) => stage.boxes[i].value = previous,
                        (Some(i), None) => {
                            stage.boxes.remove(i);
                        }
                        (None, _) => {}
                    }
                }
            }
            HistoryKind::Output => {
                if entry.is_new {
                    stage.lines.retain(|l| l.handle != entry.handle);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        lock(&self.stage).reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PrintSpark;

    fn renderer() -> (TuiRenderer, SharedStage) {
        let stage = SharedStage::default();
        // Speed zero: every tween completes immediately
        (TuiRenderer::new(stage.clone(), 0.0), stage)
    }

    fn slot(name: &str, value: &str, is_new: bool) -> Option<MemorySlot> {
        Some(MemorySlot {
            name: name.into(),
            value: value.into(),
            is_new,
        })
    }

    #[tokio::test]
    async fn test_update_then_reverse_restores_value() {
        let (mut r, stage) = renderer();
        let first = AnimationIntent::ValueToMemory {
            line: 0,
            slot: slot("x", "1", true),
        };
        let second = AnimationIntent::ValueToMemory {
            line: 1,
            slot: slot("x", "2", false),
        };
        let h1 = r.play(&first).await.expect("play");
        let h2 = r.play(&second).await.expect("play");
        assert_eq!(lock(&stage).boxes[0].value, "2");

        r.reverse(&HistoryEntry::new(&second, h2)).await.expect("reverse");
        assert_eq!(lock(&stage).boxes[0].value, "1");

        r.reverse(&HistoryEntry::new(&first, h1)).await.expect("reverse");
        assert!(lock(&stage).boxes.is_empty());
    }

    #[tokio::test]
    async fn test_print_adds_and_reverse_removes_line() {
        let (mut r, stage) = renderer();
        let intent = AnimationIntent::PrintToOutput {
            line: 0,
            sparks: vec![PrintSpark {
                part: PrintPart::Literal {
                    value: "Hello World!".into(),
                },
                label: "Hello World!".into(),
            }],
            text: Some("Hello World!".into()),
        };
        let handle = r.play(&intent).await.expect("play");
        assert_eq!(lock(&stage).lines[0].text, "Hello World!");
        r.reverse(&HistoryEntry::new(&intent, handle)).await.expect("reverse");
        assert!(lock(&stage).lines.is_empty());
    }

    #[tokio::test]
    async fn test_capture_input_round_trip() {
        let (mut r, stage) = renderer();
        let answering = {
            let stage = stage.clone();
            tokio::spawn(async move {
                loop {
                    let request = lock(&stage).input.take();
                    if let Some(mut request) = request {
                        request.value.push_str("Ada");
                        request.submit();
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };
        assert_eq!(r.capture_input("Enter your name: ").await.as_deref(), Some("Ada"));
        answering.await.expect("join");
    }

    #[tokio::test]
    async fn test_clear_cancels_pending_input() {
        let (mut r, stage) = renderer();
        let pending = tokio::spawn(async move { r.capture_input("?").await });
        while lock(&stage).input.is_none() {
            tokio::task::yield_now().await;
        }
        lock(&stage).reset();
        assert_eq!(pending.await.expect("join"), None);
    }
}
