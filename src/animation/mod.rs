//! Animation dispatch
//!
//! After a step executes, [`dispatch`] turns the step and the resulting data
//! into one [`AnimationIntent`] from a closed set. A [`Renderer`] plays the
//! intent and hands back an opaque [`AnimationHandle`], which the session
//! keeps in its history so the animation can be reversed on Back.
//!
//! ```text
//! Step.kind ──┬─ Input        ──> InputToMemory   (console -> memory slot)
//!             ├─ Assignment   ──> ValueToMemory   (source  -> memory slot)
//!             ├─ Calculation  ──> Calculation     (operands converge -> slot)
//!             └─ Print        ──> PrintToOutput   (each argument -> output line)
//! ```

pub mod recording;
pub mod tween;

pub use recording::RecordingRenderer;

use crate::executor::newest_output_line;
use crate::lesson::calls::{
    assignment_target, calculation_parts, input_is_converted, input_prompt, print_parts, PrintPart,
};
use crate::lesson::{LineKind, Step};
use crate::store::{BindingChange, VariableStore};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Memory box targeted by an animation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySlot {
    pub name: String,
    pub value: String,
    /// The box is created by this step (pops in) rather than updated
    pub is_new: bool,
}

/// One print argument on its way to the console
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintSpark {
    pub part: PrintPart,
    /// Label carried by the spark
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum AnimationIntent {
    /// Captured value flows from the console into memory
    InputToMemory {
        line: usize,
        prompt: String,
        value: String,
        /// `int(input())` style: a converter stage plays on the way
        converted: bool,
        slot: Option<MemorySlot>,
    },
    /// Value flows from the source line into memory
    ValueToMemory { line: usize, slot: Option<MemorySlot> },
    /// Operand values converge into the result box
    Calculation {
        line: usize,
        operands: Vec<String>,
        operator: Option<char>,
        slot: Option<MemorySlot>,
    },
    /// Every argument converges into a new output line
    PrintToOutput {
        line: usize,
        sparks: Vec<PrintSpark>,
        text: Option<String>,
    },
}

impl AnimationIntent {
    /// 0-based source line the animation starts from
    pub fn line(&self) -> usize {
        match self {
            AnimationIntent::InputToMemory { line, .. }
            | AnimationIntent::ValueToMemory { line, .. }
            | AnimationIntent::Calculation { line, .. }
            | AnimationIntent::PrintToOutput { line, .. } => *line,
        }
    }

    pub fn slot(&self) -> Option<&MemorySlot> {
        match self {
            AnimationIntent::InputToMemory { slot, .. }
            | AnimationIntent::ValueToMemory { slot, .. }
            | AnimationIntent::Calculation { slot, .. } => slot.as_ref(),
            AnimationIntent::PrintToOutput { .. } => None,
        }
    }

    pub fn history_kind(&self) -> HistoryKind {
        match self {
            AnimationIntent::PrintToOutput { .. } => HistoryKind::Output,
            _ => HistoryKind::Memory,
        }
    }

    /// Whether the played animation created its target element
    pub fn creates_element(&self) -> bool {
        match self {
            AnimationIntent::PrintToOutput { .. } => true,
            _ => self.slot().is_some_and(|slot| slot.is_new),
        }
    }
}

/// Opaque reference to a rendered element, issued by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AnimationHandle(pub u64);

impl AnimationHandle {
    /// Stands in when rendering failed; reversing it does nothing
    pub const DETACHED: AnimationHandle = AnimationHandle(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HistoryKind {
    Memory,
    Output,
}

/// What Back needs to visually undo one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub handle: AnimationHandle,
    /// Reversal removes the element instead of restoring it
    pub is_new: bool,
}

impl HistoryEntry {
    pub fn new(intent: &AnimationIntent, handle: AnimationHandle) -> Self {
        HistoryEntry {
            kind: intent.history_kind(),
            handle,
            is_new: intent.creates_element(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("animation cancelled")]
    Cancelled,
    #[error("render failed: {0}")]
    Failed(String),
}

/// Rendering capability the session drives
#[async_trait]
pub trait Renderer: Send {
    /// Ask the learner for one line of input; `None` when they back out.
    async fn capture_input(&mut self, prompt: &str) -> Option<String>;

    /// Play `intent` to completion.
    async fn play(&mut self, intent: &AnimationIntent) -> Result<AnimationHandle, RenderError>;

    /// Visually undo a previously played animation.
    async fn reverse(&mut self, entry: &HistoryEntry) -> Result<(), RenderError>;

    /// Drop every rendered element (reset / new run).
    fn clear(&mut self);
}

/// Pick the animation for a step that just executed successfully.
///
/// `changes` is what the variable store reported for this step, `written` the
/// output this step alone produced and `captured` the value typed for an
/// Input step.
pub fn dispatch(
    step: &Step,
    store: &VariableStore,
    changes: &[BindingChange],
    written: &str,
    captured: Option<&str>,
) -> AnimationIntent {
    let line = step.line_number;
    match step.kind {
        LineKind::Input => AnimationIntent::InputToMemory {
            line,
            prompt: input_prompt(&step.code),
            value: captured.unwrap_or_default().to_string(),
            converted: input_is_converted(&step.code),
            slot: memory_slot(&step.code, store, changes),
        },
        LineKind::Assignment => AnimationIntent::ValueToMemory {
            line,
            slot: memory_slot(&step.code, store, changes),
        },
        LineKind::Calculation => {
            let parts = calculation_parts(&step.code);
            let operands = parts
                .as_ref()
                .map(|p| vec![operand_value(&p.left, store), operand_value(&p.right, store)])
                .unwrap_or_default();
            AnimationIntent::Calculation {
                line,
                operands,
                operator: parts.map(|p| p.operator),
                slot: memory_slot(&step.code, store, changes),
            }
        }
        LineKind::Print => AnimationIntent::PrintToOutput {
            line,
            sparks: print_parts(&step.code)
                .into_iter()
                .map(|part| PrintSpark {
                    label: part.resolve(store),
                    part,
                })
                .collect(),
            // A blank print is its own empty console line
            text: Some(newest_output_line(written).unwrap_or_default().to_string()),
        },
    }
}

fn operand_value(token: &str, store: &VariableStore) -> String {
    store.get(token).unwrap_or(token).to_string()
}

fn memory_slot(code: &str, store: &VariableStore, changes: &[BindingChange]) -> Option<MemorySlot> {
    let name = assignment_target(code)
        .map(str::to_string)
        .or_else(|| changes.first().map(|c| c.name().to_string()))?;
    let value = store.get(&name)?.to_string();
    let is_new = changes
        .iter()
        .any(|c| matches!(c, BindingChange::Created { name: n, .. } if *n == name));
    Some(MemorySlot { name, value, is_new })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::classify;

    fn step(line_number: usize, code: &str) -> Step {
        Step {
            line_number,
            code: code.to_string(),
            kind: classify(code),
        }
    }

    fn store_with(pairs: &[(&str, &str)]) -> (VariableStore, Vec<BindingChange>) {
        let mut store = VariableStore::new();
        let snapshot: Vec<_> = pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        let changes = store.apply_snapshot(&snapshot);
        (store, changes)
    }

    #[test]
    fn test_assignment_creates_slot() {
        let (store, changes) = store_with(&[("length", "10")]);
        let intent = dispatch(&step(0, "length = 10"), &store, &changes, "", None);
        assert_eq!(
            intent,
            AnimationIntent::ValueToMemory {
                line: 0,
                slot: Some(MemorySlot {
                    name: "length".into(),
                    value: "10".into(),
                    is_new: true
                })
            }
        );
        assert_eq!(intent.history_kind(), HistoryKind::Memory);
        assert!(intent.creates_element());
    }

    #[test]
    fn test_update_is_not_new() {
        let (mut store, _) = store_with(&[("x", "1")]);
        let changes = store.apply_snapshot(&[("x".into(), "2".into())]);
        let intent = dispatch(&step(1, "x += 1"), &store, &changes, "", None);
        let slot = intent.slot().expect("slot");
        assert_eq!(slot.value, "2");
        assert!(!slot.is_new);
        assert!(!intent.creates_element());
    }

    #[test]
    fn test_calculation_operands_resolved() {
        let (store, changes) = store_with(&[("length", "10"), ("breadth", "20"), ("area", "200")]);
        let intent = dispatch(
            &step(2, "area = length * breadth"),
            &store,
            &changes[2..],
            "",
            None,
        );
        match intent {
            AnimationIntent::Calculation {
                operands,
                operator,
                slot,
                ..
            } => {
                assert_eq!(operands, vec!["10", "20"]);
                assert_eq!(operator, Some('*'));
                assert_eq!(slot.map(|s| s.value), Some("200".to_string()));
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_print_uses_newest_output_line() {
        let (store, _) = store_with(&[("userNo", "101")]);
        let intent = dispatch(
            &step(3, "print(\"User Number is\", userNo)"),
            &store,
            &[],
            "User Number is 101\n",
            None,
        );
        match &intent {
            AnimationIntent::PrintToOutput { sparks, text, .. } => {
                let labels: Vec<_> = sparks.iter().map(|s| s.label.as_str()).collect();
                assert_eq!(labels, vec!["User Number is", "101"]);
                assert_eq!(text.as_deref(), Some("User Number is 101"));
            }
            other => panic!("unexpected intent {:?}", other),
        }
        assert_eq!(intent.history_kind(), HistoryKind::Output);
        assert!(intent.creates_element());
    }

    #[test]
    fn test_blank_print_renders_empty_line() {
        let (store, _) = store_with(&[]);
        for code in ["print()", "print(\"\")"] {
            match dispatch(&step(1, code), &store, &[], "\n", None) {
                AnimationIntent::PrintToOutput { text, .. } => assert_eq!(text.as_deref(), Some("")),
                other => panic!("unexpected intent {:?}", other),
            }
        }
    }

    #[test]
    fn test_input_intent_carries_prompt_and_conversion() {
        let (store, changes) = store_with(&[("a", "4")]);
        let intent = dispatch(&step(0, "a = int(input())"), &store, &changes, "", Some("4"));
        match intent {
            AnimationIntent::InputToMemory {
                prompt,
                value,
                converted,
                ..
            } => {
                assert_eq!(prompt, "Enter value:");
                assert_eq!(value, "4");
                assert!(converted);
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }
}
