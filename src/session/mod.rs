//! Step controller
//!
//! A [`Session`] owns one run of one program: the executor namespace, the
//! plan, the variable store, the animation history and the teacher bubble.
//!
//! ```text
//!          Run            ok              Step*            last Step
//!   Idle ──────> Validating ──> Ready ──────────> Stepping ──────────> Complete
//!    ^                │                             │  ^ Back
//!    └── SyntaxError ─┘                  RuntimeErr │  └────┘
//!                                                   v
//!                                                 Failed ── Run/Reset ──> ...
//! ```
//!
//! While running: `0 <= current <= total` and `history.len() == current`.

pub mod handle;

pub use handle::SharedSession;

use crate::animation::{
    dispatch, AnimationHandle, AnimationIntent, HistoryEntry, RenderError, Renderer,
};
use crate::executor::{CodeExecutor, ExecError, TEMP_INPUT_NAME};
use crate::explain::{Explanation, ExplanationRequester};
use crate::lesson::calls::{input_prompt, substitute_input_call};
use crate::lesson::{ExecutionPlan, Lesson, LineKind, Step};
use crate::store::{VariableBinding, VariableStore};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_VALIDATED_MESSAGE: &str =
    "✅ Code validated! Click 'Next Step' to see how Python executes it line by line.";
pub const DEFAULT_COMPLETION_MESSAGE: &str =
    "🎉 Excellent! You've stepped through the whole program! Try changing the code and running again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Ready,
    Stepping,
    Complete,
    Failed,
}

impl Phase {
    /// A plan exists and Step/Back may apply
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Validating | Phase::Ready | Phase::Stepping)
    }

    /// The learner may edit the source
    pub fn is_editable(self) -> bool {
        matches!(self, Phase::Idle | Phase::Complete | Phase::Failed)
    }
}

/// What Back does to the execution state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackPolicy {
    /// Re-execute steps `0..current-1` in a fresh namespace and rebuild the store
    #[default]
    Replay,
    /// Only reverse the animation; executor and store keep their state
    ViewOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no program is running; press Run first")]
    NotRunning,
    #[error("every step has already run")]
    NothingToStep,
    #[error("already at the first step")]
    AtStart,
    #[error("a run is in progress; reset before running again")]
    RunInProgress,
    #[error("there is no code to run")]
    EmptySource,
    #[error("input is required to continue")]
    InputRequired,
    #[error("busy with the previous action")]
    Busy,
    #[error("cancelled by reset")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Error,
}

/// Contents of the teacher bubble
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeacherMessage {
    pub text: String,
    pub tone: Tone,
}

impl TeacherMessage {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        TeacherMessage {
            text: text.into(),
            tone,
        }
    }
}

/// Read-only picture of a session, published after every state change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
    /// 0-based source line of the most recently executed step
    pub active_line: Option<usize>,
    /// 0-based source line of the last error, when it has one
    pub error_line: Option<usize>,
    pub error: Option<String>,
    pub variables: Vec<VariableBinding>,
    pub output: String,
    pub teacher: TeacherMessage,
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Validated; `total` steps are ready
    Ready { total: usize },
    /// Validation failed; the session is editable again
    SyntaxError {
        error: ExecError,
        explanation: Explanation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Stepped {
        step: Step,
        intent: AnimationIntent,
        explanation: Explanation,
    },
    /// The last step ran
    Complete {
        step: Step,
        intent: AnimationIntent,
        explanation: Explanation,
        celebration: String,
    },
    /// The step raised; nothing was recorded for it
    Failed {
        step: Step,
        error: ExecError,
        explanation: Explanation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackOutcome {
    pub current: usize,
    pub reversed: HistoryEntry,
}

pub struct Session<E: CodeExecutor, R: Renderer> {
    executor: E,
    renderer: R,
    requester: ExplanationRequester,
    lesson: Option<&'static Lesson>,
    policy: BackPolicy,

    source: String,
    plan: ExecutionPlan,
    phase: Phase,
    current: usize,
    history: Vec<HistoryEntry>,
    /// Value typed for each executed step (`None` for non-input steps)
    inputs: Vec<Option<String>>,
    store: VariableStore,
    last_error: Option<ExecError>,
    error_line: Option<usize>,
    teacher: TeacherMessage,

    cancel: Arc<AtomicBool>,
    view: watch::Sender<SessionView>,
}

impl<E: CodeExecutor, R: Renderer> Session<E, R> {
    pub fn new(executor: E, renderer: R, requester: ExplanationRequester) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Session {
            executor,
            renderer,
            requester,
            lesson: None,
            policy: BackPolicy::default(),
            source: String::new(),
            plan: ExecutionPlan::default(),
            phase: Phase::Idle,
            current: 0,
            history: Vec::new(),
            inputs: Vec::new(),
            store: VariableStore::new(),
            last_error: None,
            error_line: None,
            teacher: TeacherMessage::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            view,
        }
    }

    pub fn with_lesson(mut self, lesson: &'static Lesson) -> Self {
        self.lesson = Some(lesson);
        self
    }

    pub fn with_back_policy(mut self, policy: BackPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ===== Accessors =====

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn total_steps(&self) -> usize {
        self.plan.len()
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn last_error(&self) -> Option<&ExecError> {
        self.last_error.as_ref()
    }

    pub fn teacher(&self) -> &TeacherMessage {
        &self.teacher
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Headless callers use this to queue inputs between steps
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Inputs typed so far in this run, in order
    pub fn input_history(&self) -> Vec<String> {
        self.inputs.iter().flatten().cloned().collect()
    }

    pub fn output(&self) -> String {
        self.executor.read_stdout()
    }

    /// Flag checked between stages; setting it makes the in-flight action
    /// stop with [`SessionError::Cancelled`].
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            current: self.current,
            total: self.plan.len(),
            active_line: self
                .current
                .checked_sub(1)
                .and_then(|i| self.plan.get(i))
                .map(|s| s.line_number),
            error_line: self.error_line,
            error: self.last_error.as_ref().map(|e| e.message().to_string()),
            variables: self.store.iter().cloned().collect(),
            output: self.executor.read_stdout(),
            teacher: self.teacher.clone(),
            inputs: self.input_history(),
        }
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }

    fn check_cancelled(&self) -> Result<(), SessionError> {
        if self.cancel.load(Ordering::SeqCst) {
            debug!("action cancelled");
            Err(SessionError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn say(&mut self, text: impl Into<String>, tone: Tone) {
        self.teacher = TeacherMessage::new(text, tone);
    }

    // ===== Transitions =====

    /// Validate `source` and build a fresh plan.
    pub async fn run(&mut self, source: &str) -> Result<RunOutcome, SessionError> {
        if self.phase.is_running() {
            return Err(SessionError::RunInProgress);
        }
        if source.trim().is_empty() {
            return Err(SessionError::EmptySource);
        }

        self.clear_run_state();
        self.source = source.to_string();
        self.phase = Phase::Validating;
        self.publish();

        let validated = ExecutionPlan::validated(source, &mut self.executor).await;
        self.check_cancelled()?;

        match validated {
            Ok(plan) => {
                info!(steps = plan.len(), "program validated");
                self.plan = plan;
                self.phase = Phase::Ready;
                let message = self
                    .lesson
                    .map_or(DEFAULT_VALIDATED_MESSAGE, |l| l.validated_message);
                self.say(message, Tone::Info);
                self.publish();
                Ok(RunOutcome::Ready {
                    total: self.plan.len(),
                })
            }
            Err(error) => {
                warn!(error = %error, "validation failed");
                self.phase = Phase::Failed;
                self.error_line = error.line().map(|l| l.saturating_sub(1));
                self.last_error = Some(error.clone());
                self.publish();

                let explanation = self.requester.explain_error(source, &error).await;
                self.check_cancelled()?;
                self.say(explanation.text.clone(), Tone::Error);
                // Syntax errors hand the editor straight back
                self.phase = Phase::Idle;
                self.publish();
                Ok(RunOutcome::SyntaxError { error, explanation })
            }
        }
    }

    /// Execute the next step and play its animation.
    pub async fn step(&mut self) -> Result<StepOutcome, SessionError> {
        match self.phase {
            Phase::Ready | Phase::Stepping => {}
            Phase::Complete => return Err(SessionError::NothingToStep),
            _ => return Err(SessionError::NotRunning),
        }
        let step = self
            .plan
            .get(self.current)
            .cloned()
            .ok_or(SessionError::NothingToStep)?;

        let captured = match step.kind {
            LineKind::Input => Some(self.capture_input(&step).await?),
            _ => None,
        };
        self.check_cancelled()?;

        let written_before = self.executor.read_stdout().len();
        if let Err(error) = self.execute(&step, captured.as_deref()).await {
            warn!(line = step.line_number + 1, error = %error, "step failed");
            self.phase = Phase::Failed;
            self.error_line = Some(step.line_number);
            self.last_error = Some(error.clone());
            self.publish();

            let explanation = self.requester.explain_error(&step.code, &error).await;
            self.check_cancelled()?;
            self.say(
                format!("🔍 What went wrong: {}", explanation.text),
                Tone::Error,
            );
            self.publish();
            return Ok(StepOutcome::Failed {
                step,
                error,
                explanation,
            });
        }

        let snapshot = self.executor.snapshot();
        let changes = self.store.apply_diff(&step, &snapshot);
        let stdout = self.executor.read_stdout();
        let written = stdout.get(written_before..).unwrap_or_default();
        let intent = dispatch(&step, &self.store, &changes, written, captured.as_deref());
        debug!(line = step.line_number + 1, kind = %step.kind, "step executed");

        let handle = match self.renderer.play(&intent).await {
            Ok(handle) => handle,
            Err(RenderError::Cancelled) => return Err(SessionError::Cancelled),
            Err(e) => {
                warn!(error = %e, "animation failed");
                AnimationHandle::DETACHED
            }
        };
        self.check_cancelled()?;

        self.history.push(HistoryEntry::new(&intent, handle));
        self.inputs.push(captured);
        self.current += 1;
        self.phase = Phase::Stepping;
        self.publish();

        let explanation = self
            .requester
            .explain_step(&step, &self.store, &stdout)
            .await;
        self.check_cancelled()?;
        self.say(explanation.text.clone(), Tone::Info);

        if self.current == self.plan.len() {
            info!(steps = self.current, "run complete");
            self.phase = Phase::Complete;
            let celebration = self
                .lesson
                .map_or(DEFAULT_COMPLETION_MESSAGE, |l| l.completion_message)
                .to_string();
            self.say(celebration.clone(), Tone::Success);
            self.publish();
            return Ok(StepOutcome::Complete {
                step,
                intent,
                explanation,
                celebration,
            });
        }

        self.publish();
        Ok(StepOutcome::Stepped {
            step,
            intent,
            explanation,
        })
    }

    /// Undo the most recent step's animation (and, under
    /// [`BackPolicy::Replay`], its effect on the namespace).
    pub async fn back(&mut self) -> Result<BackOutcome, SessionError> {
        match self.phase {
            Phase::Ready | Phase::Stepping | Phase::Complete => {}
            _ => return Err(SessionError::NotRunning),
        }
        let entry = self.history.pop().ok_or(SessionError::AtStart)?;
        self.current -= 1;
        self.inputs.truncate(self.current);
        self.phase = Phase::Stepping;

        if let Err(e) = self.renderer.reverse(&entry).await {
            warn!(error = %e, "reverse animation failed");
        }
        self.check_cancelled()?;

        if self.policy == BackPolicy::Replay {
            self.replay().await;
        }

        self.say(
            format!("Back to Step {}. Click 'Next Step' to continue.", self.current),
            Tone::Info,
        );
        self.publish();
        Ok(BackOutcome {
            current: self.current,
            reversed: entry,
        })
    }

    /// Discard the run. Safe to call in any phase.
    pub fn reset(&mut self) {
        self.clear_run_state();
        self.source.clear();
        self.phase = Phase::Idle;
        self.teacher = TeacherMessage::default();
        self.cancel.store(false, Ordering::SeqCst);
        info!("session reset");
        self.publish();
    }

    fn clear_run_state(&mut self) {
        self.executor.reset();
        self.renderer.clear();
        self.plan = ExecutionPlan::default();
        self.current = 0;
        self.history.clear();
        self.inputs.clear();
        self.store.clear();
        self.last_error = None;
        self.error_line = None;
    }

    // ===== Helpers =====

    async fn capture_input(&mut self, step: &Step) -> Result<String, SessionError> {
        let prompt = input_prompt(&step.code);
        let value = self
            .renderer
            .capture_input(&prompt)
            .await
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(SessionError::InputRequired)?;
        Ok(value)
    }

    /// Run one step. Input steps bind the captured value to a temporary
    /// global and execute the line with its `input(...)` call replaced.
    async fn execute(&mut self, step: &Step, captured: Option<&str>) -> Result<(), ExecError> {
        match captured {
            Some(value) => {
                self.executor.set_global(TEMP_INPUT_NAME, value);
                let statement = substitute_input_call(&step.code, TEMP_INPUT_NAME)
                    .unwrap_or_else(|| step.code.clone());
                self.executor.execute(&statement).await
            }
            None => self.executor.execute(&step.code).await,
        }
    }

    /// Rebuild namespace and store from the steps still in history.
    async fn replay(&mut self) {
        self.executor.reset();
        self.store.clear();
        let steps: Vec<Step> = self.plan.steps()[..self.current].to_vec();
        let inputs = self.inputs.clone();
        for (step, captured) in steps.iter().zip(inputs) {
            if let Err(error) = self.execute(step, captured.as_deref()).await {
                // Deterministic programs never get here
                warn!(line = step.line_number + 1, error = %error, "replay diverged");
                self.phase = Phase::Failed;
                self.error_line = Some(step.line_number);
                self.last_error = Some(error);
                return;
            }
            let snapshot = self.executor.snapshot();
            self.store.apply_diff(step, &snapshot);
        }
        debug!(steps = self.current, "namespace replayed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{HistoryKind, RecordingRenderer};
    use crate::executor::PythonExecutor;
    use crate::explain::client::{
        ChatRequest, ExplanationTransport, TutorialRequest, WalkthroughRequest,
    };
    use crate::explain::ExplanationOutcome;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl ExplanationTransport for Offline {
        async fn tutorial(&self, _: &TutorialRequest) -> ExplanationOutcome {
            ExplanationOutcome::TransportFailure("offline".into())
        }
        async fn walkthrough(&self, _: &WalkthroughRequest) -> ExplanationOutcome {
            ExplanationOutcome::TransportFailure("offline".into())
        }
        async fn chat(&self, _: &ChatRequest) -> ExplanationOutcome {
            ExplanationOutcome::TransportFailure("offline".into())
        }
    }

    fn session(inputs: &[&str]) -> Session<PythonExecutor, RecordingRenderer> {
        Session::new(
            PythonExecutor::new(),
            RecordingRenderer::with_inputs(inputs.iter().copied()),
            ExplanationRequester::new(Arc::new(Offline), Duration::from_secs(1)),
        )
    }

    const AREA: &str = "length = 10\nbreadth = 20\narea = length * breadth\nprint(area)";

    #[tokio::test]
    async fn test_step_before_run_rejected() {
        let mut s = session(&[]);
        assert_eq!(s.step().await, Err(SessionError::NotRunning));
        assert_eq!(s.back().await, Err(SessionError::NotRunning));
    }

    #[tokio::test]
    async fn test_run_then_step_to_completion() {
        let mut s = session(&[]);
        assert_eq!(s.run(AREA).await, Ok(RunOutcome::Ready { total: 4 }));
        assert_eq!(s.phase(), Phase::Ready);

        for i in 0..4 {
            let outcome = s.step().await.expect("step");
            assert_eq!(s.current_step(), i + 1);
            assert_eq!(s.history().len(), i + 1);
            if i == 3 {
                assert!(matches!(outcome, StepOutcome::Complete { .. }));
            }
        }
        assert_eq!(s.phase(), Phase::Complete);
        assert_eq!(s.store().get("area"), Some("200"));
        assert_eq!(s.step().await, Err(SessionError::NothingToStep));
        assert_eq!(s.teacher().tone, Tone::Success);
    }

    #[tokio::test]
    async fn test_back_reverses_last_entry() {
        let mut s = session(&[]);
        s.run(AREA).await.expect("run");
        s.step().await.expect("step");
        s.step().await.expect("step");

        let back = s.back().await.expect("back");
        assert_eq!(back.current, 1);
        assert_eq!(back.reversed.kind, HistoryKind::Memory);
        assert!(back.reversed.is_new);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.renderer().reversed.len(), 1);
        // Replay dropped the binding made by the undone step
        assert_eq!(s.store().get("breadth"), None);
        assert_eq!(s.teacher().text, "Back to Step 1. Click 'Next Step' to continue.");

        s.back().await.expect("back");
        assert_eq!(s.back().await, Err(SessionError::AtStart));
    }

    #[tokio::test]
    async fn test_view_only_back_keeps_namespace() {
        let mut s = session(&[]).with_back_policy(BackPolicy::ViewOnly);
        s.run(AREA).await.expect("run");
        s.step().await.expect("step");
        s.step().await.expect("step");
        s.back().await.expect("back");
        assert_eq!(s.store().get("breadth"), Some("20"));
    }

    #[tokio::test]
    async fn test_syntax_error_returns_to_idle() {
        let mut s = session(&[]);
        let outcome = s.run("x = = 1").await.expect("run");
        assert!(matches!(outcome, RunOutcome::SyntaxError { .. }));
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.last_error().is_some_and(|e| e.is_syntax()));
        assert_eq!(s.teacher().tone, Tone::Error);
    }

    #[tokio::test]
    async fn test_runtime_error_halts_without_history() {
        let mut s = session(&[]);
        s.run("x = 1\ny = x / 0\nprint(y)").await.expect("run");
        s.step().await.expect("step");
        let outcome = s.step().await.expect("step");
        assert!(matches!(outcome, StepOutcome::Failed { .. }));
        assert_eq!(s.phase(), Phase::Failed);
        assert_eq!(s.current_step(), 1);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.view().error_line, Some(1));
        assert_eq!(s.step().await, Err(SessionError::NotRunning));

        // A fresh run is always possible
        assert_eq!(s.run("x = 2").await, Ok(RunOutcome::Ready { total: 1 }));
    }

    #[tokio::test]
    async fn test_input_step_converts_through_interpreter() {
        let mut s = session(&["4", "5"]);
        s.run("a = int(input())\nb = int(input())\nprint(a + b)")
            .await
            .expect("run");
        for _ in 0..3 {
            s.step().await.expect("step");
        }
        assert_eq!(s.store().get("a"), Some("4"));
        assert_eq!(s.output(), "9\n");
        assert_eq!(s.input_history(), vec!["4", "5"]);
        assert!(!s.store().contains(TEMP_INPUT_NAME));
        assert_eq!(s.renderer().prompts, vec!["Enter value:", "Enter value:"]);
    }

    #[tokio::test]
    async fn test_missing_input_leaves_state_untouched() {
        let mut s = session(&[]);
        s.run("name = input(\"Enter your name: \")").await.expect("run");
        assert_eq!(s.step().await, Err(SessionError::InputRequired));
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_replay_reinjects_inputs() {
        let mut s = session(&["Ada"]);
        s.run("name = input(\"Enter your name: \")\nprint(name)\nx = 1")
            .await
            .expect("run");
        for _ in 0..3 {
            s.step().await.expect("step");
        }
        s.back().await.expect("back");
        assert_eq!(s.store().get("name"), Some("Ada"));
        assert_eq!(s.output(), "Ada\n");
        assert_eq!(s.store().get("x"), None);
    }

    #[tokio::test]
    async fn test_cancel_flag_aborts_action() {
        let mut s = session(&[]);
        s.run(AREA).await.expect("run");
        s.cancel_flag().store(true, Ordering::SeqCst);
        assert_eq!(s.step().await, Err(SessionError::Cancelled));
        s.reset();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.run(AREA).await, Ok(RunOutcome::Ready { total: 4 }));
    }

    #[tokio::test]
    async fn test_view_published() {
        let mut s = session(&[]);
        let rx = s.subscribe();
        s.run(AREA).await.expect("run");
        s.step().await.expect("step");
        let view = rx.borrow().clone();
        assert_eq!(view.current, 1);
        assert_eq!(view.total, 4);
        assert_eq!(view.active_line, Some(0));
        assert_eq!(view.variables.len(), 1);
    }
}
