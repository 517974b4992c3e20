//! End-to-end stepping through lessons with a recording renderer

use async_trait::async_trait;
use chalkstep::animation::{AnimationIntent, HistoryKind, RecordingRenderer};
use chalkstep::executor::PythonExecutor;
use chalkstep::explain::client::{ChatRequest, TutorialRequest, WalkthroughRequest};
use chalkstep::explain::{ExplanationOutcome, ExplanationRequester, ExplanationSource, ExplanationTransport};
use chalkstep::lesson;
use chalkstep::session::{
    Phase, RunOutcome, Session, SessionError, SharedSession, StepOutcome, Tone,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers every tutorial request with the same text and counts them
#[derive(Default)]
struct Scripted {
    calls: AtomicUsize,
}

#[async_trait]
impl ExplanationTransport for Scripted {
    async fn tutorial(&self, request: &TutorialRequest) -> ExplanationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ExplanationOutcome::Ok(format!("Python ran `{}`.", request.code))
    }
    async fn walkthrough(&self, _: &WalkthroughRequest) -> ExplanationOutcome {
        ExplanationOutcome::TransportFailure("unused".into())
    }
    async fn chat(&self, _: &ChatRequest) -> ExplanationOutcome {
        ExplanationOutcome::TransportFailure("unused".into())
    }
}

fn session(
    transport: Arc<Scripted>,
    inputs: &[&str],
) -> Session<PythonExecutor, RecordingRenderer> {
    Session::new(
        PythonExecutor::new(),
        RecordingRenderer::with_inputs(inputs.iter().copied()),
        ExplanationRequester::new(transport, Duration::from_secs(1)),
    )
}

async fn step_to_end(s: &mut Session<PythonExecutor, RecordingRenderer>) -> Vec<StepOutcome> {
    let mut outcomes = Vec::new();
    loop {
        let outcome = s.step().await.expect("step");
        let done = !matches!(outcome, StepOutcome::Stepped { .. });
        outcomes.push(outcome);
        if done {
            return outcomes;
        }
    }
}

#[tokio::test]
async fn test_rectangle_area_lesson() {
    let transport = Arc::new(Scripted::default());
    let lesson = lesson::by_id(3).expect("lesson 3");
    let mut s = session(Arc::clone(&transport), &[]).with_lesson(lesson);

    let outcome = s.run(lesson.default_template().source).await.expect("run");
    assert_eq!(outcome, RunOutcome::Ready { total: 4 });
    assert_eq!(s.teacher().text, lesson.validated_message);

    let outcomes = step_to_end(&mut s).await;
    assert_eq!(outcomes.len(), 4);
    assert_eq!(s.phase(), Phase::Complete);

    let bindings: Vec<(String, String)> = s
        .store()
        .iter()
        .map(|b| (b.name.clone(), b.value.clone()))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("length".to_string(), "10".to_string()),
            ("breadth".to_string(), "20".to_string()),
            ("area".to_string(), "200".to_string()),
        ]
    );
    assert_eq!(s.output(), "200\n");

    let played = &s.renderer().played;
    assert!(matches!(played[0], AnimationIntent::ValueToMemory { .. }));
    assert!(matches!(played[1], AnimationIntent::ValueToMemory { .. }));
    match &played[2] {
        AnimationIntent::Calculation {
            operands, operator, ..
        } => {
            assert_eq!(operands, &vec!["10".to_string(), "20".to_string()]);
            assert_eq!(*operator, Some('*'));
        }
        other => panic!("expected a calculation, got {:?}", other),
    }
    assert!(matches!(played[3], AnimationIntent::PrintToOutput { .. }));

    match outcomes.last() {
        Some(StepOutcome::Complete {
            celebration,
            explanation,
            ..
        }) => {
            assert_eq!(celebration, lesson.completion_message);
            assert_eq!(explanation.source, ExplanationSource::Service);
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(s.teacher().tone, Tone::Success);
    // One explanation per step
    assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_back_then_forward_replays_the_same_step() {
    let lesson = lesson::by_id(3).expect("lesson 3");
    let mut s = session(Arc::new(Scripted::default()), &[]);
    s.run(lesson.default_template().source).await.expect("run");
    for _ in 0..3 {
        s.step().await.expect("step");
    }

    let back = s.back().await.expect("back");
    assert_eq!(back.current, 2);
    assert_eq!(back.reversed.kind, HistoryKind::Memory);
    assert_eq!(s.store().get("area"), None);

    s.step().await.expect("step again");
    assert_eq!(s.current_step(), 3);
    assert_eq!(s.history().len(), 3);
    assert_eq!(s.store().get("area"), Some("200"));
}

#[tokio::test]
async fn test_user_input_lesson() {
    let lesson = lesson::by_id(4).expect("lesson 4");
    let mut s = session(Arc::new(Scripted::default()), &["Ada"]);
    s.run(lesson.default_template().source).await.expect("run");

    let outcomes = step_to_end(&mut s).await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(s.renderer().prompts, vec!["Enter your name: ".to_string()]);
    assert_eq!(s.store().get("name"), Some("Ada"));
    assert_eq!(s.output(), "Ada\n");
    assert_eq!(s.input_history(), vec!["Ada".to_string()]);

    match &s.renderer().played[0] {
        AnimationIntent::InputToMemory {
            value, converted, ..
        } => {
            assert_eq!(value, "Ada");
            assert!(!converted);
        }
        other => panic!("expected input animation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_number_addition_converts_inputs() {
    let lesson = lesson::by_id(5).expect("lesson 5");
    let mut s = session(Arc::new(Scripted::default()), &["3", "4"]);
    s.run(lesson.templates[1].source).await.expect("run");
    step_to_end(&mut s).await;
    assert_eq!(s.output(), "7\n");
    assert!(matches!(
        s.renderer().played[0],
        AnimationIntent::InputToMemory {
            converted: true,
            ..
        }
    ));

    let mut text = session(Arc::new(Scripted::default()), &["3", "4"]);
    text.run(lesson.templates[0].source).await.expect("run");
    step_to_end(&mut text).await;
    assert_eq!(text.output(), "34\n");
}

#[tokio::test]
async fn test_missing_input_leaves_step_pending() {
    let lesson = lesson::by_id(4).expect("lesson 4");
    let mut s = session(Arc::new(Scripted::default()), &[]);
    s.run(lesson.default_template().source).await.expect("run");

    assert_eq!(s.step().await, Err(SessionError::InputRequired));
    assert_eq!(s.current_step(), 0);
    assert_eq!(s.phase(), Phase::Ready);

    s.renderer_mut().push_input("Grace");
    s.step().await.expect("step with input");
    assert_eq!(s.store().get("name"), Some("Grace"));
}

#[tokio::test]
async fn test_runtime_error_then_fresh_run() {
    let mut s = session(Arc::new(Scripted::default()), &[]);
    s.run("total = 5\nprint(totl)").await.expect("run");
    s.step().await.expect("step");

    match s.step().await.expect("step") {
        StepOutcome::Failed { error, .. } => assert!(error.message().contains("NameError")),
        other => panic!("expected a failure, got {:?}", other),
    }
    let view = s.view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.error_line, Some(1));
    assert_eq!(view.teacher.tone, Tone::Error);

    s.run("total = 5\nprint(total)").await.expect("rerun");
    step_to_end(&mut s).await;
    assert_eq!(s.output(), "5\n");
}

#[tokio::test]
async fn test_large_power_steps_to_completion() {
    let mut s = session(Arc::new(Scripted::default()), &[]);
    s.run("big = 10 ** 20\nprint(big)").await.expect("run");
    let outcomes = step_to_end(&mut s).await;
    assert!(matches!(outcomes.last(), Some(StepOutcome::Complete { .. })));
    assert_eq!(s.phase(), Phase::Complete);
    assert_eq!(s.store().get("big"), Some("100000000000000000000"));
    assert_eq!(s.output(), "100000000000000000000\n");
}

#[tokio::test]
async fn test_blank_print_does_not_repeat_previous_line() {
    let mut s = session(Arc::new(Scripted::default()), &[]);
    s.run("print(\"Keep Smiling\")\nprint()").await.expect("run");
    step_to_end(&mut s).await;
    assert_eq!(s.output(), "Keep Smiling\n\n");

    let texts: Vec<Option<&str>> = s
        .renderer()
        .played
        .iter()
        .map(|intent| match intent {
            AnimationIntent::PrintToOutput { text, .. } => text.as_deref(),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec![Some("Keep Smiling"), Some("")]);
}

#[tokio::test]
async fn test_shared_session_reset_discards_run() {
    let lesson = lesson::by_id(2).expect("lesson 2");
    let shared = SharedSession::new(session(Arc::new(Scripted::default()), &[]));
    shared
        .run(lesson.default_template().source)
        .await
        .expect("run");
    shared.step().await.expect("step");
    assert_eq!(shared.view().current, 1);

    shared.reset().await;
    let view = shared.view();
    assert_eq!(view.phase, Phase::Idle);
    assert_eq!(view.current, 0);
    assert!(view.variables.is_empty());
    assert_eq!(shared.step().await, Err(SessionError::NotRunning));

    // Runs are accepted again after a reset
    shared
        .run(lesson.default_template().source)
        .await
        .expect("run after reset");
}
