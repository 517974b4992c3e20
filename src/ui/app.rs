//! Main TUI application state and logic
//!
//! The draw loop is synchronous. Session actions and explanation requests
//! run as tasks on the tokio runtime; their results come back over a
//! channel and are applied between frames. Animations need no messages: the
//! renderer writes the shared stage and every frame reads it.

use super::panes::{
    self, memory, source, ChatLine, ChatRenderData, ConsoleRenderData, KeyMode, SourceRenderData,
    Speaker, StatusRenderData,
};
use super::stage::{lock, Anchor, SharedStage, StageState, TuiRenderer};
use crate::executor::PythonExecutor;
use crate::explain::{ChatAssistant, ExplanationTransport, Walkthrough};
use crate::lesson::{Lesson, SourceBuffer};
use crate::session::{RunOutcome, SessionView, SharedSession, StepOutcome};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

pub type TuiSession = SharedSession<PythonExecutor, TuiRenderer>;

/// Which pane receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Chat,
    Walkthrough,
}

/// Results of background work
enum AppEvent {
    Status(String),
    ChatReply(String),
    Walkthrough(Walkthrough),
}

/// Pane rectangles of the last frame, used to place sparks
struct PaneAreas {
    source: Rect,
    memory: Rect,
    console: Rect,
    source_scroll: usize,
    console_scroll: usize,
}

impl panes::AnchorMap for PaneAreas {
    fn locate(&self, anchor: &Anchor, stage: &StageState) -> Option<(u16, u16)> {
        match anchor {
            Anchor::SourceLine(line) => source::line_anchor(self.source, *line, self.source_scroll),
            Anchor::Memory(name) => {
                let index = stage.box_index(name).unwrap_or(stage.boxes.len());
                Some(memory::box_anchor(self.memory, index))
            }
            Anchor::Console => Some(panes::console::console_anchor(
                self.console,
                stage.lines.len(),
                self.console_scroll,
            )),
        }
    }
}

/// The main application state
pub struct App {
    /// Step controller shared with background tasks
    pub session: TuiSession,

    /// What the renderer is currently showing
    pub stage: SharedStage,

    /// The learner's program
    pub buffer: SourceBuffer,

    pub lesson: &'static Lesson,

    /// Index into `lesson.templates`
    pub template: usize,

    pub focused_pane: FocusedPane,

    pub chat_log: Vec<ChatLine>,
    pub chat_input: String,
    pub chat_waiting: bool,

    /// `None` while a walkthrough request is in flight
    pub walkthrough: Option<Walkthrough>,
    pub walkthrough_index: usize,

    pub source_scroll: usize,
    pub console_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    chat: Arc<Mutex<ChatAssistant>>,
    transport: Arc<dyn ExplanationTransport>,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create the app for `lesson`; must be called from inside a tokio runtime
    pub fn new(
        session: TuiSession,
        stage: SharedStage,
        lesson: &'static Lesson,
        transport: Arc<dyn ExplanationTransport>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut buffer = SourceBuffer::new(lesson.default_template().source);
        buffer.lock_call_tokens();
        App {
            session,
            stage,
            buffer,
            lesson,
            template: 0,
            focused_pane: FocusedPane::Source,
            chat_log: Vec::new(),
            chat_input: String::new(),
            chat_waiting: false,
            walkthrough: None,
            walkthrough_index: 0,
            source_scroll: 0,
            console_scroll: 0,
            should_quit: false,
            status_message: format!("Level {}: {}", lesson.id, lesson.title),
            chat: Arc::new(Mutex::new(ChatAssistant::new(Arc::clone(&transport)))),
            transport,
            runtime: Handle::current(),
            events_tx,
            events_rx,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_events();
            let view = self.session.view();
            self.buffer.set_read_only(!view.phase.is_editable());

            terminal.draw(|f| self.render(f, &view))?;

            if self.should_quit {
                break;
            }

            // Short poll keeps tweens moving between key presses
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key, &view);
                    }
                }
            }
        }

        // Unblock a step waiting on input so the runtime can shut down
        if let Some(request) = lock(&self.stage).input.take() {
            request.cancel();
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Status(message) => self.status_message = message,
                AppEvent::ChatReply(reply) => {
                    self.chat_waiting = false;
                    self.chat_log.push(ChatLine {
                        speaker: Speaker::Teacher,
                        text: reply,
                    });
                }
                AppEvent::Walkthrough(walkthrough) => {
                    self.walkthrough_index = 0;
                    self.walkthrough = Some(walkthrough);
                }
            }
        }
    }

    fn key_mode(&self, stage: &StageState, view: &SessionView) -> KeyMode {
        if stage.input.is_some() {
            KeyMode::Input
        } else {
            match self.focused_pane {
                FocusedPane::Chat => KeyMode::Chat,
                FocusedPane::Walkthrough => KeyMode::Walkthrough,
                FocusedPane::Source if view.phase.is_editable() => KeyMode::Editing,
                FocusedPane::Source => KeyMode::Running,
            }
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame, view: &SessionView) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        // Right column: Memory (top) | Teacher, Chat or Walkthrough (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(columns[1]);

        let stage_handle = Arc::clone(&self.stage);
        let stage = lock(&stage_handle);
        let mode = self.key_mode(&stage, view);

        let title = self.lesson.templates[self.template].label;
        panes::render_source_pane(
            frame,
            left_rows[0],
            &SourceRenderData {
                buffer: &self.buffer,
                active_line: view.active_line,
                error_line: view.error_line,
                show_cursor: mode == KeyMode::Editing,
                is_focused: self.focused_pane == FocusedPane::Source,
                title,
            },
            &mut self.source_scroll,
        );

        let highlight = match (&self.walkthrough, self.focused_pane) {
            (Some(w), FocusedPane::Walkthrough) => w
                .entries
                .get(self.walkthrough_index)
                .and_then(|e| e.highlight.as_deref()),
            _ => None,
        };
        panes::render_console_pane(
            frame,
            left_rows[1],
            &ConsoleRenderData {
                stage: &stage,
                highlight,
                is_focused: false,
            },
            &mut self.console_scroll,
        );

        panes::render_memory_pane(frame, right_rows[0], &stage, false);

        match self.focused_pane {
            FocusedPane::Source => panes::render_teacher_pane(
                frame,
                right_rows[1],
                &view.teacher,
                self.session.is_busy() && stage.input.is_none() && !stage.is_animating(),
                false,
            ),
            FocusedPane::Chat => panes::render_chat_pane(
                frame,
                right_rows[1],
                &ChatRenderData {
                    log: &self.chat_log,
                    input: &self.chat_input,
                    waiting: self.chat_waiting,
                    is_focused: true,
                },
            ),
            FocusedPane::Walkthrough => panes::render_walkthrough_pane(
                frame,
                right_rows[1],
                self.walkthrough.as_ref(),
                self.walkthrough_index,
                true,
            ),
        }

        let areas = PaneAreas {
            source: left_rows[0],
            memory: right_rows[0],
            console: left_rows[1],
            source_scroll: self.source_scroll,
            console_scroll: self.console_scroll,
        };
        panes::render_sparks(frame, main_chunks[0], &stage, &areas);

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &StatusRenderData {
                message: &self.status_message,
                lesson: self.lesson.title,
                phase: view.phase,
                current: view.current,
                total: view.total,
                mode,
                is_animating: stage.is_animating(),
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent, view: &SessionView) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.handle_input_key(key) {
            return;
        }

        if ctrl {
            match key.code {
                KeyCode::Char('r') => self.run_program(view),
                KeyCode::Char('x') => self.reset(),
                KeyCode::Char('e') => self.open_walkthrough(view),
                KeyCode::Char('t') => self.switch_template(view),
                _ => {}
            }
            return;
        }

        if key.code == KeyCode::Tab {
            self.focused_pane = match self.focused_pane {
                FocusedPane::Chat => FocusedPane::Source,
                _ => FocusedPane::Chat,
            };
            return;
        }

        match self.focused_pane {
            FocusedPane::Chat => self.handle_chat_key(key, view),
            FocusedPane::Walkthrough => self.handle_walkthrough_key(key),
            FocusedPane::Source if view.phase.is_editable() => self.handle_edit_key(key),
            FocusedPane::Source => self.handle_run_key(key),
        }
    }

    /// Keys typed into a pending `input()` prompt; returns false if none is pending
    fn handle_input_key(&mut self, key: KeyEvent) -> bool {
        let mut stage = lock(&self.stage);
        if stage.input.is_none() {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => {
                if let Some(request) = stage.input.as_mut() {
                    request.value.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(request) = stage.input.as_mut() {
                    request.value.pop();
                }
            }
            KeyCode::Enter => {
                if let Some(request) = stage.input.take() {
                    request.submit();
                }
            }
            KeyCode::Esc => {
                if let Some(request) = stage.input.take() {
                    request.cancel();
                }
            }
            _ => {}
        }
        true
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let result = match key.code {
            KeyCode::Char(c) => self.buffer.insert_char(c),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Enter => self.buffer.insert("\n"),
            _ => {
                match key.code {
                    KeyCode::Left => self.buffer.move_left(),
                    KeyCode::Right => self.buffer.move_right(),
                    KeyCode::Up => self.buffer.move_up(),
                    KeyCode::Down => self.buffer.move_down(),
                    KeyCode::Home => self.buffer.move_home(),
                    KeyCode::End => self.buffer.move_end(),
                    // Back and step stay reachable after Complete
                    KeyCode::PageDown => self.step_forward(),
                    KeyCode::PageUp => self.step_backward(),
                    KeyCode::Esc => self.should_quit = true,
                    _ => {}
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            self.status_message = err.to_string();
        }
    }

    fn handle_run_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char(' ') | KeyCode::Char('n') => {
                self.step_forward()
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('b') => self.step_backward(),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent, view: &SessionView) {
        match key.code {
            KeyCode::Char(c) => self.chat_input.push(c),
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Enter => self.ask(view),
            KeyCode::Esc => self.focused_pane = FocusedPane::Source,
            _ => {}
        }
    }

    fn handle_walkthrough_key(&mut self, key: KeyEvent) {
        let len = self.walkthrough.as_ref().map_or(0, Walkthrough::len);
        match key.code {
            KeyCode::Right | KeyCode::Down | KeyCode::Char('n') if len > 0 => {
                self.walkthrough_index = (self.walkthrough_index + 1).min(len - 1);
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('b') => {
                self.walkthrough_index = self.walkthrough_index.saturating_sub(1);
            }
            KeyCode::Esc | KeyCode::Char('q') => self.focused_pane = FocusedPane::Source,
            _ => {}
        }
    }

    fn run_program(&mut self, view: &SessionView) {
        if !view.phase.is_editable() {
            self.status_message = "A run is in progress; press Ctrl-X to reset first".to_string();
            return;
        }
        let source = self.buffer.text();
        let session = self.session.clone();
        let events = self.events_tx.clone();
        self.status_message = "Validating…".to_string();
        info!(lesson = self.lesson.id, "run requested");
        self.runtime.spawn(async move {
            let message = match session.run(&source).await {
                Ok(RunOutcome::Ready { total }) => {
                    format!("Ready: {} steps. Press → to step", total)
                }
                Ok(RunOutcome::SyntaxError { error, .. }) => format!("Syntax error: {}", error),
                Err(err) => err.to_string(),
            };
            let _ = events.send(AppEvent::Status(message));
        });
    }

    fn step_forward(&mut self) {
        if self.session.is_busy() {
            return;
        }
        let session = self.session.clone();
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let message = match session.step().await {
                Ok(StepOutcome::Stepped { step, .. }) => format!("Ran line {}", step.line_number + 1),
                Ok(StepOutcome::Complete { .. }) => "Program complete!".to_string(),
                Ok(StepOutcome::Failed { step, error, .. }) => {
                    format!("Line {}: {}", step.line_number + 1, error)
                }
                Err(err) => err.to_string(),
            };
            let _ = events.send(AppEvent::Status(message));
        });
    }

    fn step_backward(&mut self) {
        if self.session.is_busy() {
            return;
        }
        let session = self.session.clone();
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let message = match session.back().await {
                Ok(outcome) => format!("Back to step {}", outcome.current),
                Err(err) => err.to_string(),
            };
            let _ = events.send(AppEvent::Status(message));
        });
    }

    /// Discard the run and reload the lesson template
    fn reset(&mut self) {
        // A step blocked on input would otherwise hold the session forever
        if let Some(request) = lock(&self.stage).input.take() {
            request.cancel();
        }
        let session = self.session.clone();
        self.runtime.spawn(async move { session.reset().await });

        self.load_template();
        self.walkthrough = None;
        self.focused_pane = FocusedPane::Source;
        self.status_message = "Reset. Edit the code and press Ctrl-R to run".to_string();
        debug!(lesson = self.lesson.id, "reset");
    }

    fn switch_template(&mut self, view: &SessionView) {
        if !view.phase.is_editable() {
            self.status_message = "Finish or reset the run before switching templates".to_string();
            return;
        }
        self.template = self.lesson.next_template(self.template);
        self.load_template();
        self.status_message = format!("Template: {}", self.lesson.templates[self.template].label);
    }

    fn load_template(&mut self) {
        self.buffer.load(self.lesson.templates[self.template].source);
        self.buffer.lock_call_tokens();
        self.source_scroll = 0;
    }

    fn open_walkthrough(&mut self, view: &SessionView) {
        self.focused_pane = FocusedPane::Walkthrough;
        self.walkthrough = None;
        let transport = Arc::clone(&self.transport);
        let code = self.buffer.text();
        let inputs = view.inputs.clone();
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let walkthrough = Walkthrough::request(transport.as_ref(), &code, &inputs).await;
            let _ = events.send(AppEvent::Walkthrough(walkthrough));
        });
    }

    fn ask(&mut self, view: &SessionView) {
        let query = self.chat_input.trim().to_string();
        if query.is_empty() || self.chat_waiting {
            return;
        }
        self.chat_input.clear();
        self.chat_waiting = true;
        self.chat_log.push(ChatLine {
            speaker: Speaker::Learner,
            text: query.clone(),
        });

        let chat = Arc::clone(&self.chat);
        let code = self.buffer.text();
        let output = view.output.clone();
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let reply = chat.lock().await.ask(&query, &code, &output).await;
            let _ = events.send(AppEvent::ChatReply(reply));
        });
    }
}
