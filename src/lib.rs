//! # Introduction
//!
//! chalkstep runs a beginner's Python program one line at a time. Each line
//! is executed against a persistent namespace and classified, and the change
//! it caused becomes an animation: values fly from the source into labelled
//! memory boxes and from memory into the console. After every step an
//! explanation service adds a short teacher's note.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Classifier → Plan → Step Controller ─┬→ Executor → Variable Store
//!                                                ├→ Animation Dispatch → Renderer
//!                                                └→ Explanation Requester
//! ```
//!
//! 1. [`lesson`]: line classification, the execution plan, the editable
//!    source buffer and the built-in lessons.
//! 2. [`executor`]: the narrow executor protocol, implemented over the
//!    embedded [`python`] interpreter.
//! 3. [`store`]: the display-side variable store and its diffing.
//! 4. [`animation`]: animation intents, history entries and the
//!    [`animation::Renderer`] seam.
//! 5. [`session`]: the step controller state machine and its shared,
//!    single-flight handle.
//! 6. [`explain`]: the explanation service boundary with per-kind fallbacks,
//!    the whole-program walkthrough and the chat assistant.
//! 7. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! [`config`] and [`logging`] carry the process-level setup.

pub mod animation;
pub mod config;
pub mod executor;
pub mod explain;
pub mod lesson;
pub mod logging;
pub mod python;
pub mod session;
pub mod store;
pub mod ui;
