//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into four layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, input and chat modes
//! - **[`stage`]**: [`TuiRenderer`], the [`crate::animation::Renderer`] that drives
//!   the shared animation stage
//! - **[`panes`]**: stateless render functions for each visible pane (source, memory,
//!   console, teacher, chat, status bar) and the spark overlay
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`SharedSession`](crate::session::SharedSession) whose renderer writes to
//! the same stage, and call [`App::run`] to start the event loop.
//!
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod stage;
pub mod theme;

pub use app::App;
pub use stage::{SharedStage, TuiRenderer};
