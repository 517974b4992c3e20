//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: editable source with highlighting, locked tokens and the active line
//! - [`memory`]: variable boxes as they land
//! - [`console`]: program output and the input prompt
//! - [`teacher`]: the teacher bubble and the walkthrough
//! - [`chat`]: follow-up questions
//! - [`status`]: status bar with keybindings and execution state
//! - [`sparks`]: overlay for values in flight
//!
//! Each pane module exports a primary `render_*` function plus the data it
//! needs; all of them are stateless apart from scroll offsets.

pub mod chat;
pub mod console;
pub mod memory;
pub mod source;
pub mod sparks;
pub mod status;
pub mod teacher;

pub use chat::{render_chat_pane, ChatLine, ChatRenderData, Speaker};
pub use console::{render_console_pane, ConsoleRenderData};
pub use memory::render_memory_pane;
pub use source::{render_source_pane, SourceRenderData};
pub use sparks::{render_sparks, AnchorMap};
pub use status::{render_status_bar, KeyMode, StatusRenderData};
pub use teacher::{render_teacher_pane, render_walkthrough_pane};
