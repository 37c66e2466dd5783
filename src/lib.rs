// Library surface for headless/integration tests and reuse.
// The TUI (main.rs + ui) stays bin-only to avoid coupling the core to
// the terminal.
pub mod app_dirs;
pub mod auth;
pub mod challenge;
pub mod config;
pub mod events;
pub mod game;
pub mod mechanics;
pub mod mission;
pub mod phrases;
pub mod runtime;
pub mod scheduler;
pub mod score;
pub mod typing;
pub mod util;
