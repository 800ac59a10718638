// Library root: exposes the app task, message types and TUI so the binary
// and tests share them.

pub mod app;
pub mod protocol;
pub mod tui;
