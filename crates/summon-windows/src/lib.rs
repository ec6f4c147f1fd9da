//! Win32 backend for Summon.
//!
//! Implements the core's OS traits with window subclassing,
//! `RegisterHotKey` and `Shell_NotifyIconW`, and provides the hidden
//! host window and message pump the CLI runs. Empty on other platforms.
#![cfg(windows)]

mod config_watcher;
mod ctrl_c;
/// Host window, message pump and entry point.
pub mod event_loop;
mod host;
/// `RegisterHotKey`-backed hotkey API.
pub mod hotkey;
/// The Win32-backed session and its per-thread slot.
pub mod session;
/// Window subclassing through `GWLP_WNDPROC`.
pub mod subclass;
/// `Shell_NotifyIconW`-backed tray API.
pub mod tray;

pub use event_loop::run;
pub use session::Win32Session;
