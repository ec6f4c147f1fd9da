pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod hotkey;
pub mod ids;
pub mod keys;
pub mod log;
pub mod os;
pub mod session;
pub mod tray;

#[cfg(test)]
mod fake;

pub use config::{Config, HotkeyBinding, Modifier};
pub use error::{BindingError, DispatchError, HookError, OsError, RegistrationError, TrayError};
pub use event::AppEvent;
pub use hook::{MessageHook, Subscriptions};
pub use hotkey::HotkeyManager;
pub use ids::ResourceIds;
pub use os::{HotkeyApi, Message, ProcedureSlot, TrayApi, TrayRegistration, WindowHandle};
pub use session::{Backend, HookGuard, Session};
pub use tray::TrayManager;
