//! The OS surface the core talks to.
//!
//! Each platform crate (e.g. `summon-windows`) implements these traits
//! against the real API. Tests implement them with in-memory fakes.

use crate::error::OsError;

/// Raw window handle value (an `HWND` on Windows).
pub type WindowHandle = usize;

/// Raw icon handle value (an `HICON` on Windows).
pub type IconHandle = usize;

/// A window message as delivered to a window procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub code: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl Message {
    pub fn new(code: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            code,
            wparam,
            lparam,
        }
    }
}

/// Opaque value of the window procedure that was replaced on install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousProc(pub isize);

/// Access to a window's message-procedure pointer.
pub trait ProcedureSlot {
    /// Points the window at the hook entry point and returns the
    /// procedure it replaced.
    fn replace(&self, window: WindowHandle) -> Result<PreviousProc, OsError>;

    /// Puts `previous` back as the window's procedure.
    fn restore(&self, window: WindowHandle, previous: PreviousProc) -> Result<(), OsError>;

    /// Calls the replaced procedure and returns its result.
    fn call_previous(&self, previous: PreviousProc, window: WindowHandle, msg: Message) -> isize;
}

/// System-wide hotkey registration.
pub trait HotkeyApi {
    /// Registers `vk` + `modifiers` under `id` for `window`.
    fn register(
        &mut self,
        window: WindowHandle,
        id: i32,
        modifiers: u32,
        vk: u32,
    ) -> Result<(), OsError>;

    /// Releases the registration `id` held by `window`.
    fn unregister(&mut self, window: WindowHandle, id: i32) -> Result<(), OsError>;
}

/// The record handed to the notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayRegistration {
    pub icon_id: u32,
    pub icon: IconHandle,
    pub tooltip: String,
    pub callback_code: u32,
}

/// Notification-area icon registration.
pub trait TrayApi {
    fn add(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError>;

    fn modify(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError>;

    fn delete(&mut self, window: WindowHandle, icon_id: u32) -> Result<(), OsError>;

    /// Message code the shell broadcasts after it restarts, if the
    /// platform has one.
    fn taskbar_created_code(&self) -> Option<u32> {
        None
    }
}
