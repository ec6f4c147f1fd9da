//! The Win32 session and the slot that keeps it reachable from the
//! host window procedure.

use std::cell::RefCell;
use std::sync::mpsc::Sender;

use summon_core::os::WindowHandle;
use summon_core::{AppEvent, Backend, Config, ResourceIds, Session};
use tracing::warn;

use crate::hotkey::Win32Hotkeys;
use crate::subclass::{self, InstalledHook};
use crate::tray::{Win32Tray, load_app_icon};

/// Hook, hotkey and tray for the host window, backed by Win32.
pub type Win32Session = Session<InstalledHook, Win32Hotkeys, Win32Tray>;

/// Starts a session on `window` with the process-wide resource ids.
pub fn start(window: WindowHandle, config: &Config, events: Sender<AppEvent>) -> Win32Session {
    let backend = Backend {
        hotkeys: Win32Hotkeys,
        tray: Win32Tray::new(),
        icon: load_app_icon(),
    };
    Session::start(
        window,
        ResourceIds::DEFAULT,
        config,
        subclass::install,
        backend,
        events,
    )
}

// The running session, owned by the window thread. The pump reaches it
// between messages; `WM_ENDSESSION` ends it from inside the window
// procedure, since the process may be killed once that message returns.
thread_local! {
    static CURRENT: RefCell<Option<Win32Session>> = const { RefCell::new(None) };
}

/// Makes `session` the running one for this thread.
pub(crate) fn enter(session: Win32Session) {
    let previous = CURRENT.with(|current| current.borrow_mut().replace(session));
    drop(previous);
}

/// Runs `f` on the running session, if there is one and it is not
/// already borrowed further up the stack.
pub(crate) fn with_current(f: impl FnOnce(&mut Win32Session)) {
    CURRENT.with(|current| match current.try_borrow_mut() {
        Ok(mut slot) => {
            if let Some(session) = slot.as_mut() {
                f(session);
            }
        }
        Err(_) => warn!("session busy, skipping"),
    });
}

/// Tears down the running session. Returns `false` if none was running.
pub(crate) fn end() -> bool {
    let session = CURRENT.with(|current| match current.try_borrow_mut() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
    });
    // Dropped outside the borrow: releasing the hook may dispatch.
    let ended = session.is_some();
    drop(session);
    ended
}
