//! Console control handler using `SetConsoleCtrlHandler`.
//!
//! Turns Ctrl+C, Ctrl+Break and console close, logoff or shutdown into
//! a `WM_CLOSE` on the host window, so every exit goes through the same
//! ordered teardown as closing the window. For the last three the
//! process is killed as soon as the handler returns, so the handler
//! waits for teardown to finish first.

use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use summon_core::os::WindowHandle;
use tracing::warn;
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Console::{
    CTRL_BREAK_EVENT, CTRL_C_EVENT, CTRL_CLOSE_EVENT, CTRL_LOGOFF_EVENT, CTRL_SHUTDOWN_EVENT,
    SetConsoleCtrlHandler,
};
use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, WM_CLOSE};

use crate::subclass::hwnd;

/// The system allows about 5 s for `CTRL_CLOSE_EVENT`; stay under it.
const TEARDOWN_WAIT: Duration = Duration::from_millis(4500);

/// Host window to close. Written once by `set_handler`, read by the callback.
static TARGET: OnceLock<WindowHandle> = OnceLock::new();

/// Set once the session is torn down and the window destroyed.
static TEARDOWN_DONE: Mutex<bool> = Mutex::new(false);
static TEARDOWN_SIGNAL: Condvar = Condvar::new();

/// Registers a console handler that closes `window` on exit signals.
pub(crate) fn set_handler(window: WindowHandle) {
    if TARGET.set(window).is_err() {
        warn!("console control handler already registered");
        return;
    }
    if let Err(e) = unsafe { SetConsoleCtrlHandler(Some(handler), true) } {
        warn!(error = %e, "failed to set console control handler");
    }
}

/// Called by the window thread once teardown is complete. Releases a
/// handler waiting on a close, logoff or shutdown event.
pub(crate) fn teardown_finished() {
    let mut done = TEARDOWN_DONE.lock().unwrap_or_else(PoisonError::into_inner);
    *done = true;
    TEARDOWN_SIGNAL.notify_all();
}

fn wait_for_teardown() {
    let done = TEARDOWN_DONE.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = TEARDOWN_SIGNAL
        .wait_timeout_while(done, TEARDOWN_WAIT, |done| !*done)
        .unwrap_or_else(PoisonError::into_inner);
}

/// Runs on a system-created thread; posting is safe across threads.
unsafe extern "system" fn handler(ctrl_type: u32) -> windows::core::BOOL {
    let terminating = matches!(
        ctrl_type,
        CTRL_CLOSE_EVENT | CTRL_LOGOFF_EVENT | CTRL_SHUTDOWN_EVENT
    );
    let interrupt = ctrl_type == CTRL_C_EVENT || ctrl_type == CTRL_BREAK_EVENT;
    if !(terminating || interrupt) {
        return windows::core::BOOL(0);
    }
    let Some(&window) = TARGET.get() else {
        return windows::core::BOOL(0);
    };

    let _ = unsafe { PostMessageW(Some(hwnd(window)), WM_CLOSE, WPARAM(0), LPARAM(0)) };
    if terminating {
        wait_for_teardown();
    }
    windows::core::BOOL(1)
}
