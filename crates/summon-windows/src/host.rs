use summon_core::OsError;
use summon_core::os::WindowHandle;
use tracing::{info, warn};
use windows::Win32::Foundation::{GetLastError, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, PostQuitMessage, RegisterClassW, WM_CLOSE,
    WM_ENDSESSION, WNDCLASSW, WS_EX_TOOLWINDOW,
};
use windows::core::w;

use crate::hotkey::os_error;
use crate::session;

/// `ERROR_CLASS_ALREADY_EXISTS`: a second `run` in the same process.
const CLASS_ALREADY_EXISTS: u32 = 1410;

/// The hidden window that hotkey and tray messages are delivered to.
///
/// Must NOT be a message-only window (`HWND_MESSAGE` parent) because
/// those do not receive the `TaskbarCreated` broadcast. Instead it is a
/// regular hidden window with `WS_EX_TOOLWINDOW` to keep it out of the
/// taskbar. Destroyed on drop, which must come after every registration
/// against it has been released.
pub(crate) struct HostWindow {
    hwnd: HWND,
}

impl HostWindow {
    pub(crate) fn create() -> Result<Self, OsError> {
        unsafe {
            let class_name = w!("SummonHost");
            let wc = WNDCLASSW {
                lpfnWndProc: Some(host_proc),
                lpszClassName: class_name,
                ..Default::default()
            };

            if RegisterClassW(&wc) == 0 {
                let code = GetLastError().0;
                if code != CLASS_ALREADY_EXISTS {
                    return Err(OsError::new("RegisterClassW", code));
                }
            }

            // No WS_VISIBLE: window stays hidden.
            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                class_name,
                w!("Summon"),
                Default::default(),
                0,
                0,
                0,
                0,
                None,
                None,
                None,
                None,
            )
            .map_err(|e| os_error("CreateWindowExW", &e))?;

            Ok(Self { hwnd })
        }
    }

    pub(crate) fn handle(&self) -> WindowHandle {
        self.hwnd.0 as WindowHandle
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        // SAFETY: the window was created by this thread and is destroyed once.
        if let Err(e) = unsafe { DestroyWindow(self.hwnd) } {
            warn!(error = %e, "failed to destroy host window");
        }
    }
}

/// WNDPROC for the host window, reached through the hook for anything
/// the hook does not consume.
///
/// `WM_CLOSE` ends the message pump instead of destroying the window,
/// so teardown can release the hotkey and tray icon while the handle is
/// still valid. When the user session ends the process can be killed as
/// soon as `WM_ENDSESSION` returns, so the session is torn down here.
unsafe extern "system" fn host_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_CLOSE {
        unsafe { PostQuitMessage(0) };
        return LRESULT(0);
    }
    if msg == WM_ENDSESSION && wparam.0 != 0 {
        if session::end() {
            info!("user session ending, released hotkey and tray icon");
        }
        unsafe { PostQuitMessage(0) };
        return LRESULT(0);
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
