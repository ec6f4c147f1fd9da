use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;

use summon_core::os::{Message, PreviousProc, ProcedureSlot, WindowHandle};
use summon_core::{HookError, HookGuard, MessageHook, OsError};
use tracing::warn;
use windows::Win32::Foundation::{
    GetLastError, HWND, LPARAM, LRESULT, SetLastError, WIN32_ERROR, WPARAM,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallWindowProcW, DefWindowProcW, GWLP_WNDPROC, SetWindowLongPtrW, WNDPROC,
};

/// A hook installed on the current thread's window.
pub type Win32Hook = MessageHook<Win32Subclass>;

// Hooks by window, for the shared window procedure to find. Windows
// only deliver messages on their owning thread, so the table is
// per-thread.
thread_local! {
    static ROUTES: RefCell<HashMap<WindowHandle, Rc<Win32Hook>>> =
        RefCell::new(HashMap::new());
}

/// Converts a raw handle value back to an `HWND`.
pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window as *mut c_void)
}

/// The `GWLP_WNDPROC` slot of a real window.
pub struct Win32Subclass;

impl ProcedureSlot for Win32Subclass {
    fn replace(&self, window: WindowHandle) -> Result<PreviousProc, OsError> {
        let entry: unsafe extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT = hook_proc;
        set_procedure(window, entry as usize as isize)
    }

    fn restore(&self, window: WindowHandle, previous: PreviousProc) -> Result<(), OsError> {
        set_procedure(window, previous.0).map(|_| ())
    }

    fn call_previous(&self, previous: PreviousProc, window: WindowHandle, msg: Message) -> isize {
        let hwnd = hwnd(window);
        let wparam = WPARAM(msg.wparam);
        let lparam = LPARAM(msg.lparam);

        if previous.0 == 0 {
            return unsafe { DefWindowProcW(hwnd, msg.code, wparam, lparam) }.0;
        }

        // SAFETY: `previous` is the value `GWLP_WNDPROC` held before we
        // replaced it, i.e. a window procedure pointer (or a handle that
        // CallWindowProcW knows how to resolve).
        let proc = unsafe { std::mem::transmute::<isize, WNDPROC>(previous.0) };
        unsafe { CallWindowProcW(proc, hwnd, msg.code, wparam, lparam) }.0
    }
}

/// Writes `GWLP_WNDPROC` and returns the old value.
///
/// A zero return is only a failure when the last-error code says so.
fn set_procedure(window: WindowHandle, value: isize) -> Result<PreviousProc, OsError> {
    // SAFETY: plain Win32 calls on a handle owned by this thread. The
    // new value is either `hook_proc` or the procedure it replaced.
    unsafe {
        SetLastError(WIN32_ERROR(0));
        let previous = SetWindowLongPtrW(hwnd(window), GWLP_WNDPROC, value);
        if previous == 0 {
            let code = GetLastError().0;
            if code != 0 {
                return Err(OsError::new("SetWindowLongPtrW", code));
            }
        }
        Ok(PreviousProc(previous))
    }
}

/// Installed window procedure shared by every hooked window.
unsafe extern "system" fn hook_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let window = hwnd.0 as WindowHandle;
    let hook = ROUTES
        .try_with(|routes| routes.borrow().get(&window).cloned())
        .ok()
        .flatten();

    match hook {
        Some(hook) if hook.is_installed() => {
            LRESULT(hook.dispatch(Message::new(msg, wparam.0, lparam.0)))
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// A hook installed on a window; uninstalled on drop.
pub struct InstalledHook {
    window: WindowHandle,
    hook: Rc<Win32Hook>,
}

impl InstalledHook {
    pub fn window(&self) -> WindowHandle {
        self.window
    }
}

impl HookGuard for InstalledHook {
    type Slot = Win32Subclass;

    fn hook(&self) -> &Rc<Win32Hook> {
        &self.hook
    }
}

impl Drop for InstalledHook {
    fn drop(&mut self) {
        match self.hook.uninstall() {
            Ok(()) => {
                let _ = ROUTES.try_with(|routes| routes.borrow_mut().remove(&self.window));
            }
            // The window still points at `hook_proc`, so the route stays
            // and keeps forwarding to the original procedure.
            Err(e) => warn!(error = %e, "failed to restore window procedure"),
        }
    }
}

/// Takes over `window`'s message procedure.
///
/// Must be called on the thread that owns the window. Fails if a hook
/// is already installed on it or if the OS refuses the swap.
pub fn install(window: WindowHandle) -> Result<InstalledHook, HookError> {
    let hook = Rc::new(MessageHook::new(Win32Subclass));

    // The route goes in first so messages sent during the swap find it.
    let inserted = ROUTES.with(|routes| {
        let mut routes = routes.borrow_mut();
        if routes.contains_key(&window) {
            return false;
        }
        routes.insert(window, hook.clone());
        true
    });
    if !inserted {
        return Err(HookError::AlreadyInstalled(window));
    }

    if let Err(e) = hook.install(window) {
        ROUTES.with(|routes| routes.borrow_mut().remove(&window));
        return Err(e);
    }

    Ok(InstalledHook { window, hook })
}
