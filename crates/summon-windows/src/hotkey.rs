use summon_core::os::{HotkeyApi, WindowHandle};
use summon_core::OsError;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, RegisterHotKey, UnregisterHotKey,
};

use crate::subclass::hwnd;

/// Registers hotkeys against a window, so `WM_HOTKEY` is delivered
/// through its procedure rather than to the thread queue.
pub struct Win32Hotkeys;

impl HotkeyApi for Win32Hotkeys {
    fn register(
        &mut self,
        window: WindowHandle,
        id: i32,
        modifiers: u32,
        vk: u32,
    ) -> Result<(), OsError> {
        // SAFETY: RegisterHotKey registers a system-wide hotkey for a
        // window owned by this thread. The id comes from ResourceIds.
        unsafe { RegisterHotKey(Some(hwnd(window)), id, HOT_KEY_MODIFIERS(modifiers), vk) }
            .map_err(|e| os_error("RegisterHotKey", &e))
    }

    fn unregister(&mut self, window: WindowHandle, id: i32) -> Result<(), OsError> {
        // SAFETY: UnregisterHotKey removes the registration made above.
        unsafe { UnregisterHotKey(Some(hwnd(window)), id) }
            .map_err(|e| os_error("UnregisterHotKey", &e))
    }
}

/// Extracts the Win32 error code from an `HRESULT_FROM_WIN32` value.
pub(crate) fn os_error(call: &'static str, e: &windows::core::Error) -> OsError {
    OsError::new(call, (e.code().0 as u32) & 0xFFFF)
}
