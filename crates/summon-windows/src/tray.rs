use std::ffi::c_void;

use summon_core::os::{IconHandle, TrayApi, TrayRegistration, WindowHandle};
use summon_core::OsError;
use windows::Win32::Foundation::{GetLastError, HINSTANCE};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFY_ICON_MESSAGE,
    NOTIFYICONDATAW, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    HICON, IDI_APPLICATION, LoadIconW, RegisterWindowMessageW,
};
use windows::core::{PCWSTR, w};

use crate::subclass::hwnd;

/// Resource id of the application icon embedded in the executable.
const APP_ICON_RESOURCE: u16 = 1;

/// The notification area, through `Shell_NotifyIconW`.
pub struct Win32Tray {
    taskbar_created: u32,
}

impl Win32Tray {
    pub fn new() -> Self {
        // SAFETY: registers (or looks up) a named broadcast message.
        let taskbar_created = unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) };
        Self { taskbar_created }
    }
}

impl Default for Win32Tray {
    fn default() -> Self {
        Self::new()
    }
}

impl TrayApi for Win32Tray {
    fn add(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError> {
        notify(NIM_ADD, &notify_data(window, record), "Shell_NotifyIconW(NIM_ADD)")
    }

    fn modify(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError> {
        notify(
            NIM_MODIFY,
            &notify_data(window, record),
            "Shell_NotifyIconW(NIM_MODIFY)",
        )
    }

    fn delete(&mut self, window: WindowHandle, icon_id: u32) -> Result<(), OsError> {
        let data = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd(window),
            uID: icon_id,
            ..Default::default()
        };
        notify(NIM_DELETE, &data, "Shell_NotifyIconW(NIM_DELETE)")
    }

    fn taskbar_created_code(&self) -> Option<u32> {
        (self.taskbar_created != 0).then_some(self.taskbar_created)
    }
}

fn notify(
    action: NOTIFY_ICON_MESSAGE,
    data: &NOTIFYICONDATAW,
    call: &'static str,
) -> Result<(), OsError> {
    // SAFETY: `data` is a fully initialised NOTIFYICONDATAW with its
    // cbSize set.
    if unsafe { Shell_NotifyIconW(action, data) }.as_bool() {
        Ok(())
    } else {
        Err(OsError::new(call, unsafe { GetLastError() }.0))
    }
}

fn notify_data(window: WindowHandle, record: &TrayRegistration) -> NOTIFYICONDATAW {
    let mut data = NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd(window),
        uID: record.icon_id,
        uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
        uCallbackMessage: record.callback_code,
        hIcon: HICON(record.icon as *mut c_void),
        ..Default::default()
    };

    // The manager already keeps the tooltip within 127 units; the last
    // slot stays zero as the terminator.
    let limit = data.szTip.len() - 1;
    for (slot, unit) in data.szTip.iter_mut().zip(record.tooltip.encode_utf16().take(limit)) {
        *slot = unit;
    }
    data
}

/// Loads the executable's embedded icon, or the stock application icon.
///
/// Returns `0` (no icon) if neither can be loaded.
pub fn load_app_icon() -> IconHandle {
    // SAFETY: loading shared icons; they are owned by the system and
    // must not be destroyed.
    unsafe {
        let embedded = GetModuleHandleW(None).ok().and_then(|module| {
            LoadIconW(
                Some(HINSTANCE(module.0)),
                PCWSTR(APP_ICON_RESOURCE as usize as *const u16),
            )
            .ok()
        });
        let icon = embedded.or_else(|| LoadIconW(None, IDI_APPLICATION).ok());
        icon.map_or(0, |h| h.0 as IconHandle)
    }
}
