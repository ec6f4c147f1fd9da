//! Watches `config.toml` and hands parsed reloads to the window thread.
//!
//! Uses `FindFirstChangeNotificationW` to monitor the config directory
//! for writes and renames. Loading and parsing happen here, off the
//! window thread; the window thread is then woken with a posted message
//! and applies the new config itself.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::SystemTime;

use summon_core::Config;
use summon_core::config;
use summon_core::os::WindowHandle;
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, WAIT_OBJECT_0, WPARAM};
use windows::Win32::Storage::FileSystem::{
    FILE_NOTIFY_CHANGE_FILE_NAME, FILE_NOTIFY_CHANGE_LAST_WRITE, FindCloseChangeNotification,
    FindFirstChangeNotificationW, FindNextChangeNotification,
};
use windows::Win32::System::Threading::WaitForSingleObject;
use windows::Win32::UI::WindowsAndMessaging::PostMessageW;
use windows::core::HSTRING;

use crate::subclass::hwnd;

/// Timeout between stop-flag checks when no changes occur (ms).
const WAIT_TIMEOUT_MS: u32 = 5000;

/// Where a reload goes: the channel, then a wake-up message.
pub(crate) struct ReloadTarget {
    pub(crate) tx: Sender<Config>,
    pub(crate) window: WindowHandle,
    pub(crate) wake_code: u32,
}

/// Runs the config watcher loop. Blocks until the stop flag is set
/// or the receiver is dropped.
pub(crate) fn watch(target: ReloadTarget, stop: Arc<AtomicBool>) {
    let Some(dir) = config::config_dir() else {
        info!("config dir not found, watcher exiting");
        return;
    };
    let Some(path) = config::config_path() else {
        return;
    };
    let mut last = mtime(&path);

    let dir_str = HSTRING::from(dir.as_os_str());
    let flags = FILE_NOTIFY_CHANGE_LAST_WRITE | FILE_NOTIFY_CHANGE_FILE_NAME;

    let handle = unsafe { FindFirstChangeNotificationW(&dir_str, false, flags) };
    let Ok(handle) = handle else {
        info!(dir = %dir.display(), "FindFirstChangeNotificationW failed, watcher exiting");
        return;
    };

    while !stop.load(Ordering::Relaxed) {
        let result = unsafe { WaitForSingleObject(handle, WAIT_TIMEOUT_MS) };
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if result != WAIT_OBJECT_0 {
            continue; // timeout or error, recheck the stop flag
        }

        let current = mtime(&path);
        if current != last {
            last = current;
            if !reload(&target) {
                break; // receiver dropped
            }
        }

        let _ = unsafe { FindNextChangeNotification(handle) };
    }

    let _ = unsafe { FindCloseChangeNotification(handle) };
}

/// Loads and validates the config and delivers it. Returns `false` if
/// the receiver is gone.
fn reload(target: &ReloadTarget) -> bool {
    let config = match config::try_load_valid() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "config.toml invalid, skipping reload");
            return true;
        }
    };

    info!(hotkey = %config.hotkey, "config.toml changed, reloading");
    if target.tx.send(config).is_err() {
        return false;
    }

    // SAFETY: posting to a window owned by another thread is allowed;
    // if the window is already gone the call just fails.
    let posted = unsafe {
        PostMessageW(
            Some(hwnd(target.window)),
            target.wake_code,
            WPARAM(0),
            LPARAM(0),
        )
    };
    if let Err(e) = posted {
        debug!(error = %e, "could not wake host window");
    }
    true
}

/// Returns the modification time for a path, or `None` if unavailable.
fn mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().ok().and_then(|m| m.modified().ok())
}
