//! Reserved identifiers shared by the hook, the hotkey and the tray.
//!
//! Every id or message code the core hands to the OS is allocated here,
//! so two subsystems can never pick the same number.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// `WM_HOTKEY`: the message the OS posts when a registered hotkey fires.
pub const WM_HOTKEY: u32 = 0x0312;

/// `WM_APP`: first message code free for private use.
pub const WM_APP: u32 = 0x8000;

/// The identifiers used by one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceIds {
    /// Hotkey registration id passed to the OS.
    pub hotkey_id: i32,
    /// Notification-area icon id.
    pub tray_icon_id: u32,
    /// Message the notification area sends for icon mouse events.
    pub tray_callback: u32,
    /// Message posted to the host window when a new config is ready.
    pub config_reload: u32,
}

impl ResourceIds {
    /// The process-wide allocation.
    pub const DEFAULT: Self = Self {
        hotkey_id: 0x5301,
        tray_icon_id: 1,
        tray_callback: WM_APP + 1,
        config_reload: WM_APP + 2,
    };

    /// Code the OS uses for hotkey activation.
    pub const fn activation_code(&self) -> u32 {
        WM_HOTKEY
    }

    const fn is_collision_free(&self) -> bool {
        self.tray_callback != WM_HOTKEY
            && self.config_reload != WM_HOTKEY
            && self.tray_callback != self.config_reload
            && self.tray_callback >= WM_APP
            && self.config_reload >= WM_APP
            // Hotkey ids outside 0x0000..=0xBFFF are reserved for DLLs.
            && self.hotkey_id >= 0
            && self.hotkey_id <= 0xBFFF
    }
}

impl Default for ResourceIds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(ResourceIds::DEFAULT.is_collision_free());

/// Hotkey ids currently held by a live registration in this process.
static CLAIMED_HOTKEY_IDS: Mutex<BTreeSet<i32>> = Mutex::new(BTreeSet::new());

/// Exclusive use of one hotkey id within the process, released on drop.
///
/// `RegisterHotKey` accepts a repeated (window, id) pair and keeps both
/// registrations, so the OS cannot be relied on to refuse a second
/// holder. Every registration takes a claim first.
#[derive(Debug)]
pub struct HotkeyIdClaim(i32);

impl HotkeyIdClaim {
    /// Claims `id`, or returns `None` if another holder has it.
    pub fn acquire(id: i32) -> Option<Self> {
        let mut claimed = CLAIMED_HOTKEY_IDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        claimed.insert(id).then_some(Self(id))
    }

    pub fn id(&self) -> i32 {
        self.0
    }
}

impl Drop for HotkeyIdClaim {
    fn drop(&mut self) {
        CLAIMED_HOTKEY_IDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.0);
    }
}
