//! Scoped ownership of the hook and both managers for one window.

use std::rc::Rc;
use std::sync::mpsc::Sender;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::HookError;
use crate::event::AppEvent;
use crate::hook::MessageHook;
use crate::hotkey::HotkeyManager;
use crate::ids::ResourceIds;
use crate::os::{HotkeyApi, IconHandle, ProcedureSlot, TrayApi, WindowHandle};
use crate::tray::TrayManager;

/// An installed message hook that uninstalls itself when dropped.
pub trait HookGuard {
    type Slot: ProcedureSlot + 'static;

    /// The hook, for managers to subscribe to.
    fn hook(&self) -> &Rc<MessageHook<Self::Slot>>;
}

/// The OS pieces a session drives besides the hook.
pub struct Backend<H, T> {
    pub hotkeys: H,
    pub tray: T,
    pub icon: IconHandle,
}

/// Owns the message hook and both managers for one window.
///
/// Dropping the session releases everything in a fixed order: tray
/// icon, then hotkey, then the hook. The window itself must outlive
/// the session. All methods run on the window's thread.
pub struct Session<G: HookGuard, H: HotkeyApi, T: TrayApi> {
    ids: ResourceIds,
    tray: Option<TrayManager<T>>,
    hotkey: Option<HotkeyManager<H>>,
    hook: Option<G>,
}

impl<G: HookGuard, H: HotkeyApi, T: TrayApi> Session<G, H, T> {
    /// Hooks `window` with `install`, registers the configured hotkey
    /// and shows the tray icon.
    ///
    /// If the hook cannot be installed the session runs with both
    /// features off and nothing is registered. Registration and tray
    /// failures are reported through `events` and logged; neither
    /// stops the session.
    pub fn start(
        window: WindowHandle,
        ids: ResourceIds,
        config: &Config,
        install: impl FnOnce(WindowHandle) -> Result<G, HookError>,
        backend: Backend<H, T>,
        events: Sender<AppEvent>,
    ) -> Self {
        let hook = match install(window) {
            Ok(hook) => hook,
            Err(e) => {
                warn!(error = %e, "message hook unavailable, hotkey and tray disabled");
                return Self {
                    ids,
                    tray: None,
                    hotkey: None,
                    hook: None,
                };
            }
        };

        let mut hotkey = HotkeyManager::new(backend.hotkeys, ids, events.clone());
        hotkey.initialize(window, hook.hook());
        // A failure has already been reported as an event.
        let _ = hotkey.register(&config.hotkey);

        let mut tray = TrayManager::new(backend.tray, ids, events);
        tray.initialize(window, backend.icon, &config.tray.tooltip, hook.hook());
        if config.tray.visible {
            let _ = tray.show();
        }

        info!(window = format_args!("{window:#x}"), "session started");
        Self {
            ids,
            tray: Some(tray),
            hotkey: Some(hotkey),
            hook: Some(hook),
        }
    }

    /// Applies a reloaded config: re-registers the binding and updates
    /// the icon.
    pub fn apply(&mut self, config: &Config) {
        if let Some(hotkey) = self.hotkey.as_mut() {
            let _ = hotkey.register(&config.hotkey);
        }
        if let Some(tray) = self.tray.as_mut() {
            tray.set_tooltip(&config.tray.tooltip);
            if config.tray.visible {
                let _ = tray.show();
            } else {
                tray.hide();
            }
        }
    }

    /// Follow-up work deferred out of message handlers. Call after each
    /// dispatched message.
    pub fn after_dispatch(&mut self) {
        if let Some(tray) = self.tray.as_mut() {
            tray.restore_after_shell_restart();
        }
    }

    /// Whether the hook is in place (and so hotkey and tray can work).
    pub fn is_hooked(&self) -> bool {
        self.hook.is_some()
    }

    pub fn ids(&self) -> ResourceIds {
        self.ids
    }

    pub fn hotkey(&self) -> Option<&HotkeyManager<H>> {
        self.hotkey.as_ref()
    }

    pub fn tray(&self) -> Option<&TrayManager<T>> {
        self.tray.as_ref()
    }
}

impl<G: HookGuard, H: HotkeyApi, T: TrayApi> Drop for Session<G, H, T> {
    fn drop(&mut self) {
        if let Some(mut tray) = self.tray.take() {
            tray.dispose();
        }
        if let Some(mut hotkey) = self.hotkey.take() {
            hotkey.dispose();
        }
        drop(self.hook.take());
        info!("session stopped");
    }
}
