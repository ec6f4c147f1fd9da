use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use crate::error::TrayError;
use crate::event::AppEvent;
use crate::hook::{Attachment, Subscriptions};
use crate::ids::ResourceIds;
use crate::os::{IconHandle, Message, TrayApi, TrayRegistration, WindowHandle};

/// `WM_LBUTTONUP`: single click.
pub const WM_LBUTTONUP: u32 = 0x0202;
/// `WM_LBUTTONDBLCLK`: double click.
pub const WM_LBUTTONDBLCLK: u32 = 0x0203;
/// `WM_RBUTTONUP`: secondary-button click.
pub const WM_RBUTTONUP: u32 = 0x0205;

/// `szTip` holds 128 UTF-16 units including the terminator.
const TOOLTIP_MAX_UNITS: usize = 127;

/// Manages the notification-area icon.
///
/// Add and delete failures are logged and never escape as panics. A
/// failed [`show`](Self::show) can be retried later.
pub struct TrayManager<A: TrayApi> {
    api: A,
    ids: ResourceIds,
    window: Option<WindowHandle>,
    record: Option<TrayRegistration>,
    visible: bool,
    /// Set by the `TaskbarCreated` handler, consumed by
    /// [`restore_after_shell_restart`](Self::restore_after_shell_restart).
    shell_restarted: Rc<Cell<bool>>,
    events: Sender<AppEvent>,
    attachment: Option<Attachment>,
}

impl<A: TrayApi> TrayManager<A> {
    pub fn new(api: A, ids: ResourceIds, events: Sender<AppEvent>) -> Self {
        Self {
            api,
            ids,
            window: None,
            record: None,
            visible: false,
            shell_restarted: Rc::new(Cell::new(false)),
            events,
            attachment: None,
        }
    }

    /// Builds the icon record for `window` and subscribes to its
    /// callback messages on `hook`. The icon is not shown yet.
    pub fn initialize<H: Subscriptions + 'static>(
        &mut self,
        window: WindowHandle,
        icon: IconHandle,
        tooltip: &str,
        hook: &Rc<H>,
    ) {
        self.window = Some(window);
        self.record = Some(TrayRegistration {
            icon_id: self.ids.tray_icon_id,
            icon,
            tooltip: truncate_tooltip(tooltip),
            callback_code: self.ids.tray_callback,
        });

        let mut attachment = Attachment::new(hook);
        let icon_id = self.ids.tray_icon_id;
        let events = self.events.clone();
        attachment.subscribe(
            self.ids.tray_callback,
            Box::new(move |msg| Ok(on_tray_message(icon_id, &events, msg))),
        );

        if let Some(code) = self.api.taskbar_created_code() {
            let flag = self.shell_restarted.clone();
            attachment.subscribe(
                code,
                Box::new(move |_| {
                    flag.set(true);
                    Ok(false)
                }),
            );
        }
        self.attachment = Some(attachment);
    }

    /// Adds the icon to the notification area.
    ///
    /// Fails when not initialized or when the OS refuses (duplicate id,
    /// no notification area). The rest of the app keeps working.
    pub fn show(&mut self) -> Result<(), TrayError> {
        let (Some(window), Some(record)) = (self.window, self.record.as_ref()) else {
            return Err(TrayError::NotInitialized);
        };
        if self.visible {
            return Ok(());
        }
        match self.api.add(window, record) {
            Ok(()) => {
                self.visible = true;
                info!(tooltip = %record.tooltip, "tray icon shown");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "tray icon could not be added");
                Err(e.into())
            }
        }
    }

    /// Removes the icon. Does nothing if it is not shown.
    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        let (Some(window), Some(record)) = (self.window, self.record.as_ref()) else {
            return;
        };
        match self.api.delete(window, record.icon_id) {
            Ok(()) => debug!("tray icon removed"),
            Err(e) => warn!(error = %e, "failed to remove tray icon"),
        }
    }

    /// Replaces the tooltip, updating the live icon if shown.
    pub fn set_tooltip(&mut self, tooltip: &str) {
        let Some(record) = self.record.as_mut() else {
            return;
        };
        record.tooltip = truncate_tooltip(tooltip);
        if !self.visible {
            return;
        }
        if let (Some(window), Some(record)) = (self.window, self.record.as_ref())
            && let Err(e) = self.api.modify(window, record)
        {
            warn!(error = %e, "failed to update tray tooltip");
        }
    }

    /// Re-adds the icon if the shell restarted while it was shown.
    ///
    /// The shell forgets every icon when it restarts and broadcasts
    /// `TaskbarCreated`; the hook handler only records that, and the
    /// controller calls this once dispatch has returned.
    pub fn restore_after_shell_restart(&mut self) {
        if !self.shell_restarted.replace(false) || !self.visible {
            return;
        }
        info!("shell restarted, re-adding tray icon");
        self.visible = false;
        let _ = self.show();
    }

    /// Decodes a tray callback message.
    ///
    /// Single, double and secondary-button clicks all raise
    /// [`AppEvent::TrayActivationRequested`]; anything else is left
    /// unhandled.
    pub fn handle_tray_message(&self, msg: &Message) -> bool {
        on_tray_message(self.ids.tray_icon_id, &self.events, msg)
    }

    /// Hides the icon and detaches from the hook. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.hide();
        self.attachment = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The record handed to the OS, once initialized.
    pub fn registration(&self) -> Option<&TrayRegistration> {
        self.record.as_ref()
    }
}

impl<A: TrayApi> Drop for TrayManager<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn on_tray_message(icon_id: u32, events: &Sender<AppEvent>, msg: &Message) -> bool {
    if msg.wparam as u32 != icon_id {
        return false;
    }
    let sub_event = (msg.lparam as usize & 0xFFFF) as u32;
    match sub_event {
        WM_LBUTTONUP | WM_LBUTTONDBLCLK | WM_RBUTTONUP => {
            let _ = events.send(AppEvent::TrayActivationRequested);
            true
        }
        _ => false,
    }
}

/// Cuts `text` so it fits the tooltip buffer without splitting a
/// character.
fn truncate_tooltip(text: &str) -> String {
    let mut units = 0;
    let mut end = 0;
    for (i, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > TOOLTIP_MAX_UNITS {
            break;
        }
        end = i + ch.len_utf8();
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};

    use super::*;
    use crate::fake::{FakeTrayOs, FakeWindow};
    use crate::hook::MessageHook;

    const WINDOW: WindowHandle = 0x3000;
    const ICON: IconHandle = 0x77;
    const TASKBAR_CREATED: u32 = 0xC123;
    /// `WM_MOUSEMOVE`
    const WM_MOUSEMOVE: u32 = 0x0200;

    struct Fixture {
        os: FakeTrayOs,
        window: FakeWindow,
        hook: Rc<MessageHook<FakeWindow>>,
        manager: TrayManager<FakeTrayOs>,
        events: Receiver<AppEvent>,
    }

    fn fixture_with(os: FakeTrayOs) -> Fixture {
        let window = FakeWindow::default();
        let hook = Rc::new(MessageHook::new(window.clone()));
        hook.install(WINDOW).unwrap();
        let (tx, events) = mpsc::channel();
        let mut manager = TrayManager::new(os.clone(), ResourceIds::DEFAULT, tx);
        manager.initialize(WINDOW, ICON, "Summon", &hook);
        Fixture {
            os,
            window,
            hook,
            manager,
            events,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakeTrayOs::default())
    }

    fn tray_message(sub_event: u32) -> Message {
        let ids = ResourceIds::DEFAULT;
        Message::new(ids.tray_callback, ids.tray_icon_id as usize, sub_event as isize)
    }

    #[test]
    fn show_registers_record_with_reserved_codes() {
        // Arrange
        let mut f = fixture();

        // Act
        f.manager.show().unwrap();

        // Assert
        let ids = ResourceIds::DEFAULT;
        let icon = f.os.icon(WINDOW, ids.tray_icon_id).unwrap();
        assert_eq!(icon.icon, ICON);
        assert_eq!(icon.tooltip, "Summon");
        assert_eq!(icon.callback_code, ids.tray_callback);
        assert!(f.manager.is_visible());
    }

    #[test]
    fn show_is_idempotent() {
        // Arrange
        let mut f = fixture();
        f.manager.show().unwrap();

        // Act
        let again = f.manager.show();

        // Assert
        assert!(again.is_ok());
        assert_eq!(f.os.add_calls(), 1);
        assert_eq!(f.os.icon_count(), 1);
    }

    #[test]
    fn show_failure_can_be_retried() {
        // Arrange
        let mut f = fixture();
        f.os.set_unavailable(true);

        // Act
        let first = f.manager.show();
        f.os.set_unavailable(false);
        let second = f.manager.show();

        // Assert
        assert!(matches!(first, Err(TrayError::Os(_))));
        assert!(second.is_ok());
        assert_eq!(f.os.icon_count(), 1);
    }

    #[test]
    fn show_before_initialize_fails() {
        // Arrange
        let (tx, _rx) = mpsc::channel();
        let mut manager = TrayManager::new(FakeTrayOs::default(), ResourceIds::DEFAULT, tx);

        // Act / Assert
        assert_eq!(manager.show(), Err(TrayError::NotInitialized));
    }

    #[test]
    fn hide_tolerates_not_shown() {
        // Arrange
        let mut f = fixture();

        // Act
        f.manager.hide();
        f.manager.show().unwrap();
        f.manager.hide();
        f.manager.hide();

        // Assert
        assert_eq!(f.os.icon_count(), 0);
        assert!(!f.manager.is_visible());
    }

    #[test]
    fn each_click_kind_raises_one_activation() {
        for sub_event in [WM_LBUTTONUP, WM_LBUTTONDBLCLK, WM_RBUTTONUP] {
            // Arrange
            let f = fixture();

            // Act
            let result = f.window.send(&f.hook, tray_message(sub_event));

            // Assert
            assert_eq!(result, 0);
            assert_eq!(f.events.try_recv(), Ok(AppEvent::TrayActivationRequested));
            assert!(f.events.try_recv().is_err(), "sub-event {sub_event:#x}");
        }
    }

    #[test]
    fn mouse_move_is_forwarded() {
        // Arrange
        let f = fixture();

        // Act
        f.window.send(&f.hook, tray_message(WM_MOUSEMOVE));

        // Assert
        assert!(f.events.try_recv().is_err());
        assert_eq!(f.window.original_calls().len(), 1);
    }

    #[test]
    fn sub_event_uses_low_word_only() {
        // Arrange
        let f = fixture();
        let ids = ResourceIds::DEFAULT;
        let lparam = ((5_isize) << 16) | WM_RBUTTONUP as isize;

        // Act
        let handled = f
            .manager
            .handle_tray_message(&Message::new(ids.tray_callback, ids.tray_icon_id as usize, lparam));

        // Assert
        assert!(handled);
    }

    #[test]
    fn tooltip_is_truncated_on_char_boundary() {
        // Arrange
        let long = "é".repeat(200);
        let emoji = "😀".repeat(70);

        // Act
        let cut = truncate_tooltip(&long);
        let cut_emoji = truncate_tooltip(&emoji);

        // Assert
        assert_eq!(cut.chars().count(), TOOLTIP_MAX_UNITS);
        assert_eq!(cut_emoji.encode_utf16().count(), 126);
        assert_eq!(truncate_tooltip("Summon"), "Summon");
    }

    #[test]
    fn set_tooltip_updates_live_icon() {
        // Arrange
        let mut f = fixture();
        f.manager.show().unwrap();

        // Act
        f.manager.set_tooltip("Summon (paused)");

        // Assert
        let icon = f.os.icon(WINDOW, ResourceIds::DEFAULT.tray_icon_id).unwrap();
        assert_eq!(icon.tooltip, "Summon (paused)");
    }

    #[test]
    fn shell_restart_re_adds_visible_icon() {
        // Arrange
        let mut f = fixture_with(FakeTrayOs::with_taskbar_created(TASKBAR_CREATED));
        f.manager.show().unwrap();
        f.os.restart_shell();

        // Act
        let result = f.window.send(&f.hook, Message::new(TASKBAR_CREATED, 0, 0));
        f.manager.restore_after_shell_restart();

        // Assert
        assert_eq!(result, crate::fake::ORIGINAL_RESULT);
        assert_eq!(f.os.icon_count(), 1);
        assert_eq!(f.os.add_calls(), 2);
    }

    #[test]
    fn shell_restart_leaves_hidden_icon_hidden() {
        // Arrange
        let mut f = fixture_with(FakeTrayOs::with_taskbar_created(TASKBAR_CREATED));

        // Act
        f.window.send(&f.hook, Message::new(TASKBAR_CREATED, 0, 0));
        f.manager.restore_after_shell_restart();

        // Assert
        assert_eq!(f.os.icon_count(), 0);
    }

    #[test]
    fn dispose_removes_icon_and_subscriptions() {
        // Arrange
        let mut f = fixture();
        f.manager.show().unwrap();

        // Act
        f.manager.dispose();
        f.window.send(&f.hook, tray_message(WM_LBUTTONUP));

        // Assert
        assert_eq!(f.os.icon_count(), 0);
        assert!(f.events.try_recv().is_err());
    }
}
