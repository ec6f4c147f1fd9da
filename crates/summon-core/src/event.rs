/// Signals raised by the hotkey and tray managers.
///
/// Delivered to the application controller over a channel. Managers
/// never talk to each other; they only raise these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The registered global hotkey was pressed.
    HotkeyActivated,
    /// Registering the hotkey failed. Carries a human-readable reason.
    HotkeyRegistrationFailed { reason: String },
    /// The tray icon was clicked, double-clicked or right-clicked.
    TrayActivationRequested,
}
