use thiserror::Error;

/// An OS call that returned failure, with the platform error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{call} failed (os error {code})")]
pub struct OsError {
    pub code: u32,
    pub call: &'static str,
}

impl OsError {
    pub fn new(call: &'static str, code: u32) -> Self {
        Self { code, call }
    }
}

/// A binding that cannot be turned into OS codes.
///
/// Detected before any OS call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("unknown key name {0:?}")]
    UnknownKey(String),
    #[error("an enabled hotkey needs at least one modifier")]
    NoModifiers,
    #[error("cannot parse binding {0:?}")]
    Parse(String),
}

/// Why a hotkey could not be registered.
///
/// The `Display` output is the reason carried by
/// [`AppEvent::HotkeyRegistrationFailed`](crate::AppEvent).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("invalid binding: {0}")]
    Binding(#[from] BindingError),
    #[error("hotkey manager has no window")]
    NotInitialized,
    #[error("{binding} is unavailable: {source}{}", hint(.source.code))]
    Os {
        binding: String,
        #[source]
        source: OsError,
    },
    /// Another registration in this process holds the id. Checked
    /// before the OS is asked, which would accept the duplicate.
    #[error("{binding} is unavailable: hotkey id {id:#x} is already registered in this process")]
    IdInUse { binding: String, id: i32 },
}

/// `ERROR_HOTKEY_ALREADY_REGISTERED`.
pub const HOTKEY_ALREADY_REGISTERED: u32 = 1409;

fn hint(code: u32) -> &'static str {
    if code == HOTKEY_ALREADY_REGISTERED {
        " (the combination is already registered by another program)"
    } else {
        ""
    }
}

/// Failure to take over a window's message procedure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("message hook is already installed on window {0:#x}")]
    AlreadyInstalled(usize),
    #[error(transparent)]
    Os(#[from] OsError),
}

/// A handler failure caught at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Notification-area icon failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrayError {
    #[error("tray manager has no window")]
    NotInitialized,
    #[error(transparent)]
    Os(#[from] OsError),
}
