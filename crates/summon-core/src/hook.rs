//! Message dispatch hook.
//!
//! Owns the interception of one window's message stream. While
//! installed, every message for the window passes through
//! [`MessageHook::dispatch`], which offers it to the handlers subscribed
//! to its code and forwards anything unhandled to the procedure that was
//! installed before.
//!
//! Everything here runs on the thread that owns the window.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::error::{DispatchError, HookError};
use crate::os::{Message, PreviousProc, ProcedureSlot, WindowHandle};

/// A message handler. Returns `Ok(true)` when it consumed the message.
pub type Handler = Box<dyn FnMut(&Message) -> Result<bool, DispatchError>>;

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The registry side of the hook, as seen by the managers.
///
/// Managers only need to add and remove handlers, so they depend on this
/// trait rather than on the hook itself. Tests substitute a fake.
pub trait Subscriptions {
    fn subscribe(&self, code: u32, handler: Handler) -> SubscriptionId;

    /// Returns `false` if `id` was not subscribed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct Subscription {
    id: SubscriptionId,
    code: u32,
    handler: Handler,
}

#[derive(Debug, Clone, Copy)]
struct Installed {
    window: WindowHandle,
    previous: PreviousProc,
}

/// Intercepts a window's message procedure and routes messages by code.
pub struct MessageHook<P: ProcedureSlot> {
    slot: P,
    installed: Cell<Option<Installed>>,
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl<P: ProcedureSlot> MessageHook<P> {
    pub fn new(slot: P) -> Self {
        Self {
            slot,
            installed: Cell::new(None),
            subscriptions: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Swaps the window's procedure for the hook, keeping the old one.
    ///
    /// Fails if already installed or if the OS refuses the swap. Either
    /// way the window keeps working with its current procedure.
    pub fn install(&self, window: WindowHandle) -> Result<(), HookError> {
        if let Some(current) = self.installed.get() {
            return Err(HookError::AlreadyInstalled(current.window));
        }
        let previous = self.slot.replace(window)?;
        self.installed.set(Some(Installed { window, previous }));
        debug!(window = format_args!("{window:#x}"), "message hook installed");
        Ok(())
    }

    /// Restores the original procedure. Does nothing if not installed.
    ///
    /// If the OS refuses the restore the hook stays installed, so
    /// messages keep reaching the original procedure through it.
    pub fn uninstall(&self) -> Result<(), HookError> {
        let Some(current) = self.installed.get() else {
            return Ok(());
        };
        self.slot.restore(current.window, current.previous)?;
        self.installed.set(None);
        debug!(
            window = format_args!("{:#x}", current.window),
            "message hook uninstalled"
        );
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    /// The window the hook is installed on.
    pub fn window(&self) -> Option<WindowHandle> {
        self.installed.get().map(|i| i.window)
    }

    /// Routes one message.
    ///
    /// Handlers subscribed to `msg.code` run in subscription order until
    /// one reports the message handled, in which case `0` is returned.
    /// Otherwise the message goes to the previous procedure and its
    /// result is returned. Handler errors and panics are logged and
    /// count as "not handled"; they never reach the OS.
    pub fn dispatch(&self, msg: Message) -> isize {
        let Some(current) = self.installed.get() else {
            return 0;
        };
        if self.run_handlers(&msg) {
            return 0;
        }
        self.slot.call_previous(current.previous, current.window, msg)
    }

    fn run_handlers(&self, msg: &Message) -> bool {
        // A handler that makes the window process another message
        // synchronously re-enters here; that inner message skips the
        // handlers and goes straight to the previous procedure.
        let Ok(mut subscriptions) = self.subscriptions.try_borrow_mut() else {
            debug!(code = msg.code, "re-entrant dispatch, forwarding");
            return false;
        };

        for sub in subscriptions.iter_mut().filter(|s| s.code == msg.code) {
            match invoke(&mut sub.handler, msg) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    error!(code = msg.code, subscription = sub.id.0, error = %e, "message handler failed");
                }
            }
        }
        false
    }
}

impl<P: ProcedureSlot> Subscriptions for MessageHook<P> {
    fn subscribe(&self, code: u32, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions
            .borrow_mut()
            .push(Subscription { id, code, handler });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }
}

impl<P: ProcedureSlot> Drop for MessageHook<P> {
    fn drop(&mut self) {
        if let Err(e) = self.uninstall() {
            warn!(error = %e, "failed to restore window procedure on drop");
        }
    }
}

fn invoke(handler: &mut Handler, msg: &Message) -> Result<bool, DispatchError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(msg))) {
        Ok(result) => result,
        Err(payload) => Err(DispatchError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

/// A set of subscriptions on one hook, removed together on drop.
///
/// Holds the hook weakly so a manager never keeps it alive.
pub struct Attachment {
    hook: Weak<dyn Subscriptions>,
    ids: Vec<SubscriptionId>,
}

impl Attachment {
    pub fn new<H: Subscriptions + 'static>(hook: &Rc<H>) -> Self {
        let hook: Weak<dyn Subscriptions> = Rc::downgrade(hook) as Weak<dyn Subscriptions>;
        Self {
            hook,
            ids: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, code: u32, handler: Handler) {
        if let Some(hook) = self.hook.upgrade() {
            self.ids.push(hook.subscribe(code, handler));
        }
    }

    /// Removes every subscription made through this attachment.
    pub fn detach(&mut self) {
        let ids = std::mem::take(&mut self.ids);
        if let Some(hook) = self.hook.upgrade() {
            for id in ids {
                hook.unsubscribe(id);
            }
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeWindow, ORIGINAL_RESULT};

    const WINDOW: WindowHandle = 0x1234;
    const CODE: u32 = 0x8001;

    fn hook() -> (FakeWindow, MessageHook<FakeWindow>) {
        let window = FakeWindow::default();
        (window.clone(), MessageHook::new(window))
    }

    #[test]
    fn unmatched_message_reaches_original() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();

        // Act
        let result = window.send(&hook, Message::new(0x0010, 1, 2));

        // Assert
        assert_eq!(result, ORIGINAL_RESULT);
        assert_eq!(window.original_calls(), vec![Message::new(0x0010, 1, 2)]);
    }

    #[test]
    fn handled_message_short_circuits() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();
        hook.subscribe(CODE, Box::new(|_| Ok(true)));

        // Act
        let result = window.send(&hook, Message::new(CODE, 0, 0));

        // Assert
        assert_eq!(result, 0);
        assert!(window.original_calls().is_empty());
    }

    #[test]
    fn unhandled_match_is_forwarded() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        hook.subscribe(
            CODE,
            Box::new(move |_| {
                counter.set(counter.get() + 1);
                Ok(false)
            }),
        );

        // Act
        let result = window.send(&hook, Message::new(CODE, 0, 0));

        // Assert
        assert_eq!(seen.get(), 1);
        assert_eq!(result, ORIGINAL_RESULT);
        assert_eq!(window.original_calls().len(), 1);
    }

    #[test]
    fn second_install_fails_without_touching_window() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();

        // Act
        let result = hook.install(WINDOW);

        // Assert
        assert_eq!(result, Err(HookError::AlreadyInstalled(WINDOW)));
        assert_eq!(window.replace_calls(), 1);
    }

    #[test]
    fn os_refusal_leaves_hook_uninstalled() {
        // Arrange
        let (window, hook) = hook();
        window.fail_replace();

        // Act
        let result = hook.install(WINDOW);

        // Assert
        assert!(matches!(result, Err(HookError::Os(_))));
        assert!(!hook.is_installed());
    }

    #[test]
    fn uninstall_restores_original_dispatch() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        hook.subscribe(
            CODE,
            Box::new(move |_| {
                counter.set(counter.get() + 1);
                Ok(true)
            }),
        );

        // Act
        hook.uninstall().unwrap();
        let result = window.send(&hook, Message::new(CODE, 7, 8));

        // Assert
        assert_eq!(seen.get(), 0);
        assert_eq!(result, ORIGINAL_RESULT);
        assert_eq!(window.original_calls(), vec![Message::new(CODE, 7, 8)]);
        assert!(!window.is_hooked());
    }

    #[test]
    fn uninstall_is_idempotent() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();

        // Act
        hook.uninstall().unwrap();
        let again = hook.uninstall();

        // Assert
        assert!(again.is_ok());
        assert_eq!(window.restore_calls(), 1);
    }

    #[test]
    fn reinstall_after_uninstall_succeeds() {
        // Arrange
        let (_window, hook) = hook();
        hook.install(WINDOW).unwrap();
        hook.uninstall().unwrap();

        // Act / Assert
        assert!(hook.install(WINDOW).is_ok());
    }

    #[test]
    fn panicking_handler_is_treated_as_unhandled() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();
        hook.subscribe(CODE, Box::new(|_| panic!("boom")));

        // Act
        let result = window.send(&hook, Message::new(CODE, 0, 0));

        // Assert
        assert_eq!(result, ORIGINAL_RESULT);
        assert_eq!(window.original_calls().len(), 1);
    }

    #[test]
    fn failing_handler_does_not_stop_later_handlers() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();
        hook.subscribe(
            CODE,
            Box::new(|_| Err(DispatchError::Handler("bad payload".into()))),
        );
        hook.subscribe(CODE, Box::new(|_| Ok(true)));

        // Act
        let result = window.send(&hook, Message::new(CODE, 0, 0));

        // Assert
        assert_eq!(result, 0);
        assert!(window.original_calls().is_empty());
    }

    #[test]
    fn attachment_drop_unsubscribes() {
        // Arrange
        let window = FakeWindow::default();
        let hook = Rc::new(MessageHook::new(window.clone()));
        hook.install(WINDOW).unwrap();
        let mut attachment = Attachment::new(&hook);
        attachment.subscribe(CODE, Box::new(|_| Ok(true)));

        // Act
        drop(attachment);
        let result = window.send(&hook, Message::new(CODE, 0, 0));

        // Assert
        assert_eq!(result, ORIGINAL_RESULT);
    }

    #[test]
    fn drop_restores_window_procedure() {
        // Arrange
        let (window, hook) = hook();
        hook.install(WINDOW).unwrap();

        // Act
        drop(hook);

        // Assert
        assert!(!window.is_hooked());
    }
}
