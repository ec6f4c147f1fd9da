use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use tracing::{debug, info, warn};

use crate::config::HotkeyBinding;
use crate::error::RegistrationError;
use crate::event::AppEvent;
use crate::hook::{Attachment, Subscriptions};
use crate::ids::{HotkeyIdClaim, ResourceIds};
use crate::os::{HotkeyApi, Message, WindowHandle};

/// Manages the one global hotkey.
///
/// The hotkey is registered against a window, so `WM_HOTKEY` arrives
/// through that window's procedure and reaches us via the message hook.
/// All calls must happen on the thread that owns the window.
///
/// States: unregistered, or registered with exactly one binding.
/// Re-registering replaces the binding; disposal (or drop) always ends
/// unregistered. While registered the manager holds a process-wide
/// claim on its id, so a second manager with the same id is refused.
pub struct HotkeyManager<A: HotkeyApi> {
    api: A,
    ids: ResourceIds,
    window: Option<WindowHandle>,
    active: Option<Active>,
    /// Shared with the activation handler so stale messages are ignored.
    armed: Rc<Cell<bool>>,
    events: Sender<AppEvent>,
    attachment: Option<Attachment>,
}

/// The binding the OS holds, with the id claim that guards it.
struct Active {
    binding: HotkeyBinding,
    _claim: HotkeyIdClaim,
}

impl<A: HotkeyApi> HotkeyManager<A> {
    /// Creates a manager. Nothing is registered yet.
    ///
    /// Activations and failures are sent through `events`.
    pub fn new(api: A, ids: ResourceIds, events: Sender<AppEvent>) -> Self {
        Self {
            api,
            ids,
            window: None,
            active: None,
            armed: Rc::new(Cell::new(false)),
            events,
            attachment: None,
        }
    }

    /// Binds the manager to `window` and subscribes to activation
    /// messages on `hook`. Registers nothing.
    pub fn initialize<H: Subscriptions + 'static>(&mut self, window: WindowHandle, hook: &Rc<H>) {
        self.window = Some(window);

        let mut attachment = Attachment::new(hook);
        let id = self.ids.hotkey_id;
        let armed = self.armed.clone();
        let events = self.events.clone();
        attachment.subscribe(
            self.ids.activation_code(),
            Box::new(move |msg| Ok(on_activation(id, &armed, &events, msg))),
        );
        self.attachment = Some(attachment);
    }

    /// Registers `binding`, replacing any active one.
    ///
    /// The binding is translated first, so a bad key name or missing
    /// modifier fails without touching the OS or the current
    /// registration. A disabled binding just unregisters. Failures are
    /// reported once through [`AppEvent::HotkeyRegistrationFailed`] and
    /// returned; nothing is retried.
    pub fn register(&mut self, binding: &HotkeyBinding) -> Result<(), RegistrationError> {
        let result = self.try_register(binding);
        if let Err(e) = &result {
            warn!(binding = %binding, error = %e, "hotkey registration failed");
            let _ = self.events.send(AppEvent::HotkeyRegistrationFailed {
                reason: e.to_string(),
            });
        }
        result
    }

    fn try_register(&mut self, binding: &HotkeyBinding) -> Result<(), RegistrationError> {
        let resolved = binding.resolve()?;
        let window = self.window.ok_or(RegistrationError::NotInitialized)?;

        self.unregister();

        if !binding.enabled {
            info!(binding = %binding, "hotkey disabled");
            return Ok(());
        }

        let id = self.ids.hotkey_id;
        let claim = HotkeyIdClaim::acquire(id).ok_or_else(|| RegistrationError::IdInUse {
            binding: binding.to_string(),
            id,
        })?;

        self.api
            .register(window, id, resolved.modifiers, resolved.vk)
            .map_err(|source| RegistrationError::Os {
                binding: binding.to_string(),
                source,
            })?;

        self.active = Some(Active {
            binding: binding.clone(),
            _claim: claim,
        });
        self.armed.set(true);
        info!(binding = %binding, id = self.ids.hotkey_id, "hotkey registered");
        Ok(())
    }

    /// Releases the active registration. No-op when nothing is active.
    ///
    /// Must run before the window is destroyed; a registration that
    /// outlives its window stays taken for the rest of the session.
    pub fn unregister(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.armed.set(false);
        let Some(window) = self.window else {
            return;
        };
        let binding = &active.binding;
        match self.api.unregister(window, self.ids.hotkey_id) {
            Ok(()) => debug!(binding = %binding, "hotkey unregistered"),
            Err(e) => warn!(binding = %binding, error = %e, "failed to unregister hotkey"),
        }
        // The id claim is released here, after the OS call.
    }

    /// Decodes a `WM_HOTKEY` message.
    ///
    /// Raises [`AppEvent::HotkeyActivated`] and returns `true` only when
    /// the payload carries our registration id and we are registered.
    pub fn handle_activation_message(&self, msg: &Message) -> bool {
        on_activation(self.ids.hotkey_id, &self.armed, &self.events, msg)
    }

    /// Unregisters and detaches from the hook. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.unregister();
        self.attachment = None;
    }

    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }

    /// The binding currently held by the OS, if any.
    pub fn active_binding(&self) -> Option<&HotkeyBinding> {
        self.active.as_ref().map(|a| &a.binding)
    }

    pub fn registration_id(&self) -> i32 {
        self.ids.hotkey_id
    }
}

impl<A: HotkeyApi> Drop for HotkeyManager<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn on_activation(id: i32, armed: &Cell<bool>, events: &Sender<AppEvent>, msg: &Message) -> bool {
    // Another hotkey registered on the same window carries a different id.
    if msg.wparam != id as usize || !armed.get() {
        return false;
    }
    let _ = events.send(AppEvent::HotkeyActivated);
    true
}
