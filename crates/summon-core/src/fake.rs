//! In-memory stand-ins for the OS, used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{HOTKEY_ALREADY_REGISTERED, OsError};
use crate::hook::MessageHook;
use crate::ids::ResourceIds;
use crate::keys::MOD_NOREPEAT;
use crate::os::{
    HotkeyApi, Message, PreviousProc, ProcedureSlot, TrayApi, TrayRegistration, WindowHandle,
};

/// What the original window procedure returns.
pub const ORIGINAL_RESULT: isize = 42;

const ORIGINAL_PROC: PreviousProc = PreviousProc(0x0B0B);

#[derive(Default)]
struct WindowState {
    hooked: Cell<bool>,
    fail_replace: Cell<bool>,
    replace_calls: Cell<u32>,
    restore_calls: Cell<u32>,
    original_calls: RefCell<Vec<Message>>,
    journal: RefCell<Option<Journal>>,
}

/// A window whose procedure slot records what reaches the original.
#[derive(Clone, Default)]
pub struct FakeWindow(Rc<WindowState>);

impl FakeWindow {
    /// Delivers a message the way the OS would: through the hook while
    /// it is installed, straight to the original procedure otherwise.
    pub fn send<P: ProcedureSlot>(&self, hook: &MessageHook<P>, msg: Message) -> isize {
        if self.0.hooked.get() {
            hook.dispatch(msg)
        } else {
            self.original(msg)
        }
    }

    pub fn original_calls(&self) -> Vec<Message> {
        self.0.original_calls.borrow().clone()
    }

    pub fn is_hooked(&self) -> bool {
        self.0.hooked.get()
    }

    pub fn fail_replace(&self) {
        self.0.fail_replace.set(true);
    }

    pub fn replace_calls(&self) -> u32 {
        self.0.replace_calls.get()
    }

    pub fn restore_calls(&self) -> u32 {
        self.0.restore_calls.get()
    }

    pub fn record_into(&self, journal: &Journal) {
        *self.0.journal.borrow_mut() = Some(journal.clone());
    }

    fn original(&self, msg: Message) -> isize {
        self.0.original_calls.borrow_mut().push(msg);
        ORIGINAL_RESULT
    }
}

impl ProcedureSlot for FakeWindow {
    fn replace(&self, _window: WindowHandle) -> Result<PreviousProc, OsError> {
        self.0.replace_calls.set(self.0.replace_calls.get() + 1);
        if self.0.fail_replace.get() {
            return Err(OsError::new("SetWindowLongPtrW", 5));
        }
        self.0.hooked.set(true);
        Ok(ORIGINAL_PROC)
    }

    fn restore(&self, _window: WindowHandle, previous: PreviousProc) -> Result<(), OsError> {
        assert_eq!(previous, ORIGINAL_PROC);
        self.0.restore_calls.set(self.0.restore_calls.get() + 1);
        if let Some(journal) = self.0.journal.borrow().as_ref() {
            journal.record("window.restore");
        }
        self.0.hooked.set(false);
        Ok(())
    }

    fn call_previous(&self, previous: PreviousProc, _window: WindowHandle, msg: Message) -> isize {
        assert_eq!(previous, ORIGINAL_PROC);
        self.original(msg)
    }
}

/// `ERROR_HOTKEY_NOT_REGISTERED`.
const HOTKEY_NOT_REGISTERED: u32 = 1419;

/// Window used for combinations another program owns.
const FOREIGN_WINDOW: WindowHandle = 0;

struct Registration {
    window: WindowHandle,
    id: i32,
    /// (modifiers without NOREPEAT, vk)
    combo: (u32, u32),
}

#[derive(Default)]
struct HotkeyState {
    active: Vec<Registration>,
    register_calls: u32,
    unregister_calls: u32,
    journal: Option<Journal>,
}

/// A process-wide hotkey table following `RegisterHotKey` rules: a
/// combination has one owner, but a repeated (window, id) pair is
/// accepted and kept next to the first. Clones share state, like two
/// managers talking to the same OS.
#[derive(Clone, Default)]
pub struct FakeHotkeyOs(Rc<RefCell<HotkeyState>>);

impl FakeHotkeyOs {
    pub fn active_count(&self) -> usize {
        self.0.borrow().active.len()
    }

    /// Registrations the OS holds under `id`, on any window.
    pub fn registrations_with_id(&self, id: i32) -> usize {
        self.0.borrow().active.iter().filter(|r| r.id == id).count()
    }

    pub fn register_calls(&self) -> u32 {
        self.0.borrow().register_calls
    }

    pub fn unregister_calls(&self) -> u32 {
        self.0.borrow().unregister_calls
    }

    /// Simulates another program owning a combination.
    pub fn occupy(&self, modifiers: u32, vk: u32) {
        self.0.borrow_mut().active.push(Registration {
            window: FOREIGN_WINDOW,
            id: -1,
            combo: (modifiers & !MOD_NOREPEAT, vk),
        });
    }

    pub fn record_into(&self, journal: &Journal) {
        self.0.borrow_mut().journal = Some(journal.clone());
    }
}

impl HotkeyApi for FakeHotkeyOs {
    fn register(
        &mut self,
        window: WindowHandle,
        id: i32,
        modifiers: u32,
        vk: u32,
    ) -> Result<(), OsError> {
        let mut state = self.0.borrow_mut();
        state.register_calls += 1;
        let combo = (modifiers & !MOD_NOREPEAT, vk);
        if state.active.iter().any(|r| r.combo == combo) {
            return Err(OsError::new("RegisterHotKey", HOTKEY_ALREADY_REGISTERED));
        }
        state.active.push(Registration { window, id, combo });
        Ok(())
    }

    fn unregister(&mut self, window: WindowHandle, id: i32) -> Result<(), OsError> {
        let mut state = self.0.borrow_mut();
        state.unregister_calls += 1;
        if let Some(journal) = &state.journal {
            journal.record("hotkey.unregister");
        }
        match state.active.iter().position(|r| r.window == window && r.id == id) {
            Some(i) => {
                state.active.remove(i);
                Ok(())
            }
            None => Err(OsError::new("UnregisterHotKey", HOTKEY_NOT_REGISTERED)),
        }
    }
}

/// Hotkey ids handed out to tests so parallel tests never share a claim.
static NEXT_TEST_HOTKEY_ID: AtomicI32 = AtomicI32::new(0x1000);

/// The default allocation with a hotkey id no other test uses.
pub fn unique_ids() -> ResourceIds {
    ResourceIds {
        hotkey_id: NEXT_TEST_HOTKEY_ID.fetch_add(1, Ordering::Relaxed),
        ..ResourceIds::DEFAULT
    }
}

/// Shared log of release calls across fakes, in the order they happen.
#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<&'static str>>>);

impl Journal {
    pub fn record(&self, entry: &'static str) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.borrow().clone()
    }
}

#[derive(Default)]
struct TrayState {
    icons: HashMap<(WindowHandle, u32), TrayRegistration>,
    unavailable: bool,
    add_calls: u32,
    taskbar_created: Option<u32>,
    journal: Option<Journal>,
}

/// A notification area holding icons in memory.
#[derive(Clone, Default)]
pub struct FakeTrayOs(Rc<RefCell<TrayState>>);

impl FakeTrayOs {
    pub fn with_taskbar_created(code: u32) -> Self {
        let tray = Self::default();
        tray.0.borrow_mut().taskbar_created = Some(code);
        tray
    }

    pub fn icon(&self, window: WindowHandle, icon_id: u32) -> Option<TrayRegistration> {
        self.0.borrow().icons.get(&(window, icon_id)).cloned()
    }

    pub fn icon_count(&self) -> usize {
        self.0.borrow().icons.len()
    }

    pub fn add_calls(&self) -> u32 {
        self.0.borrow().add_calls
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.0.borrow_mut().unavailable = unavailable;
    }

    pub fn record_into(&self, journal: &Journal) {
        self.0.borrow_mut().journal = Some(journal.clone());
    }

    /// Simulates the shell restarting and forgetting every icon.
    pub fn restart_shell(&self) {
        self.0.borrow_mut().icons.clear();
    }
}

impl TrayApi for FakeTrayOs {
    fn add(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError> {
        let mut state = self.0.borrow_mut();
        state.add_calls += 1;
        if state.unavailable || state.icons.contains_key(&(window, record.icon_id)) {
            return Err(OsError::new("Shell_NotifyIconW(NIM_ADD)", 0));
        }
        state
            .icons
            .insert((window, record.icon_id), record.clone());
        Ok(())
    }

    fn modify(&mut self, window: WindowHandle, record: &TrayRegistration) -> Result<(), OsError> {
        let mut state = self.0.borrow_mut();
        match state.icons.get_mut(&(window, record.icon_id)) {
            Some(icon) => {
                *icon = record.clone();
                Ok(())
            }
            None => Err(OsError::new("Shell_NotifyIconW(NIM_MODIFY)", 0)),
        }
    }

    fn delete(&mut self, window: WindowHandle, icon_id: u32) -> Result<(), OsError> {
        let mut state = self.0.borrow_mut();
        if let Some(journal) = &state.journal {
            journal.record("tray.delete");
        }
        match state.icons.remove(&(window, icon_id)) {
            Some(_) => Ok(()),
            None => Err(OsError::new("Shell_NotifyIconW(NIM_DELETE)", 0)),
        }
    }

    fn taskbar_created_code(&self) -> Option<u32> {
        self.0.borrow().taskbar_created
    }
}
