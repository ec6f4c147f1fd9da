use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use summon_core::{AppEvent, Config, OsError};
use tracing::info;
use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, MSG, TranslateMessage};

use crate::config_watcher::{self, ReloadTarget};
use crate::ctrl_c;
use crate::host::HostWindow;
use crate::session;

/// Runs Summon on the current thread until the host window is closed
/// (Ctrl+C, console close and session end close it too).
///
/// Creates the hidden host window, starts a session on it and pumps
/// messages. Every [`AppEvent`] is handed to `on_event` on this thread
/// once the message that raised it has been dispatched. Teardown order
/// is fixed: session (tray, hotkey, hook) first, then the window.
pub fn run(config: Config, mut on_event: impl FnMut(&AppEvent)) -> Result<(), OsError> {
    let host = HostWindow::create()?;
    let window = host.handle();

    let (event_tx, event_rx) = mpsc::channel();
    let started = session::start(window, &config, event_tx);
    let wake_code = started.ids().config_reload;
    session::enter(started);

    ctrl_c::set_handler(window);

    let (reload_tx, reload_rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let target = ReloadTarget {
        tx: reload_tx,
        window,
        wake_code,
    };
    let watcher_stop = stop.clone();
    // Detached: it notices the stop flag within one wait timeout.
    thread::spawn(move || config_watcher::watch(target, watcher_stop));

    info!(hotkey = %config.hotkey, "summon running");
    run_message_pump(wake_code, &event_rx, &reload_rx, &mut on_event);

    stop.store(true, Ordering::Relaxed);
    session::end();
    drop(host);
    ctrl_c::teardown_finished();
    info!("summon stopped");
    Ok(())
}

/// The Win32 message pump. Applies config reloads, dispatches
/// everything else, and blocks until WM_QUIT is received.
fn run_message_pump(
    wake_code: u32,
    events: &Receiver<AppEvent>,
    reloads: &Receiver<Config>,
    on_event: &mut impl FnMut(&AppEvent),
) {
    // Startup may already have raised a registration failure.
    events.try_iter().for_each(|event| on_event(&event));

    let mut msg = MSG::default();

    loop {
        // 0 is WM_QUIT, -1 is an error; both end the loop.
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) }.0;
        if status == 0 || status == -1 {
            break;
        }

        if msg.message == wake_code {
            session::with_current(|session| {
                for config in reloads.try_iter() {
                    session.apply(&config);
                }
            });
        } else {
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            session::with_current(|session| session.after_dispatch());
        }

        events.try_iter().for_each(|event| on_event(&event));
    }
}
