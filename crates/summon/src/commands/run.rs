use summon_core::{AppEvent, config};

/// Runs the hotkey and tray integration in the foreground.
///
/// Activations are reported on stdout; the launcher UI that would
/// react to them lives outside this binary.
pub fn execute() {
    let config = config::load();
    let _log_guard = summon_core::log::init(&config.log);

    if let Err(e) = run(config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run(config: summon_core::Config) -> Result<(), String> {
    summon_windows::run(config, report).map_err(|e| e.to_string())
}

#[cfg(not(windows))]
fn run(_config: summon_core::Config) -> Result<(), String> {
    Err("summon run is only supported on Windows".into())
}

#[cfg_attr(not(windows), allow(dead_code))]
fn report(event: &AppEvent) {
    match event {
        AppEvent::HotkeyActivated => println!("Hotkey pressed"),
        AppEvent::TrayActivationRequested => println!("Tray icon clicked"),
        AppEvent::HotkeyRegistrationFailed { reason } => {
            eprintln!("Hotkey unavailable: {reason}");
            tracing::error!(%reason, "hotkey registration failed");
        }
    }
}
