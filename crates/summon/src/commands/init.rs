use summon_core::config;

/// Creates `~/.config/summon/config.toml` with the defaults.
///
/// An existing file is not overwritten.
pub fn execute() {
    match config::write_default() {
        Ok((path, true)) => println!("Created {}", path.display()),
        Ok((path, false)) => println!("Already exists: {}", path.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
