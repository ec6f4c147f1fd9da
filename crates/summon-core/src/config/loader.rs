use std::path::PathBuf;

use super::Config;

/// Returns the config directory: `~/.config/summon/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("summon"))
}

/// Returns the config file path: `~/.config/summon/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Returns the log directory: `~/.config/summon/logs/`.
pub fn log_dir() -> Option<PathBuf> {
    config_dir().map(|d| d.join("logs"))
}

/// Tries to load and parse `config.toml`.
///
/// Returns `Ok(Config)` on success, or an error string describing
/// what went wrong (IO error, parse error, etc.).
pub fn try_load() -> Result<Config, String> {
    let path = config_path().ok_or("could not determine config path")?;
    let content = std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    parse(&content).map_err(|e| format!("{}: {e}", path.display()))
}

/// Like [`try_load`], but also rejects a hotkey binding that cannot be
/// translated to OS codes. Used for live reloads, so a bad edit never
/// reaches the window thread.
pub fn try_load_valid() -> Result<Config, String> {
    let path = config_path().ok_or("could not determine config path")?;
    let content = std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    parse_valid(&content).map_err(|e| format!("{}: {e}", path.display()))
}

/// Loads the configuration from disk, falling back to defaults.
///
/// A missing file silently returns defaults. Other errors print a
/// warning to stderr, since this runs before logging is set up.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match try_load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}; using defaults");
            Config::default()
        }
    }
}

/// Writes the default configuration if no config file exists yet.
///
/// Returns the path and whether a file was created.
pub fn write_default() -> Result<(PathBuf, bool), String> {
    let path = config_path().ok_or("could not determine config path")?;
    if path.exists() {
        return Ok((path, false));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| format!("{}: {e}", dir.display()))?;
    }
    let content = render(&Config::default())?;
    std::fs::write(&path, content).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok((path, true))
}

pub(super) fn parse(content: &str) -> Result<Config, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

pub(super) fn parse_valid(content: &str) -> Result<Config, String> {
    let config = parse(content)?;
    config.hotkey.resolve().map_err(|e| format!("[hotkey]: {e}"))?;
    Ok(config)
}

pub(super) fn render(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config).map_err(|e| e.to_string())
}
