//! Symbolic key names and modifiers to Win32 codes.

use crate::config::Modifier;

/// `MOD_ALT`.
pub const MOD_ALT: u32 = 0x0001;
/// `MOD_CONTROL`.
pub const MOD_CONTROL: u32 = 0x0002;
/// `MOD_SHIFT`.
pub const MOD_SHIFT: u32 = 0x0004;
/// `MOD_WIN`.
pub const MOD_WIN: u32 = 0x0008;
/// `MOD_NOREPEAT`: holding the combination fires once.
pub const MOD_NOREPEAT: u32 = 0x4000;

/// Highest function key we accept (`VK_F24`).
const MAX_FUNCTION_KEY: u32 = 24;

/// Named keys and their virtual key codes. The first spelling of each
/// code is the canonical one.
const NAMED_KEYS: &[(&str, u32)] = &[
    // Navigation
    ("ENTER", 0x0D),
    ("RETURN", 0x0D),
    ("TAB", 0x09),
    ("ESCAPE", 0x1B),
    ("ESC", 0x1B),
    ("SPACE", 0x20),
    ("BACKSPACE", 0x08),
    ("DELETE", 0x2E),
    ("DEL", 0x2E),
    ("INSERT", 0x2D),
    ("INS", 0x2D),
    ("HOME", 0x24),
    ("END", 0x23),
    ("PAGEUP", 0x21),
    ("PGUP", 0x21),
    ("PAGEDOWN", 0x22),
    ("PGDN", 0x22),
    ("PAUSE", 0x13),
    ("PRINTSCREEN", 0x2C),
    // Arrow keys
    ("LEFT", 0x25),
    ("UP", 0x26),
    ("RIGHT", 0x27),
    ("DOWN", 0x28),
    // Punctuation / OEM keys
    ("MINUS", 0xBD),
    ("PLUS", 0xBB),
    ("EQUALS", 0xBB),
    ("COMMA", 0xBC),
    ("PERIOD", 0xBE),
    ("DOT", 0xBE),
    ("SLASH", 0xBF),
    ("SEMICOLON", 0xBA),
    ("BACKSLASH", 0xDC),
    ("LBRACKET", 0xDB),
    ("RBRACKET", 0xDD),
    ("QUOTE", 0xDE),
    ("BACKTICK", 0xC0),
    ("GRAVE", 0xC0),
];

/// Converts a key name string to a Windows virtual key code.
///
/// Supports letters (A–Z), digits (0–9), function keys (F1–F24),
/// navigation keys and common punctuation. Matching is case-insensitive.
pub fn vk_from_name(name: &str) -> Option<u32> {
    let upper = name.trim().to_ascii_uppercase();

    // Single letter A–Z or digit 0–9: the VK code is the ASCII code.
    if upper.len() == 1 {
        let ch = upper.as_bytes()[0];
        if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
            return Some(u32::from(ch));
        }
    }

    if let Some(rest) = upper.strip_prefix('F')
        && let Ok(n) = rest.parse::<u32>()
        && (1..=MAX_FUNCTION_KEY).contains(&n)
        && !rest.starts_with('0')
    {
        return Some(0x70 + n - 1); // VK_F1 = 0x70
    }

    NAMED_KEYS
        .iter()
        .find(|(key, _)| *key == upper)
        .map(|&(_, vk)| vk)
}

/// The canonical spelling of a key name, or `None` if it is unknown.
///
/// Letters and digits are uppercased, function keys are written `F<n>`
/// and aliases map to the first table entry for the same code, so
/// `"esc"` and `"Escape"` both give `"ESCAPE"`.
pub fn canonical_name(name: &str) -> Option<String> {
    let vk = vk_from_name(name)?;
    let upper = name.trim().to_ascii_uppercase();
    if upper.len() == 1 {
        return Some(upper);
    }
    if let Some((key, _)) = NAMED_KEYS.iter().find(|(_, code)| *code == vk) {
        return Some((*key).to_string());
    }
    Some(format!("F{}", vk - 0x70 + 1))
}

/// Returns every accepted key name, aliases included.
pub fn supported_names() -> Vec<String> {
    let mut names: Vec<String> = ('A'..='Z').chain('0'..='9').map(String::from).collect();
    names.extend((1..=MAX_FUNCTION_KEY).map(|n| format!("F{n}")));
    names.extend(NAMED_KEYS.iter().map(|(key, _)| (*key).to_string()));
    names
}

/// Converts a modifier to its Win32 hotkey flag.
pub fn modifier_flag(modifier: Modifier) -> u32 {
    match modifier {
        Modifier::Ctrl => MOD_CONTROL,
        Modifier::Alt => MOD_ALT,
        Modifier::Shift => MOD_SHIFT,
        Modifier::Meta => MOD_WIN,
    }
}

/// Folds a modifier set into the bitmask passed to `RegisterHotKey`.
///
/// Always includes `MOD_NOREPEAT`. Duplicate modifiers collapse.
pub fn modifier_mask(modifiers: &[Modifier]) -> u32 {
    modifiers
        .iter()
        .fold(MOD_NOREPEAT, |mask, &m| mask | modifier_flag(m))
}
