use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BindingError;
use crate::keys;

/// Keyboard modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    #[serde(alias = "control")]
    Ctrl,
    Alt,
    Shift,
    #[serde(alias = "win", alias = "super")]
    Meta,
}

impl Modifier {
    /// Display order used when formatting a binding.
    const ORDER: [Modifier; 4] = [Self::Ctrl, Self::Alt, Self::Shift, Self::Meta];

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Some(Self::Ctrl),
            "alt" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "meta" | "win" | "super" => Some(Self::Meta),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Meta => "Meta",
        }
    }
}

/// The user's global shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyBinding {
    /// Modifier keys (e.g. ["ctrl", "alt"]).
    pub modifiers: Vec<Modifier>,
    /// Key name (e.g. "Space", "J", "F1").
    pub key: String,
    /// Whether the hotkey should be registered at all.
    pub enabled: bool,
}

/// A binding translated to the codes handed to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub modifiers: u32,
    pub vk: u32,
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        Self {
            modifiers: vec![Modifier::Ctrl],
            key: "Space".into(),
            enabled: true,
        }
    }
}

impl HotkeyBinding {
    pub fn new(modifiers: &[Modifier], key: &str) -> Self {
        Self {
            modifiers: modifiers.to_vec(),
            key: key.into(),
            enabled: true,
        }
    }

    /// Translates the binding to OS codes.
    ///
    /// The key name is checked first, so a binding that is wrong in
    /// both ways reports the key. An empty modifier set is only an
    /// error when the binding is enabled.
    pub fn resolve(&self) -> Result<ResolvedBinding, BindingError> {
        let vk = keys::vk_from_name(&self.key)
            .ok_or_else(|| BindingError::UnknownKey(self.key.clone()))?;

        if self.enabled && self.modifiers.is_empty() {
            return Err(BindingError::NoModifiers);
        }

        Ok(ResolvedBinding {
            modifiers: keys::modifier_mask(&self.modifiers),
            vk,
        })
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in Modifier::ORDER {
            if self.modifiers.contains(&m) {
                write!(f, "{}+", m.label())?;
            }
        }
        // Unknown keys are shown as written so errors can name them.
        match keys::canonical_name(&self.key) {
            Some(name) => f.write_str(&name),
            None => f.write_str(&self.key),
        }
    }
}

impl FromStr for HotkeyBinding {
    type Err = BindingError;

    /// Parses `"Ctrl+Alt+Space"`. The last segment is the key; the rest
    /// are modifiers. The key name is not validated here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, mods)) = parts.split_last() else {
            return Err(BindingError::Parse(s.into()));
        };
        if key.is_empty() {
            return Err(BindingError::Parse(s.into()));
        }

        let mut modifiers = Vec::with_capacity(mods.len());
        for name in mods {
            let m = Modifier::from_name(name).ok_or_else(|| BindingError::Parse(s.into()))?;
            if !modifiers.contains(&m) {
                modifiers.push(m);
            }
        }

        Ok(Self {
            modifiers,
            key: (*key).to_string(),
            enabled: true,
        })
    }
}
