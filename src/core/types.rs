//! src/core/types.rs
//!
//! Core type definitions for hotkey management
//!
//! This module defines the fundamental types used throughout the application:
//! - `Action`: The closed set of logical operations a hotkey can trigger
//! - `Key`: Primary keys, carrying their native virtual-key codes
//! - `Modifiers`: Modifier bit-set (ALT, CONTROL, SHIFT, WIN)
//! - `KeyCombination`: A primary key plus modifiers; `key: None` is unbound
//! - `HotkeyBinding`: An action paired with its combination and native id
//!
//! All persisted types implement serialisation; actions persist under their
//! variant *name* so entries written by other versions can be dropped
//! individually instead of failing the whole load.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical operations that can be bound to a global hotkey.
///
/// The set is closed per release. Declaration order is the canonical order:
/// snapshots and persisted mappings list actions in this order, and `Ord`
/// follows it. Variants are never renumbered; persistence keys on the name.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Action {
    PlayPause,
    Stop,
    PreviousTrack,
    NextTrack,
    VolumeDown,
    VolumeUp,
    ToggleMute,
    ShowUi,
    JumpToFile,
}

impl Action {
    /// Every known action, in canonical order.
    pub const ALL: [Action; 9] = [
        Action::PlayPause,
        Action::Stop,
        Action::PreviousTrack,
        Action::NextTrack,
        Action::VolumeDown,
        Action::VolumeUp,
        Action::ToggleMute,
        Action::ShowUi,
        Action::JumpToFile,
    ];

    /// Stable name used for persistence and CLI arguments.
    pub fn name(self) -> &'static str {
        match self {
            Action::PlayPause => "PlayPause",
            Action::Stop => "Stop",
            Action::PreviousTrack => "PreviousTrack",
            Action::NextTrack => "NextTrack",
            Action::VolumeDown => "VolumeDown",
            Action::VolumeUp => "VolumeUp",
            Action::ToggleMute => "ToggleMute",
            Action::ShowUi => "ShowUi",
            Action::JumpToFile => "JumpToFile",
        }
    }

    /// Case-insensitive lookup by name. Unknown names yield `None`, which
    /// lets callers drop entries written by newer versions.
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    /// Factory default combination for this action.
    ///
    /// Kept as a single table next to the enum so the merge policy stays a
    /// pure function over data. All defaults use Alt+Win, which is rarely
    /// claimed by other software.
    pub fn default_combination(self) -> KeyCombination {
        let alt_win = Modifiers::ALT | Modifiers::WIN;
        match self {
            Action::PlayPause => KeyCombination::new(alt_win, Key::Space),
            Action::Stop => KeyCombination::new(alt_win, Key::S),
            Action::PreviousTrack => KeyCombination::new(alt_win, Key::Left),
            Action::NextTrack => KeyCombination::new(alt_win, Key::Right),
            Action::VolumeDown => KeyCombination::new(alt_win, Key::Down),
            Action::VolumeUp => KeyCombination::new(alt_win, Key::Up),
            Action::ToggleMute => KeyCombination::new(alt_win, Key::M),
            Action::ShowUi => KeyCombination::new(alt_win, Key::H),
            Action::JumpToFile => KeyCombination::new(alt_win, Key::J),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

bitflags! {
    /// Modifier keys of a combination.
    ///
    /// The bit values are identical to the native MOD_ALT / MOD_CONTROL /
    /// MOD_SHIFT / MOD_WIN encoding, so decoding a hotkey notification is a
    /// truncating bit cast and registration passes the bits straight through.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Modifiers: u32 {
        const ALT = 0x0001;
        const CONTROL = 0x0002;
        const SHIFT = 0x0004;
        const WIN = 0x0008;
    }
}

// Persist modifiers as their raw bits. Unknown bits written by a newer
// version are truncated on read rather than failing the load.
impl Serialize for Modifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Modifiers::from_bits_truncate(bits))
    }
}

/// Primary keys. Discriminants are the native virtual-key codes, so
/// `key as u32` is exactly the value handed to the OS at registration time.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[repr(u32)]
pub enum Key {
    Backspace = 0x08,
    Tab = 0x09,
    Enter = 0x0D,
    Escape = 0x1B,
    Space = 0x20,
    PageUp = 0x21,
    PageDown = 0x22,
    End = 0x23,
    Home = 0x24,
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    Insert = 0x2D,
    Delete = 0x2E,
    // Digits are contiguous from 0x30
    D0 = 0x30,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
    // Letters are contiguous from 0x41
    A = 0x41,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    // Function keys are contiguous from 0x70
    F1 = 0x70,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    VolumeMuteKey = 0xAD,
    VolumeDownKey = 0xAE,
    VolumeUpKey = 0xAF,
    MediaNextTrack = 0xB0,
    MediaPrevTrack = 0xB1,
    MediaStop = 0xB2,
    MediaPlayPause = 0xB3,
}

impl Key {
    /// Native virtual-key code for OS registration.
    pub fn vk(self) -> u32 {
        self as u32
    }

    /// Maps a native virtual-key code back to a `Key`. Codes outside the
    /// supported set yield `None`; the bridge drops such notifications.
    pub fn from_vk(vk: u32) -> Option<Key> {
        use Key::*;
        Some(match vk {
            0x08 => Backspace,
            0x09 => Tab,
            0x0D => Enter,
            0x1B => Escape,
            0x20 => Space,
            0x21 => PageUp,
            0x22 => PageDown,
            0x23 => End,
            0x24 => Home,
            0x25 => Left,
            0x26 => Up,
            0x27 => Right,
            0x28 => Down,
            0x2D => Insert,
            0x2E => Delete,
            0x30 => D0,
            0x31 => D1,
            0x32 => D2,
            0x33 => D3,
            0x34 => D4,
            0x35 => D5,
            0x36 => D6,
            0x37 => D7,
            0x38 => D8,
            0x39 => D9,
            0x41 => A,
            0x42 => B,
            0x43 => C,
            0x44 => D,
            0x45 => E,
            0x46 => F,
            0x47 => G,
            0x48 => H,
            0x49 => I,
            0x4A => J,
            0x4B => K,
            0x4C => L,
            0x4D => M,
            0x4E => N,
            0x4F => O,
            0x50 => P,
            0x51 => Q,
            0x52 => R,
            0x53 => S,
            0x54 => T,
            0x55 => U,
            0x56 => V,
            0x57 => W,
            0x58 => X,
            0x59 => Y,
            0x5A => Z,
            0x70 => F1,
            0x71 => F2,
            0x72 => F3,
            0x73 => F4,
            0x74 => F5,
            0x75 => F6,
            0x76 => F7,
            0x77 => F8,
            0x78 => F9,
            0x79 => F10,
            0x7A => F11,
            0x7B => F12,
            0xAD => VolumeMuteKey,
            0xAE => VolumeDownKey,
            0xAF => VolumeUpKey,
            0xB0 => MediaNextTrack,
            0xB1 => MediaPrevTrack,
            0xB2 => MediaStop,
            0xB3 => MediaPlayPause,
            _ => return None,
        })
    }

    /// Case-insensitive lookup by name, accepting the persisted variant
    /// names plus the plain spellings a user would type ("0" for D0,
    /// "RETURN" for Enter, and so on).
    pub fn from_name(name: &str) -> Option<Key> {
        let upper = name.trim().to_uppercase();

        // Single letter or digit
        if upper.len() == 1 {
            let c = upper.as_bytes()[0];
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                return Key::from_vk(c as u32);
            }
        }

        // D0..D9 (persisted spelling) and F1..F12
        if let Some(rest) = upper.strip_prefix('D') {
            if rest.len() == 1 && rest.as_bytes()[0].is_ascii_digit() {
                return Key::from_vk(rest.as_bytes()[0] as u32);
            }
        }
        if let Some(rest) = upper.strip_prefix('F') {
            if let Ok(n) = rest.parse::<u32>() {
                if (1..=12).contains(&n) {
                    return Key::from_vk(0x70 + n - 1);
                }
            }
        }

        Some(match upper.as_str() {
            "BACKSPACE" | "BACK" => Key::Backspace,
            "TAB" => Key::Tab,
            "ENTER" | "RETURN" => Key::Enter,
            "ESCAPE" | "ESC" => Key::Escape,
            "SPACE" => Key::Space,
            "PAGEUP" | "PGUP" | "PRIOR" => Key::PageUp,
            "PAGEDOWN" | "PGDN" | "NEXT" => Key::PageDown,
            "END" => Key::End,
            "HOME" => Key::Home,
            "LEFT" => Key::Left,
            "UP" => Key::Up,
            "RIGHT" => Key::Right,
            "DOWN" => Key::Down,
            "INSERT" | "INS" => Key::Insert,
            "DELETE" | "DEL" => Key::Delete,
            "VOLUMEMUTEKEY" | "VOLUMEMUTE" => Key::VolumeMuteKey,
            "VOLUMEDOWNKEY" => Key::VolumeDownKey,
            "VOLUMEUPKEY" => Key::VolumeUpKey,
            "MEDIANEXTTRACK" => Key::MediaNextTrack,
            "MEDIAPREVTRACK" => Key::MediaPrevTrack,
            "MEDIASTOP" => Key::MediaStop,
            "MEDIAPLAYPAUSE" => Key::MediaPlayPause,
            _ => return None,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vk = *self as u32;
        match vk {
            // Letters and digits print as the bare character
            0x30..=0x39 | 0x41..=0x5A => write!(f, "{}", vk as u8 as char),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// A primary key plus a modifier bit-set.
///
/// `key: None` represents an unbound combination: the action exists in the
/// mapping but no key sequence triggers it and nothing is registered with
/// the OS. Two combinations are equal iff both fields match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeyCombination {
    pub key: Option<Key>,
    pub modifiers: Modifiers,
}

impl KeyCombination {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self {
            key: Some(key),
            modifiers,
        }
    }

    /// The unbound combination. Modifiers are normalised to empty so every
    /// unbound entry compares and renders identically.
    pub fn unbound() -> Self {
        Self {
            key: None,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.key.is_some()
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(key) = self.key else {
            return write!(f, "None");
        };

        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.contains(Modifiers::ALT) {
            parts.push("Alt".to_string());
        }
        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(Modifiers::WIN) {
            parts.push("Win".to_string());
        }
        parts.push(key.to_string());
        write!(f, "{}", parts.join("+"))
    }
}

/// An action paired with its current combination and, when registered with
/// the OS, the native identifier correlating notifications back to it.
///
/// `native_id` is assigned at registration time and never persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HotkeyBinding {
    pub action: Action,
    pub combination: KeyCombination,
    pub native_id: Option<i32>,
}

impl HotkeyBinding {
    pub fn is_bound(&self) -> bool {
        self.combination.is_bound()
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.action, self.combination)
    }
}

/// Result of a registry `register` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegisterOutcome {
    /// Combination registered with the OS.
    Bound,
    /// Combination was empty; recorded without touching the OS.
    Unbound,
    /// The combination was already taken (locally or by another process) or
    /// no identifier was available; the action was recorded unbound instead
    /// and the registration observer notified.
    DegradedToUnbound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display() {
        assert_eq!(format!("{}", Action::PlayPause), "PlayPause");
        assert_eq!(format!("{}", Action::JumpToFile), "JumpToFile");
    }

    #[test]
    fn test_action_from_name_case_insensitive() {
        assert_eq!(Action::from_name("playpause"), Some(Action::PlayPause));
        assert_eq!(Action::from_name("VOLUMEUP"), Some(Action::VolumeUp));
        assert_eq!(Action::from_name("TeleportMouse"), None);
    }

    #[test]
    fn test_default_combinations_are_distinct() {
        for a in Action::ALL {
            for b in Action::ALL {
                if a != b {
                    assert_ne!(a.default_combination(), b.default_combination());
                }
            }
        }
    }

    #[test]
    fn test_key_vk_round_trip() {
        for key in [Key::A, Key::D7, Key::F11, Key::Space, Key::MediaPlayPause] {
            assert_eq!(Key::from_vk(key.vk()), Some(key));
        }
        assert_eq!(Key::from_vk(0xFFFF), None);
    }

    #[test]
    fn test_key_from_name_aliases() {
        assert_eq!(Key::from_name("a"), Some(Key::A));
        assert_eq!(Key::from_name("7"), Some(Key::D7));
        assert_eq!(Key::from_name("D7"), Some(Key::D7));
        assert_eq!(Key::from_name("f5"), Some(Key::F5));
        assert_eq!(Key::from_name("Return"), Some(Key::Enter));
        assert_eq!(Key::from_name("hyperspace"), None);
    }

    #[test]
    fn test_combination_display() {
        let combo = KeyCombination::new(Modifiers::ALT | Modifiers::WIN, Key::Space);
        assert_eq!(format!("{}", combo), "Alt+Win+Space");
        assert_eq!(format!("{}", KeyCombination::unbound()), "None");
    }

    #[test]
    fn test_combination_equality() {
        let a = KeyCombination::new(Modifiers::ALT | Modifiers::WIN, Key::Space);
        let b = KeyCombination::new(Modifiers::WIN | Modifiers::ALT, Key::Space);
        assert_eq!(a, b); // Bit-set, so modifier order cannot matter

        let c = KeyCombination::new(Modifiers::ALT, Key::Space);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unbound_is_normalised() {
        assert_eq!(KeyCombination::unbound().modifiers, Modifiers::empty());
        assert!(!KeyCombination::unbound().is_bound());
    }
}
