//! Virtual key codes and hotkey combination parsing.

use std::fmt;
use std::ops::BitOr;

// Virtual key codes for modifiers
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12; // Alt
pub const VK_LWIN: u16 = 0x5B;
pub const VK_RWIN: u16 = 0x5C;
pub const VK_LSHIFT: u16 = 0xA0;
pub const VK_RSHIFT: u16 = 0xA1;
pub const VK_LCONTROL: u16 = 0xA2;
pub const VK_RCONTROL: u16 = 0xA3;
pub const VK_LMENU: u16 = 0xA4;
pub const VK_RMENU: u16 = 0xA5;

/// Virtual key codes for non-modifier keys accepted in a combination.
const VK_MAP: &[(&str, u16)] = &[
    ("a", 0x41),
    ("b", 0x42),
    ("c", 0x43),
    ("d", 0x44),
    ("e", 0x45),
    ("f", 0x46),
    ("g", 0x47),
    ("h", 0x48),
    ("i", 0x49),
    ("j", 0x4A),
    ("k", 0x4B),
    ("l", 0x4C),
    ("m", 0x4D),
    ("n", 0x4E),
    ("o", 0x4F),
    ("p", 0x50),
    ("q", 0x51),
    ("r", 0x52),
    ("s", 0x53),
    ("t", 0x54),
    ("u", 0x55),
    ("v", 0x56),
    ("w", 0x57),
    ("x", 0x58),
    ("y", 0x59),
    ("z", 0x5A),
    ("0", 0x30),
    ("1", 0x31),
    ("2", 0x32),
    ("3", 0x33),
    ("4", 0x34),
    ("5", 0x35),
    ("6", 0x36),
    ("7", 0x37),
    ("8", 0x38),
    ("9", 0x39),
    ("f1", 0x70),
    ("f2", 0x71),
    ("f3", 0x72),
    ("f4", 0x73),
    ("f5", 0x74),
    ("f6", 0x75),
    ("f7", 0x76),
    ("f8", 0x77),
    ("f9", 0x78),
    ("f10", 0x79),
    ("f11", 0x7A),
    ("f12", 0x7B),
    ("space", 0x20),
    ("grave", 0xC0),
    ("capslock", 0x14),
];

/// Hotkey modifier bits. Values match the Win32 `MOD_*` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const NONE: Self = Self(0);
    pub const ALT: Self = Self(0x0001);
    pub const CONTROL: Self = Self(0x0002);
    pub const SHIFT: Self = Self(0x0004);
    pub const WIN: Self = Self(0x0008);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Virtual keys of the set modifiers, in Alt, Ctrl, Shift, Win order.
    pub fn virtual_keys(self) -> Vec<u16> {
        [
            (Self::ALT, VK_MENU),
            (Self::CONTROL, VK_CONTROL),
            (Self::SHIFT, VK_SHIFT),
            (Self::WIN, VK_LWIN),
        ]
        .iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, vk)| *vk)
        .collect()
    }
}

impl BitOr for ModifierMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A parsed key combination such as `shift+alt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombination {
    pub modifiers: ModifierMask,
    /// Key whose press completes the combination.
    pub virtual_key: u16,
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for (bit, name) in [
            (ModifierMask::CONTROL, "ctrl"),
            (ModifierMask::ALT, "alt"),
            (ModifierMask::SHIFT, "shift"),
            (ModifierMask::WIN, "win"),
        ] {
            if self.modifiers.contains(bit) {
                parts.push(name.to_string());
            }
        }
        let key_is_modifier = ModifierMask::virtual_keys(self.modifiers).contains(&self.virtual_key);
        if !key_is_modifier {
            let name = VK_MAP
                .iter()
                .find(|(_, code)| *code == self.virtual_key)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("vk{:02X}", self.virtual_key));
            parts.push(name);
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Parses a combination string like "ctrl+alt+l" or "shift+alt".
///
/// A combination made only of modifiers completes on the last one named,
/// so "shift+alt" fires when Alt is pressed while Shift is held.
pub fn parse_combination(combination: &str) -> Option<KeyCombination> {
    let lower = combination.to_lowercase();

    let mut modifiers = ModifierMask::NONE;
    let mut last_modifier_vk: Option<u16> = None;
    let mut vk: Option<u16> = None;

    for part in lower.split('+') {
        match part.trim() {
            "ctrl" | "control" => {
                modifiers = modifiers | ModifierMask::CONTROL;
                last_modifier_vk = Some(VK_CONTROL);
            }
            "alt" => {
                modifiers = modifiers | ModifierMask::ALT;
                last_modifier_vk = Some(VK_MENU);
            }
            "shift" => {
                modifiers = modifiers | ModifierMask::SHIFT;
                last_modifier_vk = Some(VK_SHIFT);
            }
            "win" => {
                modifiers = modifiers | ModifierMask::WIN;
                last_modifier_vk = Some(VK_LWIN);
            }
            "" => return None,
            key => {
                if vk.is_some() {
                    return None;
                }
                vk = Some(VK_MAP.iter().find(|(name, _)| *name == key)?.1);
            }
        }
    }

    let virtual_key = vk.or(last_modifier_vk)?;
    Some(KeyCombination {
        modifiers,
        virtual_key,
    })
}

/// Checks if a key release can complete a layout switch.
pub fn is_layout_switch_key(vk: u16) -> bool {
    matches!(
        vk,
        VK_SHIFT
            | VK_CONTROL
            | VK_MENU
            | VK_LSHIFT
            | VK_RSHIFT
            | VK_LCONTROL
            | VK_RCONTROL
            | VK_LMENU
            | VK_RMENU
            | VK_LWIN
            | VK_RWIN
    )
}
