// Copyright 2023 the xcompose Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keysym values and the handful of lookups the compose engine needs.

use std::fmt;

mod names;

/// An opaque representation of an X keysym, to make APIs less error prone.
///
/// A keysym is the 32-bit identifier the X keyboard protocol assigns to a
/// key symbol (`a`, `dead_tilde`, `Multi_key`, ...). Equality and hashing
/// are value based; [`NO_SYMBOL`] is the "no keysym" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keysym(pub u32);

/// The `NoSymbol` sentinel.
pub const NO_SYMBOL: Keysym = Keysym(0);

impl Keysym {
    /// The raw protocol value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Look up a keysym by its name, as spelled in a Compose file.
    ///
    /// Beyond the named table this accepts the `U<codepoint>` form
    /// (`UA1` is `exclamdown`, `U2118` is the Unicode keysym for ℘) and
    /// the raw `0x<keysym>` form. Lookup is case sensitive.
    pub fn from_name(name: &str) -> Option<Keysym> {
        if let Some(&keysym) = names::NAME_TO_KEYSYM.get(name) {
            return Some(Keysym(keysym));
        }

        // Unicode forms: U+0100 and up live in the 0x01000000 range, the
        // rest map onto their Latin-1 keysym. Control characters have no
        // keysym at all.
        if let Some(hex) = name.strip_prefix('U') {
            if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                let cp = u32::from_str_radix(hex, 16).ok()?;
                if !(0x20..=0x7e).contains(&cp) && !(0xa0..=0x0010_ffff).contains(&cp) {
                    return None;
                }
                return Some(if cp < 0x100 {
                    Keysym(cp)
                } else {
                    Keysym(0x0100_0000 + cp)
                });
            }
        }

        // Raw hexadecimal keysym value. Zero is NoSymbol, which no name
        // may resolve to.
        if let Some(hex) = name.strip_prefix("0x") {
            if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return u32::from_str_radix(hex, 16)
                    .ok()
                    .filter(|&value| value != 0)
                    .map(Keysym);
            }
        }

        None
    }

    /// Whether this keysym is a modifier key (Shift, Control, Alt, the
    /// lock keys, Super/Hyper/Meta, the ISO level shifts, Mode_switch).
    ///
    /// [`ComposeState::feed`] ignores these outright, so holding Shift in
    /// the middle of a sequence does not cancel it.
    ///
    /// [`ComposeState::feed`]: crate::ComposeState::feed
    pub fn is_modifier(self) -> bool {
        (keysyms::SHIFT_L.0..=keysyms::HYPER_R.0).contains(&self.0)
            || (keysyms::ISO_LOCK.0..=keysyms::ISO_LEVEL5_LOCK.0).contains(&self.0)
            || self == keysyms::MODE_SWITCH
            || self == keysyms::NUM_LOCK
    }

    /// The character this keysym encodes, if it encodes one.
    ///
    /// Latin-1 keysyms are their own code points, the 0x01000000 range
    /// holds directly-encoded Unicode, keypad keys fold onto their ASCII
    /// equivalents and the TTY keys onto their C0 controls. Everything
    /// else (dead keys, function keys, modifiers) has no character.
    pub fn to_char(self) -> Option<char> {
        let ks = self.0;

        // Latin-1 is a 1:1 mapping.
        if (0x0020..=0x007e).contains(&ks) || (0x00a0..=0x00ff).contains(&ks) {
            return char::from_u32(ks);
        }

        // Patch the keypad space encoding botch, then fold the rest of
        // the keypad and the TTY keys onto the low 7 bits.
        if ks == keysyms::KP_SPACE.0 {
            return Some(' ');
        }
        if (keysyms::BACKSPACE.0..=keysyms::CLEAR.0).contains(&ks)
            || (keysyms::KP_MULTIPLY.0..=keysyms::KP_9.0).contains(&ks)
            || ks == keysyms::RETURN.0
            || ks == keysyms::ESCAPE.0
            || ks == keysyms::DELETE.0
            || ks == keysyms::KP_TAB.0
            || ks == keysyms::KP_ENTER.0
            || ks == keysyms::KP_EQUAL.0
        {
            return char::from_u32(ks & 0x7f);
        }

        // Directly encoded Unicode code points.
        if (0x0100_0000..=0x0110_ffff).contains(&ks) {
            return char::from_u32(ks - 0x0100_0000);
        }

        // Legacy keysyms outside Latin-1 that the stock Compose tables
        // produce as output.
        match ks {
            0x0aa9 => Some('\u{2014}'), // emdash
            0x0aaa => Some('\u{2013}'), // endash
            0x0aae => Some('\u{2026}'), // ellipsis
            0x0ad0 => Some('\u{2018}'), // leftsinglequotemark
            0x0ad1 => Some('\u{2019}'), // rightsinglequotemark
            0x0ad2 => Some('\u{201c}'), // leftdoublequotemark
            0x0ad3 => Some('\u{201d}'), // rightdoublequotemark
            0x20ac => Some('\u{20ac}'), // EuroSign
            _ => None,
        }
    }

    /// UTF-8 encoding of [`to_char`](Self::to_char).
    pub fn to_utf8(self) -> Option<String> {
        self.to_char().map(String::from)
    }
}

impl fmt::Debug for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keysym({:#06x})", self.0)
    }
}

/// Named constants for the keysyms the engine itself cares about.
///
/// This is nowhere near the full keysym set; it is the sentinels, the
/// modifier ranges and the composition keys. Use [`Keysym::from_name`]
/// for anything else.
pub mod keysyms {
    use super::Keysym;

    pub const SPACE: Keysym = Keysym(0x0020);
    pub const APOSTROPHE: Keysym = Keysym(0x0027);
    pub const AT: Keysym = Keysym(0x0040);
    pub const ASCIITILDE: Keysym = Keysym(0x007e);
    pub const ACUTE: Keysym = Keysym(0x00b4);

    pub const BACKSPACE: Keysym = Keysym(0xff08);
    pub const TAB: Keysym = Keysym(0xff09);
    pub const LINEFEED: Keysym = Keysym(0xff0a);
    pub const CLEAR: Keysym = Keysym(0xff0b);
    pub const RETURN: Keysym = Keysym(0xff0d);
    pub const ESCAPE: Keysym = Keysym(0xff1b);
    pub const DELETE: Keysym = Keysym(0xffff);

    pub const MULTI_KEY: Keysym = Keysym(0xff20);
    pub const MODE_SWITCH: Keysym = Keysym(0xff7e);
    pub const NUM_LOCK: Keysym = Keysym(0xff7f);

    pub const KP_SPACE: Keysym = Keysym(0xff80);
    pub const KP_TAB: Keysym = Keysym(0xff89);
    pub const KP_ENTER: Keysym = Keysym(0xff8d);
    pub const KP_MULTIPLY: Keysym = Keysym(0xffaa);
    pub const KP_9: Keysym = Keysym(0xffb9);
    pub const KP_EQUAL: Keysym = Keysym(0xffbd);

    pub const SHIFT_L: Keysym = Keysym(0xffe1);
    pub const SHIFT_R: Keysym = Keysym(0xffe2);
    pub const CONTROL_L: Keysym = Keysym(0xffe3);
    pub const CAPS_LOCK: Keysym = Keysym(0xffe5);
    pub const HYPER_R: Keysym = Keysym(0xffee);

    pub const ISO_LOCK: Keysym = Keysym(0xfe01);
    pub const ISO_LEVEL3_SHIFT: Keysym = Keysym(0xfe03);
    pub const ISO_LEVEL5_LOCK: Keysym = Keysym(0xfe13);

    pub const DEAD_GRAVE: Keysym = Keysym(0xfe50);
    pub const DEAD_ACUTE: Keysym = Keysym(0xfe51);
    pub const DEAD_CIRCUMFLEX: Keysym = Keysym(0xfe52);
    pub const DEAD_TILDE: Keysym = Keysym(0xfe53);
    pub const DEAD_DIAERESIS: Keysym = Keysym(0xfe57);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_lookup() {
        assert_eq!(Keysym::from_name("a"), Some(Keysym(0x61)));
        assert_eq!(Keysym::from_name("A"), Some(Keysym(0x41)));
        assert_eq!(Keysym::from_name("dead_tilde"), Some(keysyms::DEAD_TILDE));
        assert_eq!(Keysym::from_name("Multi_key"), Some(keysyms::MULTI_KEY));
        assert_eq!(Keysym::from_name("EuroSign"), Some(Keysym(0x20ac)));
        // Aliases resolve to the same value.
        assert_eq!(Keysym::from_name("quoteright"), Keysym::from_name("apostrophe"));
        // Case matters.
        assert_eq!(Keysym::from_name("Dead_Tilde"), None);
        assert_eq!(Keysym::from_name("frobnicate"), None);
    }

    #[test]
    fn unicode_and_hex_forms() {
        assert_eq!(Keysym::from_name("U41"), Some(Keysym(0x41)));
        assert_eq!(Keysym::from_name("UA1"), Some(Keysym(0xa1)));
        assert_eq!(Keysym::from_name("U2118"), Some(Keysym(0x0100_2118)));
        // Control characters have no keysym.
        assert_eq!(Keysym::from_name("U1B"), None);
        assert_eq!(Keysym::from_name("U110000"), None);
        assert_eq!(Keysym::from_name("0xfe53"), Some(keysyms::DEAD_TILDE));
        assert_eq!(Keysym::from_name("0x"), None);
        assert_eq!(Keysym::from_name("0xzz"), None);
        // NoSymbol is not nameable.
        assert_eq!(Keysym::from_name("0x0"), None);
    }

    #[test]
    fn modifier_predicate() {
        assert!(keysyms::SHIFT_L.is_modifier());
        assert!(keysyms::CAPS_LOCK.is_modifier());
        assert!(keysyms::NUM_LOCK.is_modifier());
        assert!(keysyms::MODE_SWITCH.is_modifier());
        assert!(keysyms::ISO_LEVEL3_SHIFT.is_modifier());
        assert!(!keysyms::MULTI_KEY.is_modifier());
        assert!(!keysyms::DEAD_TILDE.is_modifier());
        assert!(!Keysym(0x61).is_modifier());
        assert!(!NO_SYMBOL.is_modifier());
    }

    #[test]
    fn char_encoding() {
        assert_eq!(Keysym(0x61).to_char(), Some('a'));
        assert_eq!(Keysym(0xe9).to_char(), Some('é'));
        assert_eq!(Keysym(0x0100_2118).to_char(), Some('\u{2118}'));
        assert_eq!(keysyms::RETURN.to_char(), Some('\r'));
        assert_eq!(keysyms::BACKSPACE.to_char(), Some('\u{8}'));
        assert_eq!(keysyms::KP_SPACE.to_char(), Some(' '));
        assert_eq!(Keysym(0xffb7).to_char(), Some('7')); // KP_7
        assert_eq!(keysyms::KP_EQUAL.to_char(), Some('='));
        assert_eq!(Keysym(0x20ac).to_char(), Some('€'));
        assert_eq!(keysyms::DEAD_TILDE.to_char(), None);
        assert_eq!(keysyms::SHIFT_L.to_char(), None);
        assert_eq!(NO_SYMBOL.to_char(), None);
    }

    #[test]
    fn utf8_encoding() {
        assert_eq!(keysyms::ASCIITILDE.to_utf8().as_deref(), Some("~"));
        assert_eq!(keysyms::ACUTE.to_utf8().as_deref(), Some("\u{b4}"));
        assert_eq!(keysyms::DEAD_TILDE.to_utf8(), None);
    }
}
