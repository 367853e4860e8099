//! Marker color helpers

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Brightening step applied per channel by [`HexColor::lighter`]
const LIGHTER_STEP: u16 = 128;

/// A `#rrggbb` color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor([u8; 3]);

impl HexColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Parse `#rrggbb` (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn channels(self) -> [u8; 3] {
        self.0
    }

    /// Brighter variant used as the control background; each channel saturates at 255
    pub fn lighter(self) -> Self {
        Self(self.0.map(|c| (c as u16 + LIGHTER_STEP).min(255) as u8))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a #rrggbb color: {}", value))
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.to_string()
    }
}

/// Convert a CSS `rgb(r, g, b)` triple to a hex color
///
/// Returns `None` for anything that is not exactly three 0-255 integers.
pub fn rgb_to_hex(css: &str) -> Option<HexColor> {
    let caps = rgb_pattern().captures(css.trim())?;
    let channel = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    Some(HexColor::new(channel(1)?, channel(2)?, channel(3)?))
}

fn rgb_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^rgb\((\d+),\s*(\d+),\s*(\d+)\)$").expect("rgb pattern is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_hex() {
        assert_eq!(rgb_to_hex("rgb(18,52,86)").unwrap().to_string(), "#123456");
        assert_eq!(rgb_to_hex("rgb(18, 52, 86)").unwrap().to_string(), "#123456");
        assert_eq!(rgb_to_hex("rgb(0, 0, 0)").unwrap().to_string(), "#000000");
    }

    #[test]
    fn test_rgb_to_hex_rejects_garbage() {
        assert!(rgb_to_hex("").is_none());
        assert!(rgb_to_hex("rgba(1, 2, 3, 0.5)").is_none());
        assert!(rgb_to_hex("rgb(1, 2)").is_none());
        assert!(rgb_to_hex("rgb(1, 2, 3, 4)").is_none());
        assert!(rgb_to_hex("rgb(256, 0, 0)").is_none());
    }

    #[test]
    fn test_lighter_saturates() {
        let color = HexColor::new(200, 0x10, 127);
        assert_eq!(color.lighter().channels(), [255, 0x90, 255]);
        assert_eq!(color.lighter().to_string(), "#ff90ff");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(HexColor::parse("#ABcdEF"), Some(HexColor::new(0xab, 0xcd, 0xef)));
        assert!(HexColor::parse("abcdef").is_none());
        assert!(HexColor::parse("#abcde").is_none());
    }
}
