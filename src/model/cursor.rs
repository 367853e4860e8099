use super::color::HexColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier minted once per observed cursor element, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorId(Uuid);

impl CursorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CursorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CursorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Display opacity in percent, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Opacity(u8);

impl Opacity {
    pub const MIN: Opacity = Opacity(1);
    pub const MAX: Opacity = Opacity(100);

    /// Clamp any integer into the valid range
    pub fn new(percent: i64) -> Self {
        Self(percent.clamp(1, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Whether this value lies between `a` and `b`, inclusive, in either order
    pub fn is_between(self, a: Opacity, b: Opacity) -> bool {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        low <= self && self <= high
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<i64> for Opacity {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Opacity> for i64 {
    fn from(value: Opacity) -> Self {
        value.0 as i64
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// One remote participant cursor as persisted under `cursors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRecord {
    pub id: CursorId,
    pub enabled: bool,
    pub show_name: bool,
    #[serde(default)]
    pub opacity: Opacity,
    /// Label text captured when the label first appeared
    #[serde(default)]
    pub name: String,
    /// Marker color captured when the marker first appeared
    #[serde(default)]
    pub color: Option<HexColor>,
}

impl CursorRecord {
    /// A fresh record for a cursor that just appeared, seeded from the defaults
    pub fn from_defaults(id: CursorId, defaults: &GlobalDefaults) -> Self {
        Self {
            id,
            enabled: defaults.all_enabled,
            show_name: defaults.all_show_names,
            opacity: defaults.all_opacity,
            name: String::new(),
            color: None,
        }
    }
}

/// Board-wide settings stored under `allCursors`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefaults {
    pub all_enabled: bool,
    pub all_show_names: bool,
    pub all_opacity: Opacity,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            all_enabled: true,
            all_show_names: true,
            all_opacity: Opacity::MAX,
        }
    }
}
