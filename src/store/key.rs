use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

const NAMESPACE: &str = "boardStorage_";

fn board_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:\b[a-z0-9]{4}\b-){4}\b[a-z0-9]{4}\b").expect("board token pattern is valid")
    })
}

/// Identifier of one board, the unit of storage scoping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardId(String);

impl BoardId {
    /// Extract the board token (five hyphen-separated groups of four) from a URL
    pub fn from_url(url: &str) -> Option<Self> {
        board_token_pattern()
            .find(url)
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix shared by every key stored for this board
    pub fn namespace(&self) -> String {
        format!("{}{}#", NAMESPACE, self.0)
    }

    /// Full backend key for `key` on this board
    pub fn scoped(&self, key: StoreKey) -> String {
        format!("{}{}", self.namespace(), key)
    }

    /// Inverse of [`BoardId::scoped`]; `None` for other boards and unknown keys
    pub fn unscope(&self, full_key: &str) -> Option<StoreKey> {
        full_key
            .strip_prefix(&self.namespace())
            .and_then(StoreKey::from_name)
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys stored per board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Derived cursor list, written by the page context
    Cursors,
    /// Global defaults, written by the panel
    AllCursors,
    /// Schema tag
    Version,
}

impl StoreKey {
    pub fn name(self) -> &'static str {
        match self {
            StoreKey::Cursors => "cursors",
            StoreKey::AllCursors => "allCursors",
            StoreKey::Version => "version",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cursors" => Some(StoreKey::Cursors),
            "allCursors" => Some(StoreKey::AllCursors),
            "version" => Some(StoreKey::Version),
            _ => None,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
