use crate::model::Opacity;
use regex::Regex;
use std::sync::OnceLock;

pub const DISPLAY_SHOWN: &str = "initial";
pub const DISPLAY_HIDDEN: &str = "none";

/// Anything but `display: none` counts as visible, including no value at all
pub fn is_displayed(display: Option<&str>) -> bool {
    display.map(str::trim) != Some(DISPLAY_HIDDEN)
}

pub fn display_value(visible: bool) -> &'static str {
    if visible {
        DISPLAY_SHOWN
    } else {
        DISPLAY_HIDDEN
    }
}

/// First run of up to three digits in a filter such as `opacity(80%)`
pub fn parse_opacity_filter(filter: &str) -> Option<Opacity> {
    let digits = opacity_digits().find(filter)?;
    digits.as_str().parse::<i64>().ok().map(Opacity::new)
}

fn opacity_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{1,3}").expect("opacity pattern is valid"))
}

pub fn opacity_filter(opacity: Opacity) -> String {
    format!("opacity({}%)", opacity.percent())
}
