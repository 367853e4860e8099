//! Panel rendering surface
//!
//! Widgets are drawn by the embedding UI. The synchronizer only tells it which
//! control groups exist and what they show.

use crate::model::{CursorId, CursorRecord, GlobalDefaults, HexColor, Opacity};
use serde::Serialize;

/// Controls for one cursor: visibility switch, name switch, opacity slider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlGroup {
    pub id: CursorId,
    pub name: String,
    pub color: Option<HexColor>,
    /// Lighter variant of `color` used as the control background
    pub accent: Option<HexColor>,
    pub cursor_enabled: bool,
    pub name_enabled: bool,
    pub opacity: Opacity,
}

impl ControlGroup {
    pub fn from_record(record: &CursorRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            color: record.color,
            accent: record.color.map(HexColor::lighter),
            cursor_enabled: record.enabled,
            name_enabled: record.show_name,
            opacity: record.opacity,
        }
    }
}

pub trait PanelView {
    /// The page is not a board; nothing else will be rendered
    fn show_disabled(&mut self);

    /// State of the "apply to all" controls
    fn show_defaults(&mut self, defaults: &GlobalDefaults);

    fn add_group(&mut self, group: &ControlGroup);

    fn remove_group(&mut self, id: CursorId);

    /// Control values of an existing group changed
    fn update_group(&mut self, group: &ControlGroup);
}
