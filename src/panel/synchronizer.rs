//! Panel context state and event loop

use super::activation::board_for_page;
use super::diff::{diff_ids, IdDiff};
use super::view::{ControlGroup, PanelView};
use crate::channel::{DisplayChange, Frame, Message, OpacityChange, Port, PortConnector};
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::model::{CursorId, CursorRecord, GlobalDefaults, Opacity};
use crate::store::{BoardStore, BoardSubscription, StorageBackend, StoreChange, StoreKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// User interaction with the panel controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ToggleCursor { id: CursorId, enabled: bool },
    ToggleName { id: CursorId, enabled: bool },
    SetOpacity { id: CursorId, value: Opacity },
    SetAllEnabled(bool),
    SetAllShowNames(bool),
    SetAllOpacity(Opacity),
}

/// Outcome of opening the panel
pub enum Activation<V: PanelView> {
    /// The active page is not a board; the view shows the disabled state
    Disabled(V),
    Active(PanelSynchronizer<V>),
}

pub struct PanelSynchronizer<V: PanelView> {
    store: BoardStore,
    changes: BoardSubscription,
    port: Port,
    view: V,
    defaults: GlobalDefaults,
    groups: HashMap<CursorId, ControlGroup>,
    // Rendered order
    order: Vec<CursorId>,
}

impl<V: PanelView> PanelSynchronizer<V> {
    /// Validate the page, open the link to it and render the stored cursors
    pub async fn activate(
        page_url: &str,
        backend: Arc<dyn StorageBackend>,
        connector: &PortConnector,
        mut view: V,
        config: &SyncConfig,
    ) -> SyncResult<Activation<V>> {
        let board = match board_for_page(page_url, &config.board_url_prefix) {
            Ok(board) => board,
            Err(e) => {
                tracing::info!("Panel disabled: {}", e);
                view.show_disabled();
                return Ok(Activation::Disabled(view));
            }
        };

        let port = connector.connect(&config.port_name)?;
        let store = BoardStore::new(backend, board);
        // Subscribe before loading so nothing committed in between is missed
        let changes = store.subscribe();

        let cursors = store
            .get::<Vec<CursorRecord>>(StoreKey::Cursors)
            .await?
            .unwrap_or_default();
        let defaults = match store.get::<GlobalDefaults>(StoreKey::AllCursors).await? {
            Some(defaults) => defaults,
            None => {
                let defaults = GlobalDefaults::default();
                store.set(StoreKey::AllCursors, &defaults).await?;
                defaults
            }
        };

        tracing::info!(
            "Panel active for board {} ({} cursors)",
            store.board(),
            cursors.len()
        );

        view.show_defaults(&defaults);
        let mut synchronizer = Self {
            store,
            changes,
            port,
            view,
            defaults,
            groups: HashMap::new(),
            order: Vec::new(),
        };
        synchronizer.reconcile(&cursors);
        Ok(Activation::Active(synchronizer))
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn defaults(&self) -> &GlobalDefaults {
        &self.defaults
    }

    /// Rendered groups in display order
    pub fn groups(&self) -> Vec<&ControlGroup> {
        self.order
            .iter()
            .filter_map(|id| self.groups.get(id))
            .collect()
    }

    /// Run until the panel closes (the action source goes away), then hand
    /// the view back. Dropping the synchronizer closes the link to the page.
    pub async fn run(mut self, mut actions: mpsc::UnboundedReceiver<PanelAction>) -> V {
        let mut store_open = true;
        let mut port_open = true;

        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => {
                        if let Err(e) = self.handle_action(action).await {
                            tracing::warn!("Panel action {:?} failed: {}", action, e);
                        }
                    }
                    None => break,
                },
                change = self.changes.recv(), if store_open => match change {
                    Some(change) => self.handle_store_change(&change),
                    None => store_open = false,
                },
                frame = self.port.recv(), if port_open => match frame {
                    Some(frame) => self.handle_frame(frame),
                    None => {
                        tracing::info!("Page closed the link for board {}", self.store.board());
                        port_open = false;
                    }
                },
            }
        }

        tracing::info!("Panel for board {} closed", self.store.board());
        self.view
    }

    pub async fn handle_action(&mut self, action: PanelAction) -> SyncResult<()> {
        match action {
            PanelAction::ToggleCursor { id, enabled } => self.toggle_cursor(id, enabled),
            PanelAction::ToggleName { id, enabled } => self.toggle_name(id, enabled),
            PanelAction::SetOpacity { id, value } => self.set_opacity(id, value),
            PanelAction::SetAllEnabled(enabled) => self.set_all_enabled(enabled).await?,
            PanelAction::SetAllShowNames(enabled) => self.set_all_show_names(enabled).await?,
            PanelAction::SetAllOpacity(value) => self.set_all_opacity(value).await?,
        }
        Ok(())
    }

    pub fn handle_store_change(&mut self, change: &StoreChange) {
        match change.key {
            StoreKey::Cursors => {
                let cursors = change.new_as::<Vec<CursorRecord>>().unwrap_or_default();
                self.reconcile(&cursors);
            }
            StoreKey::AllCursors => {
                let defaults = change.new_as::<GlobalDefaults>().unwrap_or_default();
                // Our own writes come back here too
                if defaults != self.defaults {
                    self.defaults = defaults;
                    self.view.show_defaults(&defaults);
                }
            }
            StoreKey::Version => {}
        }
    }

    pub fn handle_frame(&mut self, frame: Frame) {
        match Message::try_from(frame) {
            Ok(Message::Ping) => self.send(Message::Pong),
            Ok(other) => tracing::debug!("Ignoring {} from the page", other.kind()),
            Err(e) => tracing::debug!("Ignoring frame from the page: {}", e),
        }
    }

    /// Drop groups whose cursor disappeared and create groups for new ones.
    /// Groups present on both sides are left alone.
    pub fn reconcile(&mut self, cursors: &[CursorRecord]) -> IdDiff<CursorId> {
        let new_ids: Vec<CursorId> = cursors.iter().map(|cursor| cursor.id).collect();
        let diff = diff_ids(&self.order, &new_ids);

        for id in &diff.removed {
            self.groups.remove(id);
            self.view.remove_group(*id);
        }
        self.order.retain(|id| !diff.removed.contains(id));

        for id in &diff.added {
            let Some(record) = cursors.iter().find(|cursor| cursor.id == *id) else {
                continue;
            };
            let group = ControlGroup::from_record(record);
            self.view.add_group(&group);
            self.groups.insert(*id, group);
            self.order.push(*id);
        }

        if !diff.is_empty() {
            tracing::debug!(
                "Reconciled panel: +{} -{} ({} groups)",
                diff.added.len(),
                diff.removed.len(),
                self.order.len()
            );
        }
        diff
    }

    fn toggle_cursor(&mut self, id: CursorId, enabled: bool) {
        if self.update_group(id, |group| group.cursor_enabled = enabled) {
            self.send(Message::ChangeCursorDisplay(vec![DisplayChange { id, enabled }]));
        }
    }

    fn toggle_name(&mut self, id: CursorId, enabled: bool) {
        if self.update_group(id, |group| group.name_enabled = enabled) {
            self.send(Message::ChangeNameDisplay(DisplayChange { id, enabled }));
        }
    }

    fn set_opacity(&mut self, id: CursorId, value: Opacity) {
        if self.update_group(id, |group| group.opacity = value) {
            self.send(Message::ChangeCursorOpacity(vec![OpacityChange { id, value }]));
        }
    }

    async fn set_all_enabled(&mut self, enabled: bool) -> SyncResult<()> {
        self.defaults.all_enabled = enabled;
        self.store.set(StoreKey::AllCursors, &self.defaults).await?;

        let changes: Vec<DisplayChange> = self
            .sweep(|group| {
                if group.cursor_enabled == enabled {
                    return false;
                }
                group.cursor_enabled = enabled;
                true
            })
            .into_iter()
            .map(|id| DisplayChange { id, enabled })
            .collect();

        if !changes.is_empty() {
            self.send(Message::ChangeCursorDisplay(changes));
        }
        Ok(())
    }

    async fn set_all_show_names(&mut self, enabled: bool) -> SyncResult<()> {
        self.defaults.all_show_names = enabled;
        self.store.set(StoreKey::AllCursors, &self.defaults).await?;

        let flipped = self.sweep(|group| {
            if group.name_enabled == enabled {
                return false;
            }
            group.name_enabled = enabled;
            true
        });
        // No batch form for name changes
        for id in flipped {
            self.send(Message::ChangeNameDisplay(DisplayChange { id, enabled }));
        }
        Ok(())
    }

    /// Move the global opacity; cursors whose opacity lies between the old
    /// and the new global value follow it, the rest keep theirs
    async fn set_all_opacity(&mut self, value: Opacity) -> SyncResult<()> {
        let previous = self.defaults.all_opacity;
        self.defaults.all_opacity = value;
        self.store.set(StoreKey::AllCursors, &self.defaults).await?;

        let changes: Vec<OpacityChange> = self
            .sweep(|group| {
                if group.opacity == value || !group.opacity.is_between(previous, value) {
                    return false;
                }
                group.opacity = value;
                true
            })
            .into_iter()
            .map(|id| OpacityChange { id, value })
            .collect();

        if !changes.is_empty() {
            self.send(Message::ChangeCursorOpacity(changes));
        }
        Ok(())
    }

    fn update_group(&mut self, id: CursorId, apply: impl FnOnce(&mut ControlGroup)) -> bool {
        let Some(group) = self.groups.get_mut(&id) else {
            tracing::debug!("No control group for cursor {}", id);
            return false;
        };
        apply(group);
        self.view.update_group(group);
        true
    }

    /// Apply `flip` to every rendered group, returning the ids it changed
    fn sweep(&mut self, mut flip: impl FnMut(&mut ControlGroup) -> bool) -> Vec<CursorId> {
        let mut changed = Vec::new();
        for id in &self.order {
            let Some(group) = self.groups.get_mut(id) else {
                continue;
            };
            if flip(group) {
                self.view.update_group(group);
                changed.push(*id);
            }
        }
        changed
    }

    fn send(&self, message: Message) {
        if let Err(e) = self.port.send(&message) {
            tracing::warn!("Could not send {} to the page: {}", message.kind(), e);
        }
    }
}
