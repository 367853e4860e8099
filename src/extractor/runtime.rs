//! Page context event loop
//!
//! One [`PageRuntime`] exists per observed page. It owns the derived cursor
//! list, the host handle and at most one panel connection, and processes
//! mutation batches, store changes and panel traffic one event at a time.

use super::cursors::CursorExtractor;
use super::host::HostDom;
use super::mutation::MutationBatch;
use crate::channel::{ConnectionEvent, Liveness, Message, PanelConnection, Port, PortListener};
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::model::{CursorRecord, GlobalDefaults};
use crate::store::{BoardStore, BoardSubscription, StoreChange, StoreKey};
use tokio::sync::mpsc;

/// Event sources feeding a [`PageRuntime`]
pub struct PageInputs {
    pub mutations: mpsc::UnboundedReceiver<MutationBatch>,
    pub connections: PortListener,
}

pub struct PageRuntime<H: HostDom> {
    store: BoardStore,
    changes: BoardSubscription,
    extractor: CursorExtractor,
    host: H,
    config: SyncConfig,
    connection: Option<PanelConnection>,
    next_connection_id: u64,
}

impl<H: HostDom> PageRuntime<H> {
    /// Prepare storage for this page and load the board defaults
    ///
    /// A schema version change resets the defaults. The cursor list always
    /// starts empty since ids from a previous page load no longer exist.
    pub async fn activate(store: BoardStore, host: H, config: SyncConfig) -> SyncResult<Self> {
        // Defaults written between activation and the loop start must not be lost
        let changes = store.subscribe();
        let stored_version: Option<String> = store.get(StoreKey::Version).await?;
        let version_changed = stored_version.as_deref() != Some(config.schema_version.as_str());
        store.set(StoreKey::Version, &config.schema_version).await?;

        if version_changed {
            tracing::info!(
                "Schema version changed ({:?} -> {}), resetting defaults for board {}",
                stored_version,
                config.schema_version,
                store.board()
            );
            store
                .set(StoreKey::AllCursors, &GlobalDefaults::default())
                .await?;
        }

        let defaults = store
            .get::<GlobalDefaults>(StoreKey::AllCursors)
            .await?
            .unwrap_or_default();
        store
            .set(StoreKey::Cursors, &Vec::<CursorRecord>::new())
            .await?;

        tracing::info!("Page context active for board {} ({:?})", store.board(), defaults);

        Ok(Self {
            store,
            changes,
            extractor: CursorExtractor::new(defaults),
            host,
            config,
            connection: None,
            next_connection_id: 0,
        })
    }

    pub fn cursors(&self) -> &[CursorRecord] {
        self.extractor.cursors()
    }

    pub fn defaults(&self) -> &GlobalDefaults {
        self.extractor.defaults()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Id of the live panel connection, if any
    pub fn connection_id(&self) -> Option<u64> {
        self.connection.as_ref().map(PanelConnection::id)
    }

    /// Run until the mutation source goes away, then hand the host back
    pub async fn run(mut self, inputs: PageInputs) -> H {
        let PageInputs {
            mut mutations,
            mut connections,
        } = inputs;
        let mut store_open = true;
        let mut listening = true;

        loop {
            tokio::select! {
                batch = mutations.recv() => match batch {
                    Some(batch) => {
                        if let Err(e) = self.handle_batch(&batch).await {
                            tracing::warn!("Failed to store cursor list: {}", e);
                        }
                    }
                    None => break,
                },
                change = self.changes.recv(), if store_open => match change {
                    Some(change) => self.handle_store_change(&change),
                    None => store_open = false,
                },
                port = connections.accept(), if listening => match port {
                    Some(port) => self.accept(port),
                    None => listening = false,
                },
                event = next_connection_event(&mut self.connection) => {
                    self.handle_connection_event(event);
                }
            }
        }

        tracing::info!("Page context for board {} stopped", self.store.board());
        self.host
    }

    /// Derive and persist the new list for one batch. Returns whether the
    /// store was written.
    pub async fn handle_batch(&mut self, batch: &MutationBatch) -> SyncResult<bool> {
        let Some(cursors) = self.extractor.apply_batch(batch, &mut self.host) else {
            return Ok(false);
        };
        self.store.set(StoreKey::Cursors, &cursors).await?;
        Ok(true)
    }

    pub fn handle_store_change(&mut self, change: &StoreChange) {
        if change.key != StoreKey::AllCursors {
            return;
        }
        let defaults = change.new_as::<GlobalDefaults>().unwrap_or_default();
        if defaults != *self.extractor.defaults() {
            tracing::debug!("Defaults for board {} now {:?}", self.store.board(), defaults);
            self.extractor.set_defaults(defaults);
        }
    }

    /// Attach a handler to a newly opened link, superseding any previous one
    pub fn accept(&mut self, port: Port) {
        if port.name() != self.config.port_name {
            tracing::debug!("Ignoring link on unexpected port {}", port.name());
            return;
        }

        self.next_connection_id += 1;
        let connection =
            PanelConnection::open(self.next_connection_id, port, self.config.ping_interval());
        if let Some(previous) = self.connection.replace(connection) {
            tracing::info!(
                "Panel connection {} superseded by {}",
                previous.id(),
                self.next_connection_id
            );
        }
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        match event {
            ConnectionEvent::Tick => {
                if connection.handle_tick() == Liveness::Expired {
                    self.release_connection();
                }
            }
            ConnectionEvent::Frame(frame) => {
                if let Some(message) = connection.handle_frame(frame) {
                    self.apply_command(message);
                }
            }
            ConnectionEvent::Closed => {
                tracing::info!("Panel closed connection {}", connection.id());
                self.release_connection();
            }
        }
    }

    // Dropping the handler stops its timer and closes the port
    fn release_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::info!("Released panel connection {}", connection.id());
        }
    }

    fn apply_command(&mut self, message: Message) {
        match message {
            Message::ChangeCursorDisplay(changes) => {
                for change in changes {
                    if !self
                        .extractor
                        .set_cursor_visible(change.id, change.enabled, &mut self.host)
                    {
                        tracing::debug!("No cursor {} to toggle", change.id);
                    }
                }
            }
            other => {
                tracing::debug!("Not applying {} on the page side", other.kind());
            }
        }
    }
}

async fn next_connection_event(connection: &mut Option<PanelConnection>) -> ConnectionEvent {
    match connection {
        Some(connection) => connection.next_event().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{port_listener, DisplayChange};
    use crate::extractor::host::{MemoryHost, StyleProperty};
    use crate::extractor::mutation::{MutationEvent, NodeHandle, NodeKind, NodeSnapshot};
    use crate::model::Opacity;
    use crate::store::{BoardId, MemoryBackend, StorageBackend};
    use std::sync::Arc;
    use std::time::Duration;

    fn store() -> BoardStore {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        BoardStore::new(backend, BoardId::from_url("abcd-efgh-ijkl-mnop-qrst").unwrap())
    }

    fn appear(handle: u64) -> MutationBatch {
        vec![MutationEvent::ChildAdded {
            target: NodeSnapshot::new(1, NodeKind::Container),
            child: NodeSnapshot::new(handle, NodeKind::Cursor),
        }]
    }

    #[tokio::test]
    async fn test_first_visit_initializes_storage() {
        let store = store();
        let runtime = PageRuntime::activate(store.clone(), MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();

        assert_eq!(*runtime.defaults(), GlobalDefaults::default());
        assert_eq!(
            store.get::<String>(StoreKey::Version).await.unwrap().as_deref(),
            Some(crate::config::SCHEMA_VERSION)
        );
        assert_eq!(
            store.get::<GlobalDefaults>(StoreKey::AllCursors).await.unwrap(),
            Some(GlobalDefaults::default())
        );
        assert_eq!(
            store.get::<Vec<CursorRecord>>(StoreKey::Cursors).await.unwrap(),
            Some(vec![])
        );
    }

    #[tokio::test]
    async fn test_same_version_keeps_defaults() {
        let store = store();
        let custom = GlobalDefaults {
            all_enabled: false,
            all_show_names: true,
            all_opacity: Opacity::new(30),
        };
        store.set(StoreKey::Version, &crate::config::SCHEMA_VERSION).await.unwrap();
        store.set(StoreKey::AllCursors, &custom).await.unwrap();

        let runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();
        assert_eq!(*runtime.defaults(), custom);
    }

    #[tokio::test]
    async fn test_version_change_resets_defaults() {
        let store = store();
        store.set(StoreKey::Version, &"0.9.0").await.unwrap();
        store
            .set(
                StoreKey::AllCursors,
                &GlobalDefaults {
                    all_enabled: false,
                    all_show_names: false,
                    all_opacity: Opacity::new(5),
                },
            )
            .await
            .unwrap();

        let runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();
        assert_eq!(*runtime.defaults(), GlobalDefaults::default());
    }

    #[tokio::test]
    async fn test_batch_writes_store_once() {
        let store = store();
        let mut runtime =
            PageRuntime::activate(store.clone(), MemoryHost::new(), SyncConfig::default())
                .await
                .unwrap();
        let mut sub = store.subscribe();

        let mut batch = appear(10);
        batch.extend(appear(11));
        assert!(runtime.handle_batch(&batch).await.unwrap());

        let change = sub.recv().await.unwrap();
        assert_eq!(change.key, StoreKey::Cursors);
        assert_eq!(change.new_as::<Vec<CursorRecord>>().unwrap().len(), 2);

        // Nothing recognizable: no write
        let noise = vec![MutationEvent::AttributeChanged {
            target: NodeSnapshot::new(50, NodeKind::Other),
        }];
        assert!(!runtime.handle_batch(&noise).await.unwrap());
    }

    #[tokio::test]
    async fn test_defaults_change_applies_to_later_cursors() {
        let store = store();
        let mut runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();

        let hidden = GlobalDefaults {
            all_enabled: false,
            ..GlobalDefaults::default()
        };
        runtime.handle_store_change(&StoreChange {
            key: StoreKey::AllCursors,
            old_value: None,
            new_value: Some(serde_json::to_value(hidden).unwrap()),
        });
        runtime.handle_batch(&appear(20)).await.unwrap();

        assert!(!runtime.cursors()[0].enabled);
        assert_eq!(
            runtime.host().style(NodeHandle(20), StyleProperty::Display),
            Some("none")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_defaults_written_before_run_reach_new_cursors() {
        let store = store();
        let runtime =
            PageRuntime::activate(store.clone(), MemoryHost::new(), SyncConfig::default())
                .await
                .unwrap();
        let hidden = GlobalDefaults {
            all_enabled: false,
            ..GlobalDefaults::default()
        };
        store.set(StoreKey::AllCursors, &hidden).await.unwrap();

        let (_connector, listener) = port_listener();
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(runtime.run(PageInputs {
            mutations: mutation_rx,
            connections: listener,
        }));
        // Give the loop a chance to drain the queued store change first
        tokio::time::sleep(Duration::from_millis(10)).await;
        mutation_tx.send(appear(40)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(mutation_tx);

        let host = task.await.unwrap();
        assert_eq!(host.style(NodeHandle(40), StyleProperty::Display), Some("none"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_command_toggles_dom() {
        let store = store();
        let mut runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();
        runtime.handle_batch(&appear(30)).await.unwrap();
        let id = runtime.cursors()[0].id;

        let (connector, listener) = port_listener();
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let panel = connector.connect(crate::config::DEFAULT_PORT_NAME).unwrap();
        panel
            .send(&Message::ChangeCursorDisplay(vec![DisplayChange { id, enabled: false }]))
            .unwrap();

        let task = tokio::spawn(runtime.run(PageInputs {
            mutations: mutation_rx,
            connections: listener,
        }));
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(mutation_tx);

        let host = task.await.unwrap();
        assert_eq!(host.style(NodeHandle(30), StyleProperty::Display), Some("none"));
        drop(panel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_connection_supersedes_old() {
        let store = store();
        let mut runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();

        let (mut first_panel, first_page) = Port::pair(crate::config::DEFAULT_PORT_NAME);
        runtime.accept(first_page);
        assert_eq!(runtime.connection_id(), Some(1));

        let (_second_panel, second_page) = Port::pair(crate::config::DEFAULT_PORT_NAME);
        runtime.accept(second_page);
        assert_eq!(runtime.connection_id(), Some(2));

        // The first link was released, so its panel end sees it closed
        assert!(first_panel.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_port_name_is_ignored() {
        let store = store();
        let mut runtime = PageRuntime::activate(store, MemoryHost::new(), SyncConfig::default())
            .await
            .unwrap();

        let (_panel, page) = Port::pair("something_else");
        runtime.accept(page);
        assert_eq!(runtime.connection_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_panel_is_released() {
        let store = store();
        let config = SyncConfig {
            ping_interval_ms: 1_000,
            ..SyncConfig::default()
        };
        let runtime = PageRuntime::activate(store, MemoryHost::new(), config)
            .await
            .unwrap();

        let (connector, listener) = port_listener();
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let mut panel = connector.connect(crate::config::DEFAULT_PORT_NAME).unwrap();

        let task = tokio::spawn(runtime.run(PageInputs {
            mutations: mutation_rx,
            connections: listener,
        }));

        // Two pings go unanswered, the third tick releases the link
        let mut pings = 0;
        while let Some(frame) = panel.recv().await {
            assert_eq!(Message::try_from(frame).unwrap(), Message::Ping);
            pings += 1;
        }
        assert_eq!(pings, 2);

        drop(mutation_tx);
        task.await.unwrap();
    }
}
