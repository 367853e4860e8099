//! In-process message port between the panel and the page context
//!
//! A port is one end of an ordered, bidirectional text link. Frames travel in
//! their wire encoding so both ends exercise the real codec. Dropping either
//! end closes the link; nothing is redelivered.

use super::frame::{Frame, Message};
use crate::error::{SyncError, SyncResult};
use tokio::sync::mpsc;

pub struct Port {
    name: String,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Port {
    /// Two connected ends of a new link
    pub fn pair(name: &str) -> (Port, Port) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Port {
                name: name.to_string(),
                tx: a_tx,
                rx: b_rx,
            },
            Port {
                name: name.to_string(),
                tx: b_tx,
                rx: a_rx,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(&self, message: &Message) -> SyncResult<()> {
        self.post(&message.to_frame()?)
    }

    pub fn post(&self, frame: &Frame) -> SyncResult<()> {
        self.tx
            .send(frame.encode()?)
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Next well-formed frame, or `None` once the other end is dropped
    ///
    /// Malformed frames are skipped. Cancel-safe.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            let text = self.rx.recv().await?;
            match Frame::decode(&text) {
                Ok(frame) => return Some(frame),
                Err(e) => tracing::debug!("Dropping frame on port {}: {}", self.name, e),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn post_raw(&self, text: &str) -> SyncResult<()> {
        self.tx
            .send(text.to_string())
            .map_err(|_| SyncError::ChannelClosed)
    }
}

/// Panel-side handle used to open links to the page context
#[derive(Clone)]
pub struct PortConnector {
    tx: mpsc::UnboundedSender<Port>,
}

impl PortConnector {
    /// Open a new link; the page context receives the other end
    pub fn connect(&self, name: &str) -> SyncResult<Port> {
        let (local, remote) = Port::pair(name);
        self.tx.send(remote).map_err(|_| SyncError::ChannelClosed)?;
        Ok(local)
    }
}

/// Page-side end that accepts links opened by panels
pub struct PortListener {
    rx: mpsc::UnboundedReceiver<Port>,
}

impl PortListener {
    /// Next incoming link, or `None` once every connector is dropped
    pub async fn accept(&mut self) -> Option<Port> {
        self.rx.recv().await
    }
}

pub fn port_listener() -> (PortConnector, PortListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PortConnector { tx }, PortListener { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (a, mut b) = Port::pair("edit_cursors");
        a.send(&Message::Ping).unwrap();
        a.send(&Message::Pong).unwrap();

        assert_eq!(Message::try_from(b.recv().await.unwrap()).unwrap(), Message::Ping);
        assert_eq!(Message::try_from(b.recv().await.unwrap()).unwrap(), Message::Pong);
    }

    #[tokio::test]
    async fn test_malformed_frames_are_skipped() {
        let (a, mut b) = Port::pair("edit_cursors");
        a.post_raw("{{{").unwrap();
        a.post_raw("[42]").unwrap();
        a.send(&Message::Pong).unwrap();

        assert_eq!(Message::try_from(b.recv().await.unwrap()).unwrap(), Message::Pong);
    }

    #[tokio::test]
    async fn test_drop_closes_link() {
        let (a, mut b) = Port::pair("edit_cursors");
        drop(a);
        assert!(b.recv().await.is_none());
        assert!(matches!(b.send(&Message::Ping), Err(SyncError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_connector_hands_remote_end_to_listener() {
        let (connector, mut listener) = port_listener();
        let panel = connector.connect("edit_cursors").unwrap();
        let mut page = listener.accept().await.unwrap();

        assert_eq!(page.name(), "edit_cursors");
        panel.send(&Message::Pong).unwrap();
        assert_eq!(Message::try_from(page.recv().await.unwrap()).unwrap(), Message::Pong);
    }

    #[tokio::test]
    async fn test_connect_without_listener_fails() {
        let (connector, listener) = port_listener();
        drop(listener);
        assert!(matches!(connector.connect("edit_cursors"), Err(SyncError::ChannelClosed)));
    }
}
