//! Page-side handler for one panel link
//!
//! Each accepted link gets its own handler with its own heartbeat timer.
//! Dropping the handler stops the timer and drops the port, so nothing can be
//! sent on a link after it has been torn down.

use super::frame::{Frame, Message};
use super::liveness::{Heartbeat, HeartbeatAction};
use super::port::Port;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

#[derive(Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Tick,
    Frame(Frame),
    /// The panel dropped its end
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Expired,
}

pub struct PanelConnection {
    id: u64,
    port: Port,
    heartbeat: Heartbeat,
    ticker: Interval,
}

impl PanelConnection {
    /// Attach a handler to an accepted link; the first ping goes out one
    /// `ping_interval` after opening
    pub fn open(id: u64, port: Port, ping_interval: Duration) -> Self {
        let mut ticker = time::interval_at(Instant::now() + ping_interval, ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Panel connection {} opened on port {} (ping_interval={:?})",
            id,
            port.name(),
            ping_interval
        );

        Self {
            id,
            port,
            heartbeat: Heartbeat::new(),
            ticker,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn outstanding_pings(&self) -> u8 {
        self.heartbeat.outstanding()
    }

    /// Wait for the next frame or timer tick. Frames win ties. Cancel-safe.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        tokio::select! {
            biased;
            frame = self.port.recv() => match frame {
                Some(frame) => ConnectionEvent::Frame(frame),
                None => ConnectionEvent::Closed,
            },
            _ = self.ticker.tick() => ConnectionEvent::Tick,
        }
    }

    pub fn handle_tick(&mut self) -> Liveness {
        match self.heartbeat.on_tick() {
            HeartbeatAction::SendPing => match self.port.send(&Message::Ping) {
                Ok(()) => Liveness::Alive,
                Err(e) => {
                    tracing::warn!("Ping on panel connection {} failed: {}", self.id, e);
                    Liveness::Expired
                }
            },
            HeartbeatAction::Expire => {
                tracing::warn!(
                    "Panel connection {} missed {} pings, releasing it",
                    self.id,
                    self.heartbeat.outstanding()
                );
                Liveness::Expired
            }
        }
    }

    /// Consume heartbeat traffic; returns commands for the page to apply
    pub fn handle_frame(&mut self, frame: Frame) -> Option<Message> {
        match Message::try_from(frame) {
            Ok(Message::Pong) => {
                self.heartbeat.on_pong();
                None
            }
            Ok(Message::Ping) => None,
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("Ignoring frame on panel connection {}: {}", self.id, e);
                None
            }
        }
    }
}
