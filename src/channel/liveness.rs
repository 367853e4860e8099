//! Heartbeat bookkeeping for the page side of a panel link

/// Unanswered pings tolerated before the panel is considered gone
pub const MAX_OUTSTANDING_PINGS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a ping now
    SendPing,
    /// Stop the timer and release the link
    Expire,
}

#[derive(Debug, Default)]
pub struct Heartbeat {
    outstanding: u8,
    expired: bool,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every timer tick
    pub fn on_tick(&mut self) -> HeartbeatAction {
        if self.expired {
            return HeartbeatAction::Expire;
        }
        if self.outstanding < MAX_OUTSTANDING_PINGS {
            self.outstanding += 1;
            HeartbeatAction::SendPing
        } else {
            self.expired = true;
            HeartbeatAction::Expire
        }
    }

    pub fn on_pong(&mut self) {
        if !self.expired {
            self.outstanding = 0;
        }
    }

    pub fn outstanding(&self) -> u8 {
        self.outstanding
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_after_two_unanswered_pings() {
        let mut heartbeat = Heartbeat::new();
        assert_eq!(heartbeat.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(heartbeat.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(heartbeat.outstanding(), 2);
        assert_eq!(heartbeat.on_tick(), HeartbeatAction::Expire);
        assert!(heartbeat.is_expired());
    }

    #[test]
    fn test_pong_resets_counter() {
        let mut heartbeat = Heartbeat::new();
        heartbeat.on_tick();
        heartbeat.on_pong();
        assert_eq!(heartbeat.outstanding(), 0);

        for _ in 0..100 {
            assert_eq!(heartbeat.on_tick(), HeartbeatAction::SendPing);
            heartbeat.on_pong();
        }
        assert!(!heartbeat.is_expired());
    }

    #[test]
    fn test_expiry_is_sticky() {
        let mut heartbeat = Heartbeat::new();
        for _ in 0..3 {
            heartbeat.on_tick();
        }
        heartbeat.on_pong();
        assert_eq!(heartbeat.on_tick(), HeartbeatAction::Expire);
        assert_eq!(heartbeat.on_tick(), HeartbeatAction::Expire);
    }
}
