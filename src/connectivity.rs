//! Connectivity resilience manager.
//!
//! Owns the link state machine and all retry bookkeeping:
//!
//! ```text
//! Disconnected ──join ok──▶ NetworkUp ──broker ok──▶ NetworkUpAndBrokerUp
//!      ▲                        │  ▲                        │
//!      └──── link drop ─────────┘  └──── broker drop ───────┘
//! ```
//!
//! Failures increment `retry_count`; any forward transition resets it.
//! After `max_immediate_retries` consecutive failures the manager arms
//! a long backoff and makes no further attempts until it expires.
//! Attempts are synchronous and bound the tick's latency by the join
//! timeout — acceptable because the single execution context has no
//! other concurrent work to starve.

use log::{info, warn};

use crate::app::ports::{NetworkPort, PublisherPort};
use crate::config::SystemConfig;

/// Connectivity states, strictly ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkState {
    Disconnected,
    NetworkUp,
    NetworkUpAndBrokerUp,
}

/// The resilience manager. Sole owner and writer of [`LinkState`].
pub struct ConnectivityManager {
    state: LinkState,
    retry_count: u8,
    next_attempt_not_before_ms: u64,
    max_immediate_retries: u8,
    long_backoff_ms: u64,
    join_timeout_ms: u64,
}

impl ConnectivityManager {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: LinkState::Disconnected,
            retry_count: 0,
            next_attempt_not_before_ms: 0,
            max_immediate_retries: config.max_immediate_retries,
            long_backoff_ms: config.long_backoff_ms,
            join_timeout_ms: config.join_timeout_ms,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_fully_connected(&self) -> bool {
        self.state == LinkState::NetworkUpAndBrokerUp
    }

    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    /// When the next attempt is permitted (0 = immediately).
    pub fn next_attempt_not_before(&self) -> u64 {
        self.next_attempt_not_before_ms
    }

    /// One maintenance pass: verify the link, then advance the state
    /// machine as far as it will go this attempt.
    pub fn maintain(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        publisher: &mut impl PublisherPort,
    ) {
        // A dropped link invalidates everything above it.
        if self.state > LinkState::Disconnected && !net.is_connected() {
            warn!("Connectivity: network link lost");
            self.state = LinkState::Disconnected;
        }

        if self.is_fully_connected() {
            return;
        }
        if now_ms < self.next_attempt_not_before_ms {
            return;
        }

        if self.state == LinkState::Disconnected {
            info!("Connectivity: attempting network join ({}s timeout)",
                self.join_timeout_ms / 1000);
            match net.connect(self.join_timeout_ms) {
                Ok(()) => {
                    info!("Connectivity: network up");
                    self.forward(LinkState::NetworkUp);
                }
                Err(e) => {
                    warn!("Connectivity: network join failed — {}", e);
                    self.record_failure(now_ms);
                    return;
                }
            }
        }

        if self.state == LinkState::NetworkUp {
            match publisher.connect() {
                Ok(()) => {
                    info!("Connectivity: broker up");
                    self.forward(LinkState::NetworkUpAndBrokerUp);
                }
                Err(e) => {
                    warn!("Connectivity: broker handshake failed — {}", e);
                    self.record_failure(now_ms);
                }
            }
        }
    }

    /// A broker disconnect observed at publish or pump time demotes the
    /// state immediately, without waiting for the next maintenance pass.
    pub fn note_broker_lost(&mut self) {
        if self.state == LinkState::NetworkUpAndBrokerUp {
            warn!("Connectivity: broker connection lost — will retry later");
            self.state = LinkState::NetworkUp;
        }
    }

    /// Re-arm after a restart sequence (simulation only; hardware never
    /// returns from the restart).
    pub fn rearm(&mut self) {
        self.state = LinkState::Disconnected;
        self.retry_count = 0;
        self.next_attempt_not_before_ms = 0;
    }

    fn forward(&mut self, next: LinkState) {
        self.state = next;
        self.retry_count = 0;
    }

    fn record_failure(&mut self, now_ms: u64) {
        self.retry_count += 1;
        if self.retry_count >= self.max_immediate_retries {
            warn!(
                "Connectivity: {} consecutive failures — backing off {}s",
                self.retry_count,
                self.long_backoff_ms / 1000
            );
            self.next_attempt_not_before_ms = now_ms + self.long_backoff_ms;
            self.retry_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommsError;

    /// Scripted network port: pops one result per connect call.
    struct ScriptedNet {
        results: Vec<Result<(), CommsError>>,
        up: bool,
    }

    impl ScriptedNet {
        fn new(results: Vec<Result<(), CommsError>>) -> Self {
            Self { results, up: false }
        }
    }

    impl NetworkPort for ScriptedNet {
        fn connect(&mut self, _timeout_ms: u64) -> Result<(), CommsError> {
            let r = if self.results.is_empty() {
                Ok(())
            } else {
                self.results.remove(0)
            };
            self.up = r.is_ok();
            r
        }
        fn is_connected(&self) -> bool {
            self.up
        }
        fn disconnect(&mut self) {
            self.up = false;
        }
    }

    struct ScriptedBroker {
        results: Vec<Result<(), CommsError>>,
        up: bool,
    }

    impl ScriptedBroker {
        fn new(results: Vec<Result<(), CommsError>>) -> Self {
            Self { results, up: false }
        }
    }

    impl PublisherPort for ScriptedBroker {
        fn connect(&mut self) -> Result<(), CommsError> {
            let r = if self.results.is_empty() {
                Ok(())
            } else {
                self.results.remove(0)
            };
            self.up = r.is_ok();
            r
        }
        fn is_connected(&self) -> bool {
            self.up
        }
        fn publish(&mut self, _topic: &str, _payload: &str) -> Result<(), CommsError> {
            if self.up { Ok(()) } else { Err(CommsError::NotConnected) }
        }
        fn disconnect(&mut self) {
            self.up = false;
        }
        fn pump(&mut self) {}
    }

    fn manager() -> ConnectivityManager {
        ConnectivityManager::new(&crate::config::SystemConfig::default())
    }

    #[test]
    fn full_connection_in_one_pass() {
        let mut m = manager();
        let mut net = ScriptedNet::new(vec![Ok(())]);
        let mut broker = ScriptedBroker::new(vec![Ok(())]);
        m.maintain(0, &mut net, &mut broker);
        assert_eq!(m.state(), LinkState::NetworkUpAndBrokerUp);
        assert_eq!(m.retry_count(), 0);
    }

    #[test]
    fn join_failure_stays_disconnected_and_counts() {
        let mut m = manager();
        let mut net = ScriptedNet::new(vec![Err(CommsError::JoinFailed)]);
        let mut broker = ScriptedBroker::new(vec![]);
        m.maintain(0, &mut net, &mut broker);
        assert_eq!(m.state(), LinkState::Disconnected);
        assert_eq!(m.retry_count(), 1);
    }

    #[test]
    fn broker_failure_keeps_network_up() {
        let mut m = manager();
        let mut net = ScriptedNet::new(vec![Ok(())]);
        let mut broker = ScriptedBroker::new(vec![Err(CommsError::BrokerConnectFailed)]);
        m.maintain(0, &mut net, &mut broker);
        assert_eq!(m.state(), LinkState::NetworkUp);
        assert_eq!(m.retry_count(), 1);
    }

    #[test]
    fn long_backoff_after_retry_threshold() {
        let mut m = manager();
        let backoff = m.long_backoff_ms;
        let mut broker = ScriptedBroker::new(vec![]);

        // Three consecutive join failures arm the backoff.
        for i in 0..3u32 {
            let mut net = ScriptedNet::new(vec![Err(CommsError::JoinFailed)]);
            m.maintain(u64::from(i), &mut net, &mut broker);
        }
        assert_eq!(m.retry_count(), 0, "counter resets when backoff arms");
        assert!(m.next_attempt_not_before() >= backoff);

        // Inside the backoff window no attempt is made, even with a
        // network that would succeed.
        let mut willing_net = ScriptedNet::new(vec![Ok(())]);
        m.maintain(backoff / 2, &mut willing_net, &mut broker);
        assert_eq!(m.state(), LinkState::Disconnected);

        // After the window one attempt is allowed and success resets
        // everything.
        let mut net = ScriptedNet::new(vec![Ok(())]);
        let mut broker = ScriptedBroker::new(vec![Ok(())]);
        m.maintain(backoff + 10, &mut net, &mut broker);
        assert_eq!(m.state(), LinkState::NetworkUpAndBrokerUp);
        assert_eq!(m.retry_count(), 0);
    }

    #[test]
    fn broker_loss_demotes_immediately() {
        let mut m = manager();
        let mut net = ScriptedNet::new(vec![Ok(())]);
        let mut broker = ScriptedBroker::new(vec![Ok(())]);
        m.maintain(0, &mut net, &mut broker);
        assert!(m.is_fully_connected());

        m.note_broker_lost();
        assert_eq!(m.state(), LinkState::NetworkUp);
    }

    #[test]
    fn link_drop_demotes_to_disconnected() {
        let mut m = manager();
        let mut net = ScriptedNet::new(vec![Ok(())]);
        let mut broker = ScriptedBroker::new(vec![Ok(())]);
        m.maintain(0, &mut net, &mut broker);
        assert!(m.is_fully_connected());

        net.up = false;
        // Next maintenance notices the dropped link before anything else.
        let mut dead_net = ScriptedNet::new(vec![Err(CommsError::JoinFailed)]);
        m.maintain(10, &mut dead_net, &mut broker);
        assert_eq!(m.state(), LinkState::Disconnected);
    }
}
