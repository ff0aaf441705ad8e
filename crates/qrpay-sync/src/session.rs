//! # POS Session
//!
//! Owns the ledger and the coordinator for one till session. The front end
//! holds a `PosSession` and passes it around by `&mut`; there is no other
//! shared state.

use std::sync::Arc;

use qrpay_core::{Ledger, LedgerEvent, Price};
use tracing::info;

use crate::config::ClientConfig;
use crate::coordinator::{Completion, EffectCoordinator};
use crate::diagnostics::DiagnosticsEmitter;
use crate::error::SyncResult;
use crate::remote::{HttpRemote, RemoteSync};

pub struct PosSession {
    ledger: Ledger,
    coordinator: EffectCoordinator,
}

impl PosSession {
    pub fn new(coordinator: EffectCoordinator) -> Self {
        PosSession {
            ledger: Ledger::new(),
            coordinator,
        }
    }

    /// Builds a session talking HTTP to the configured service.
    pub fn connect(config: &ClientConfig, emitter: Arc<dyn DiagnosticsEmitter>) -> SyncResult<Self> {
        let remote: Arc<dyn RemoteSync> = Arc::new(HttpRemote::new(config)?);
        let coordinator =
            EffectCoordinator::with_emitter(remote, config.display.ordering, emitter);

        info!(
            base_url = %config.base_url()?,
            ordering = %config.display.ordering,
            "Session started"
        );
        Ok(Self::new(coordinator))
    }

    /// Adds a product and hands the mutation to the coordinator.
    pub fn add_product(&mut self, name: impl Into<String>, price: Price) -> LedgerEvent {
        let event = self.ledger.add_product(name, price);
        self.coordinator.on_ledger_event(&event);
        event
    }

    /// Adds whatever is in the draft fields.
    pub fn submit_draft(&mut self) -> LedgerEvent {
        let event = self.ledger.submit_draft();
        self.coordinator.on_ledger_event(&event);
        event
    }

    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        self.ledger.set_draft_name(name);
    }

    pub fn set_draft_price(&mut self, price: Price) {
        self.ledger.set_draft_price(price);
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn coordinator(&self) -> &EffectCoordinator {
        &self.coordinator
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.coordinator.next_completion().await
    }

    pub async fn settle(&mut self) -> Vec<Completion> {
        self.coordinator.settle().await
    }

    /// Releases the displayed QR and abandons anything still in flight.
    pub fn teardown(&mut self) -> bool {
        self.coordinator.teardown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrderingPolicy;
    use crate::diagnostics::NoOpEmitter;
    use crate::remote::{Ack, PushTicket, QrImage};
    use async_trait::async_trait;
    use qrpay_core::Money;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRemote {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteSync for RecordingRemote {
        async fn push_total(&self, total: Money, _ticket: PushTicket) -> SyncResult<Ack> {
            self.calls.lock().unwrap().push(format!("push {}", total.to_wire_string()));
            Ok(Ack(serde_json::Value::Null))
        }

        async fn fetch_qr(&self, total: Money) -> SyncResult<QrImage> {
            self.calls.lock().unwrap().push(format!("fetch {}", total.to_wire_string()));
            Ok(QrImage {
                bytes: vec![1],
                content_type: None,
            })
        }
    }

    fn session(remote: &Arc<RecordingRemote>) -> PosSession {
        PosSession::new(EffectCoordinator::with_emitter(
            remote.clone(),
            OrderingPolicy::DiscardStale,
            Arc::new(NoOpEmitter),
        ))
    }

    #[tokio::test]
    async fn test_draft_flow_triggers_remote_calls() {
        let remote = Arc::new(RecordingRemote::default());
        let mut session = session(&remote);

        session.set_draft_name("Pen");
        session.set_draft_price(Price::parse("10").unwrap());
        let event = session.submit_draft();
        session.settle().await;

        assert_eq!(event.seq, 1);
        assert!(session.ledger().draft().is_blank());
        assert_eq!(session.ledger().total(), Money::from_cents(1000));

        let mut calls = remote.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["fetch 10", "push 10"]);
        assert_eq!(session.coordinator().displayed_seq(), Some(1));
    }

    #[tokio::test]
    async fn test_total_tracks_sum_across_session() {
        let remote = Arc::new(RecordingRemote::default());
        let mut session = session(&remote);

        for price in ["5", "7", "0", "2.25"] {
            session.add_product("item", Price::parse(price).unwrap());
        }
        session.settle().await;

        assert_eq!(session.ledger().total(), session.ledger().recomputed_total());
        assert_eq!(session.ledger().total(), Money::from_cents(1425));
        assert_eq!(session.coordinator().displayed().unwrap().total, Money::from_cents(1425));

        assert!(session.teardown());
        assert_eq!(session.coordinator().registry().live_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let mut config = ClientConfig::default();
        config.service.base_url = Some("ftp://nowhere".into());

        assert!(PosSession::connect(&config, Arc::new(NoOpEmitter)).is_err());
    }
}
