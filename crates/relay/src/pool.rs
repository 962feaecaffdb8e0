//! Sessions kept open for the length of one run.

use std::time::Duration;

use futures_util::future::join_all;
use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::event::{Event, Kind, Sourced};
use tracing::{info, warn};

use crate::resolve::resolve;
use crate::session::{Connector, DocumentSource};

/// One open session per reachable configured relay. Every query of a run goes
/// through the same sessions.
#[derive(Debug)]
pub struct RelayPool<S> {
    sessions: Vec<S>,
}

impl<S: DocumentSource> RelayPool<S> {
    /// Connect to every address concurrently. Relays that fail to connect
    /// are left out.
    pub async fn connect_all<C>(connector: &C, addresses: &[PeerAddress]) -> Self
    where
        C: Connector<Session = S>,
    {
        let attempts = join_all(addresses.iter().map(|address| async move {
            (address, connector.connect(address).await)
        }))
        .await;

        let mut sessions = Vec::with_capacity(attempts.len());

        for (address, attempt) in attempts {
            match attempt {
                Ok(session) => sessions.push(session),
                Err(err) => warn!(%address, error = %err, "Could not connect to relay"),
            }
        }

        info!(connected = sessions.len(), configured = addresses.len(), "Relay pool ready");

        Self { sessions }
    }

    #[must_use]
    pub fn from_sessions(sessions: Vec<S>) -> Self {
        Self { sessions }
    }

    pub fn addresses(&self) -> impl Iterator<Item = &PeerAddress> {
        self.sessions.iter().map(DocumentSource::address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Newest `kind` document of `account` across the pool.
    pub async fn resolve(
        &mut self,
        account: PublicKey,
        kind: Kind,
        deadline: Duration,
    ) -> Option<Sourced<Event>> {
        resolve(&mut self.sessions, account, kind, deadline).await
    }

    pub async fn close_all(mut self) {
        let _ignored = join_all(self.sessions.iter_mut().map(|session| session.close())).await;
    }
}
