//! Social-graph relay discovery.
//!
//! The relay lists of a few well-connected reference accounts are sampled
//! through the seed relays. Every address they mention is counted once per
//! mention, then each distinct address is probed and scored.

use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::future::join_all;
use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;
use nihao_primitives::event::{Event, Filter, Kind};
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::probe::Probe;
use crate::session::{Connector, DocumentSource};

/// How often each address was mentioned during one discovery pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryTally {
    counts: BTreeMap<PeerAddress, usize>,
}

impl DiscoveryTally {
    /// Count one mention of `raw`. Addresses without a recognized transport
    /// are discarded and `false` is returned.
    pub fn record(&mut self, raw: &str) -> bool {
        let Some(address) = PeerAddress::normalize(raw) else {
            return false;
        };

        *self.counts.entry(address).or_default() += 1;

        true
    }

    #[must_use]
    pub fn count(&self, address: &PeerAddress) -> usize {
        self.counts.get(address).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &PeerAddress> {
        self.counts.keys()
    }
}

#[derive(Debug)]
pub struct Discovery<C, P> {
    connector: C,
    prober: P,
    reference_accounts: Vec<PublicKey>,
    deadline: Duration,
    seed_timeout: Duration,
}

impl<C: Connector, P: Probe> Discovery<C, P> {
    pub fn new(connector: C, prober: P, config: &DiscoveryConfig) -> Self {
        Self {
            connector,
            prober,
            reference_accounts: config.reference_accounts.clone(),
            deadline: config.deadline(),
            seed_timeout: config.seed_timeout(),
        }
    }

    /// Sample, probe and rank. Highest score first; ties keep tally order.
    pub async fn discover(&self, seeds: &[PeerAddress]) -> Vec<CapabilityRecord> {
        let tally = self.sample(seeds).await;

        info!(candidates = tally.len(), "Probing discovered relays");

        let mut records =
            join_all(tally.addresses().map(|address| self.prober.probe(address))).await;

        records.sort_by(|a, b| b.score.total_cmp(&a.score));

        records
    }

    /// Build the tally. Accounts still pending when the deadline passes
    /// contribute nothing; whatever was counted before is kept.
    pub async fn sample(&self, seeds: &[PeerAddress]) -> DiscoveryTally {
        let tally = Mutex::new(DiscoveryTally::default());
        let shared = &tally;

        let sampling = join_all(self.reference_accounts.iter().map(|account| async move {
            let Some(event) = self.relay_list_of(account, seeds).await else {
                debug!(%account, "No seed returned a relay list");
                return;
            };

            let mut tally = shared.lock().await;
            for entry in event.relay_list() {
                if !tally.record(&entry.url) {
                    debug!(%account, url = %entry.url, "Discarding unsupported relay url");
                }
            }
        }));

        if timeout(self.deadline, sampling).await.is_err() {
            debug!(deadline = ?self.deadline, "Discovery deadline reached");
        }

        tally.into_inner()
    }

    /// Seeds are tried in order; the first one holding the list wins and the
    /// rest are never contacted for this account. Each seed gets its own
    /// budget covering both the connect and the query.
    async fn relay_list_of(&self, account: &PublicKey, seeds: &[PeerAddress]) -> Option<Event> {
        let filter = Filter::latest(*account, Kind::RELAY_LIST);

        for seed in seeds {
            let budget = Instant::now() + self.seed_timeout;

            let mut session = match timeout_at(budget, self.connector.connect(seed)).await {
                Ok(Ok(session)) => session,
                Ok(Err(err)) => {
                    debug!(%seed, error = %err, "Seed unreachable");
                    continue;
                }
                Err(_) => {
                    debug!(%seed, timeout = ?self.seed_timeout, "Seed connect timed out");
                    continue;
                }
            };

            let found = timeout_at(budget, session.latest(&filter)).await;
            session.close().await;

            match found {
                Ok(Ok(Some(event))) => return Some(event),
                Ok(Ok(None)) => debug!(%seed, %account, "Seed has no relay list"),
                Ok(Err(err)) => debug!(%seed, %account, error = %err, "Relay list query failed"),
                Err(_) => debug!(%seed, %account, "Relay list query timed out"),
            }
        }

        None
    }
}

#[cfg(test)]
#[path = "tests/discovery.rs"]
mod tests;
