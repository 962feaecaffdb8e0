//! Export of an account's identity documents.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::event::{Event, Kind};
use serde::Serialize;
use tracing::{debug, info};

use crate::pool::RelayPool;
use crate::session::DocumentSource;

/// Kinds exported, in output order.
pub const BACKUP_KINDS: [Kind; 7] = [
    Kind::PROFILE,
    Kind::FOLLOW_LIST,
    Kind::RELAY_LIST,
    Kind::DM_RELAY_LIST,
    Kind::NUTZAP_INFO,
    Kind::WALLET,
    Kind::WALLET_OLD,
];

#[derive(Clone, Debug, Serialize)]
pub struct Backup {
    pub pubkey: PublicKey,
    pub events: Vec<BackupEvent>,
    pub meta: BackupMeta,
}

#[derive(Clone, Debug, Serialize)]
pub struct BackupEvent {
    pub kind: Kind,
    pub kind_label: String,
    /// Relay the exported version came from.
    pub source: PeerAddress,
    pub event: Event,
}

#[derive(Clone, Debug, Serialize)]
pub struct BackupMeta {
    /// RFC 3339, UTC, second precision.
    pub created_at: String,
    pub version: String,
    pub relays_queried: Vec<PeerAddress>,
}

impl BackupMeta {
    #[must_use]
    pub fn new(now: DateTime<Utc>, relays_queried: Vec<PeerAddress>) -> Self {
        Self {
            created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            relays_queried,
        }
    }
}

impl Backup {
    #[must_use]
    pub fn kinds_found(&self) -> Vec<Kind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

/// Resolve every exported kind through the pool, one deadline per kind.
/// Kinds nobody holds are left out.
pub async fn backup<S: DocumentSource>(
    pool: &mut RelayPool<S>,
    account: PublicKey,
    per_kind: Duration,
) -> Backup {
    let meta = BackupMeta::new(Utc::now(), pool.addresses().cloned().collect());
    let mut events = Vec::new();

    for kind in BACKUP_KINDS {
        let label = kind.label();

        match pool.resolve(account, kind, per_kind).await {
            Some(found) => {
                debug!(%kind, %label, source = %found.source, "Exporting document");
                events.push(BackupEvent {
                    kind,
                    kind_label: label,
                    source: found.source,
                    event: found.value,
                });
            }
            None => debug!(%kind, %label, "Document not found"),
        }
    }

    info!(%account, found = events.len(), "Backup complete");

    Backup {
        pubkey: account,
        events,
        meta,
    }
}
