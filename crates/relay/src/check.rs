//! Health checks of an account's published relay configuration.

use std::fmt;
use std::time::Duration;

use futures_util::future::join_all;
use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;
use nihao_primitives::event::{Event, Kind, RelayMarker};
use serde::Serialize;

use crate::pool::RelayPool;
use crate::probe::Probe;
use crate::session::DocumentSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckItem {
    pub name: &'static str,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl CheckItem {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckReport {
    pub pubkey: PublicKey,
    pub checks: Vec<CheckItem>,
    /// Probe results for every relay of the account's relay list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relays: Vec<CapabilityRecord>,
}

impl CheckReport {
    #[must_use]
    pub fn item(&self, name: &str) -> Option<&CheckItem> {
        self.checks.iter().find(|item| item.name == name)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|item| item.status != CheckStatus::Fail)
    }
}

/// Inspect the account's relay list (kind 10002) and DM relay list
/// (kind 10050). Each listed relay is probed through `prober`.
pub async fn check_relays<S: DocumentSource, P: Probe>(
    pool: &mut RelayPool<S>,
    account: PublicKey,
    prober: &P,
    per_kind: Duration,
) -> CheckReport {
    let mut checks = Vec::new();
    let mut relays = Vec::new();

    let relay_list = pool.resolve(account, Kind::RELAY_LIST, per_kind).await;

    match relay_list {
        Some(found) if !found.value.relay_list().is_empty() => {
            let event = found.value;
            checks.push(relay_count(&event));
            checks.push(relay_markers(&event));

            let (quality, records) = relay_quality(&event, prober).await;
            checks.push(quality);
            relays = records;
        }
        _ => checks.push(CheckItem::new(
            "relay_list",
            CheckStatus::Fail,
            "no kind 10002 found",
        )),
    }

    let dm_relays = pool.resolve(account, Kind::DM_RELAY_LIST, per_kind).await;
    checks.push(dm_relay_check(dm_relays.as_ref().map(|found| &found.value)));

    CheckReport {
        pubkey: account,
        checks,
        relays,
    }
}

fn relay_count(event: &Event) -> CheckItem {
    match event.relay_list().len() {
        0 => CheckItem::new("relay_list", CheckStatus::Fail, "no kind 10002 found"),
        1 => CheckItem::new("relay_list", CheckStatus::Warn, "only 1 relay(s)"),
        count => CheckItem::new("relay_list", CheckStatus::Pass, format!("{count} relays")),
    }
}

fn relay_markers(event: &Event) -> CheckItem {
    let entries = event.relay_list();

    if entries.iter().all(|entry| !entry.explicit) {
        return CheckItem::new(
            "relay_markers",
            CheckStatus::Warn,
            format!(
                "all {} relays have no read/write markers, \
                 clients may not route DMs or replies correctly",
                entries.len()
            ),
        );
    }

    let count = |marker: RelayMarker| entries.iter().filter(|entry| entry.marker == marker).count();

    let parts: Vec<_> = [
        (count(RelayMarker::Read), "read"),
        (count(RelayMarker::Write), "write"),
        (count(RelayMarker::Both), "both"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{n} {label}"))
    .collect();

    CheckItem::new("relay_markers", CheckStatus::Pass, parts.join(", "))
}

async fn relay_quality<P: Probe>(event: &Event, prober: &P) -> (CheckItem, Vec<CapabilityRecord>) {
    let entries = event.relay_list();
    let total = entries.len();

    let mut dead = Vec::new();
    let mut addresses = Vec::new();
    for entry in entries {
        match PeerAddress::normalize(&entry.url) {
            Some(address) => addresses.push(address),
            None => dead.push(entry.url),
        }
    }

    let records = join_all(addresses.iter().map(|address| prober.probe(address))).await;

    let reachable: Vec<_> = records.iter().filter(|record| record.reachable).collect();
    dead.extend(
        records
            .iter()
            .filter(|record| !record.reachable)
            .map(|record| record.address.to_string()),
    );

    let item = if reachable.is_empty() {
        CheckItem::new("relay_quality", CheckStatus::Fail, "no relays reachable")
    } else if dead.is_empty() {
        let average = reachable.iter().map(|record| record.latency_ms).sum::<u64>()
            / reachable.len() as u64;
        CheckItem::new(
            "relay_quality",
            CheckStatus::Pass,
            format!("all {} reachable, avg {average}ms", reachable.len()),
        )
    } else {
        CheckItem::new(
            "relay_quality",
            CheckStatus::Warn,
            format!(
                "{}/{total} reachable, {} dead: {}",
                reachable.len(),
                dead.len(),
                dead.join(", ")
            ),
        )
    };

    (item, records)
}

fn dm_relay_check(event: Option<&Event>) -> CheckItem {
    let Some(event) = event else {
        return CheckItem::new(
            "dm_relays",
            CheckStatus::Warn,
            "no kind 10050 (DM relay list), others may not be able to send you DMs",
        );
    };

    let urls: Vec<_> = event.tag_values("relay").collect();

    if urls.is_empty() {
        return CheckItem::new(
            "dm_relays",
            CheckStatus::Warn,
            "kind 10050 found but no relay tags",
        );
    }

    CheckItem::new(
        "dm_relays",
        CheckStatus::Pass,
        format!("{} DM relay(s): {}", urls.len(), urls.join(", ")),
    )
}

#[cfg(test)]
#[path = "tests/check.rs"]
mod tests;
