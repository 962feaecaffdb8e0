use serde::{Deserialize, Serialize};

use crate::address::PeerAddress;
use crate::purpose::PurposeTag;

/// Relay information document (NIP-11).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityDocument {
    pub name: String,
    pub description: String,
    pub pubkey: String,
    pub contact: String,
    pub supported_nips: Vec<u32>,
    pub software: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitation: Option<Limitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_url: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limitation {
    pub max_message_length: u64,
    pub max_subscriptions: u64,
    pub max_filters: u64,
    pub max_event_tags: u64,
    pub max_content_length: u64,
    pub auth_required: bool,
    pub payment_required: bool,
}

impl CapabilityDocument {
    #[must_use]
    pub fn supports(&self, nip: u32) -> bool {
        self.supported_nips.contains(&nip)
    }

    /// One line description: name, software and version where known.
    #[must_use]
    pub fn summary(&self) -> String {
        let software = self
            .software
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim_end_matches(".git");

        let parts = [self.name.as_str(), software, self.version.as_str()];

        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of probing and scoring a single relay. Built fresh for every run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    #[serde(rename = "url")]
    pub address: PeerAddress,
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(rename = "info", skip_serializing_if = "Option::is_none")]
    pub document: Option<CapabilityDocument>,
    pub auth_required: bool,
    pub payment_required: bool,
    /// Always within `0.0..=1.0`.
    pub score: f64,
    pub purpose: PurposeTag,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl CapabilityRecord {
    /// A record for a relay that was never contacted.
    #[must_use]
    pub fn unprobed(address: PeerAddress, purpose: PurposeTag) -> Self {
        Self {
            address,
            reachable: false,
            latency_ms: 0,
            document: None,
            auth_required: false,
            payment_required: false,
            score: 0.0,
            purpose,
            issues: Vec::new(),
        }
    }

    #[must_use]
    pub const fn has_document(&self) -> bool {
        self.document.is_some()
    }

    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.document.as_ref().map(CapabilityDocument::summary)
    }
}
