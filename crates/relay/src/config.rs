//! Immutable configuration shared by every component of the engine.
//!
//! Nothing in the engine reads process-wide tables; the classifier, scorer,
//! discovery and selector all take what they need from a [`RelayConfig`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::event::Kind;
use nihao_primitives::purpose::PurposeTag;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod defaults {
    pub const FALLBACK_OUTBOX: &str = "wss://purplepag.es";

    pub const DEFAULT_RELAYS: [&str; 4] = [
        "wss://relay.damus.io",
        "wss://relay.primal.net",
        "wss://nos.lol",
        "wss://purplepag.es",
    ];

    pub const RELIABLE_RELAYS: [&str; 4] = DEFAULT_RELAYS;

    /// Well-connected accounts whose relay lists are sampled during discovery.
    pub const REFERENCE_ACCOUNTS: [&str; 5] = [
        "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d", // fiatjaf
        "32e1827635450ebb3c5a7d12c1f8e7b2b514439ac10a67eef3d9fd9c5c68e245", // jb55
        "e88a691e98d9987c964521dff60025f60700378a4879180dcbbb4a5027850411", // NVK
        "04c915daefee38317fa734444acee390a8269fe5810b2241e5e6dd343dfbecc9", // odell
        "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2", // jack
    ];

    pub const PROBE_TIMEOUT_SECS: u64 = 5;
    pub const DOCUMENT_BODY_LIMIT: usize = 1 << 20;
    pub const DISCOVERY_DEADLINE_SECS: u64 = 10;
    pub const RESOLVE_DEADLINE_SECS: u64 = 5;
    pub const RUN_DEADLINE_SECS: u64 = 20;
    pub const MAX_RELAYS: usize = 5;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub classification: ClassificationConfig,
    /// Kinds an outbox relay is willing to store.
    pub outbox_kinds: Vec<Kind>,
    /// Relays with a proven track record, rewarded by the scorer.
    pub reliable: Vec<PeerAddress>,
    /// Appended by the selector whenever no outbox relay made the cut.
    pub fallback_outbox: PeerAddress,
    /// Relays used when the caller configures none.
    pub default_relays: Vec<PeerAddress>,
    pub discovery: DiscoveryConfig,
    pub timeouts: Timeouts,
    /// Upper bound handed to the selector.
    pub max_relays: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Exact address matches, checked first.
    pub exact: BTreeMap<String, PurposeTag>,
    /// Substring rules, checked in order; the first hit wins.
    pub patterns: Vec<PatternRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub pattern: String,
    pub purpose: PurposeTag,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub reference_accounts: Vec<PublicKey>,
    /// Tried in order for every reference account.
    pub seeds: Vec<PeerAddress>,
    /// Bound on the whole sampling pass.
    pub deadline_secs: u64,
    /// Bound on connecting to one seed and reading one relay list from it.
    pub seed_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Bound on each sub-probe and on each session connect.
    pub probe_secs: u64,
    /// Maximum size of a relay information document.
    pub document_body_limit: usize,
    /// Bound on resolving a single kind across the pool.
    pub resolve_secs: u64,
    /// Bound on a whole check or backup run.
    pub run_secs: u64,
}

fn addresses<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<PeerAddress> {
    raw.into_iter().filter_map(PeerAddress::normalize).collect()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            classification: ClassificationConfig::default(),
            outbox_kinds: vec![Kind::PROFILE, Kind::FOLLOW_LIST, Kind::RELAY_LIST],
            reliable: addresses(defaults::RELIABLE_RELAYS),
            fallback_outbox: PeerAddress::normalize(defaults::FALLBACK_OUTBOX)
                .expect("fallback outbox address is a valid relay address"),
            default_relays: addresses(defaults::DEFAULT_RELAYS),
            discovery: DiscoveryConfig::default(),
            timeouts: Timeouts::default(),
            max_relays: defaults::MAX_RELAYS,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        let exact = [
            ("wss://purplepag.es", PurposeTag::Outbox),
            ("wss://relay.nos.social", PurposeTag::Inbox),
            ("wss://search.nos.today", PurposeTag::Search),
            ("wss://inbox.relays.land", PurposeTag::Inbox),
            ("wss://premium.primal.net", PurposeTag::Paid),
            ("wss://nostr.wine", PurposeTag::Paid),
        ]
        .into_iter()
        .map(|(address, purpose)| (address.to_owned(), purpose))
        .collect();

        let patterns = [
            ("/inbox", PurposeTag::Inbox),
            ("nwc.", PurposeTag::Nwc),
            ("pyramid.", PurposeTag::Paid),
            ("premium.", PurposeTag::Paid),
        ]
        .into_iter()
        .map(|(pattern, purpose)| PatternRule {
            pattern: pattern.to_owned(),
            purpose,
        })
        .collect();

        Self { exact, patterns }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            reference_accounts: defaults::REFERENCE_ACCOUNTS
                .iter()
                .filter_map(|hex| hex.parse().ok())
                .collect(),
            seeds: addresses(defaults::DEFAULT_RELAYS),
            deadline_secs: defaults::DISCOVERY_DEADLINE_SECS,
            seed_timeout_secs: defaults::PROBE_TIMEOUT_SECS,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_secs: defaults::PROBE_TIMEOUT_SECS,
            document_body_limit: defaults::DOCUMENT_BODY_LIMIT,
            resolve_secs: defaults::RESOLVE_DEADLINE_SECS,
            run_secs: defaults::RUN_DEADLINE_SECS,
        }
    }
}

impl Timeouts {
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    #[must_use]
    pub const fn resolve(&self) -> Duration {
        Duration::from_secs(self.resolve_secs)
    }

    #[must_use]
    pub const fn run(&self) -> Duration {
        Duration::from_secs(self.run_secs)
    }
}

impl DiscoveryConfig {
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    #[must_use]
    pub const fn seed_timeout(&self) -> Duration {
        Duration::from_secs(self.seed_timeout_secs)
    }
}

impl RelayConfig {
    /// Load a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;

        Ok(toml::from_str(&raw)?)
    }

    /// Overlay `NIHAO_*` environment variables on top of this config.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::apply_env`] with an injectable variable lookup.
    pub fn apply_env_with(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("NIHAO_SEED_RELAYS") {
            self.discovery.seeds = parse_relays("NIHAO_SEED_RELAYS", &value)?;
        }

        if let Some(value) = lookup("NIHAO_DEFAULT_RELAYS") {
            self.default_relays = parse_relays("NIHAO_DEFAULT_RELAYS", &value)?;
        }

        if let Some(value) = lookup("NIHAO_PROBE_TIMEOUT_SECS") {
            self.timeouts.probe_secs = parse_number("NIHAO_PROBE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = lookup("NIHAO_DISCOVERY_DEADLINE_SECS") {
            self.discovery.deadline_secs = parse_number("NIHAO_DISCOVERY_DEADLINE_SECS", &value)?;
        }

        if let Some(value) = lookup("NIHAO_MAX_RELAYS") {
            self.max_relays = parse_number("NIHAO_MAX_RELAYS", &value)?;
        }

        Ok(self)
    }
}

fn parse_relays(name: &'static str, value: &str) -> Result<Vec<PeerAddress>, ConfigError> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.parse().map_err(|_| ConfigError::InvalidEnv {
                name,
                value: part.to_owned(),
            })
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_owned(),
    })
}
