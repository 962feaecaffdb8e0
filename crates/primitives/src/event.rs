//! Protocol events and subscription filters.
//!
//! Events are carried as received; signatures are kept for export but never
//! checked here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::PublicKey;
use crate::address::PeerAddress;

/// Seconds since the unix epoch, as stamped by the event author.
pub type Timestamp = u64;

/// Event kind number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub u16);

impl Kind {
    pub const PROFILE: Self = Self(0);
    pub const TEXT_NOTE: Self = Self(1);
    pub const FOLLOW_LIST: Self = Self(3);
    pub const RELAY_LIST: Self = Self(10_002);
    pub const NUTZAP_INFO: Self = Self(10_019);
    pub const DM_RELAY_LIST: Self = Self(10_050);
    pub const WALLET: Self = Self(17_375);
    pub const WALLET_OLD: Self = Self(37_375);

    /// Only the newest event per author is canonical for these kinds.
    #[must_use]
    pub const fn is_replaceable(self) -> bool {
        matches!(self.0, 0 | 3 | 10_000..=19_999)
    }

    /// Replaceable per author and `d` tag.
    #[must_use]
    pub const fn is_parameterized_replaceable(self) -> bool {
        matches!(self.0, 30_000..=39_999)
    }

    /// Human readable label used in exports.
    #[must_use]
    pub fn label(self) -> String {
        let known = match self {
            Self::PROFILE => "profile",
            Self::FOLLOW_LIST => "follow_list",
            Self::RELAY_LIST => "relay_list",
            Self::DM_RELAY_LIST => "dm_relay_list",
            Self::NUTZAP_INFO => "nutzap_info",
            Self::WALLET => "wallet",
            Self::WALLET_OLD => "wallet_old",
            Self(other) => return format!("kind_{other}"),
        };

        known.to_owned()
    }
}

impl From<u16> for Kind {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub type Tag = Vec<String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: PublicKey,
    pub created_at: Timestamp,
    pub kind: Kind,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub content: String,
    pub sig: String,
}

impl Event {
    /// Tags whose first element equals `name`, with at least one value.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [String]> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.len() >= 2 && tag.first().is_some_and(|n| n == name))
            .map(Vec::as_slice)
    }

    /// First values of every tag called `name`.
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags_named(name).filter_map(|tag| tag.get(1)).map(String::as_str)
    }

    /// Relay entries of a relay-list event (`r` tags), in tag order.
    #[must_use]
    pub fn relay_list(&self) -> Vec<RelayListEntry> {
        self.tags_named("r")
            .filter_map(|tag| {
                let url = tag.get(1)?.clone();
                let marker = match tag.get(2).map(String::as_str) {
                    Some("read") => RelayMarker::Read,
                    Some("write") => RelayMarker::Write,
                    _ => RelayMarker::Both,
                };
                let explicit = tag.len() >= 3;

                Some(RelayListEntry {
                    url,
                    marker,
                    explicit,
                })
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMarker {
    Read,
    Write,
    Both,
}

impl RelayMarker {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Both => "read+write",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayListEntry {
    /// Raw url as written by the author, not normalized.
    pub url: String,
    pub marker: RelayMarker,
    /// Whether the tag carried a third element at all.
    pub explicit: bool,
}

/// Subscription filter sent with a `REQ`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<PublicKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<Kind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    /// Latest event of `kind` authored by `author`.
    #[must_use]
    pub fn latest(author: PublicKey, kind: Kind) -> Self {
        Self {
            authors: vec![author],
            kinds: vec![kind],
            limit: Some(1),
        }
    }

    /// Whether `event` satisfies the author and kind constraints. The limit is
    /// a hint to the relay and is not checked.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        (self.authors.is_empty() || self.authors.contains(&event.pubkey))
            && (self.kinds.is_empty() || self.kinds.contains(&event.kind))
    }
}

/// A document returned by a specific relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    pub source: PeerAddress,
    pub value: T,
}
