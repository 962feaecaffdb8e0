//! Accounts and events shared by the tests that seed relays with data.

use nihao_primitives::account::PublicKey;
use nihao_primitives::event::{Event, Kind, Tag};

pub fn account(seed: u8) -> PublicKey {
    PublicKey::from([seed; 32])
}

pub fn event(author: PublicKey, kind: Kind, created_at: u64, tags: Vec<Tag>) -> Event {
    Event {
        id: format!("{created_at:064x}"),
        pubkey: author,
        created_at,
        kind,
        tags,
        content: String::new(),
        sig: "00".repeat(64),
    }
}
