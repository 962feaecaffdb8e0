//! Relay intelligence for nihao: classification, probing, scoring, discovery
//! and selection of relays, plus newest-wins resolution of replaceable
//! documents across an open relay pool.

pub mod backup;
pub mod check;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod pool;
pub mod probe;
pub mod resolve;
pub mod score;
pub mod select;
pub mod session;

#[cfg(test)]
#[path = "tests/mocks.rs"]
mod mocks;

pub use classify::Classifier;
pub use config::RelayConfig;
pub use discovery::{Discovery, DiscoveryTally};
pub use pool::RelayPool;
pub use probe::{Probe, Prober};
pub use resolve::resolve;
pub use score::Scorer;
pub use select::Selector;
pub use session::{Connector, DocumentSource, RelaySession, WsConnector};
