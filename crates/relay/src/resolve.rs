//! Newest-wins resolution of replaceable documents across connected relays.

use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use nihao_primitives::account::PublicKey;
use nihao_primitives::event::{Event, Filter, Kind, Sourced};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::session::DocumentSource;

/// Ask every source for the newest `kind` document of `account` and keep the
/// one with the strictly greatest `created_at`.
///
/// Sources are queried concurrently. Whatever has arrived when `deadline`
/// elapses is returned; the remaining queries are dropped. Sources without a
/// match and failing sources simply contribute nothing.
pub async fn resolve<S: DocumentSource>(
    sources: &mut [S],
    account: PublicKey,
    kind: Kind,
    deadline: Duration,
) -> Option<Sourced<Event>> {
    let filter = Filter::latest(account, kind);
    let filter = &filter;
    let deadline = Instant::now() + deadline;

    let mut pending: FuturesUnordered<_> = sources
        .iter_mut()
        .map(|source| async move {
            let outcome = source.latest(filter).await;
            (source.address().clone(), outcome)
        })
        .collect();

    let mut best: Option<Sourced<Event>> = None;

    loop {
        let next = timeout_at(deadline, pending.next()).await;

        let (address, outcome) = match next {
            Ok(Some(response)) => response,
            Ok(None) => break,
            Err(_) => {
                debug!(%kind, outstanding = pending.len(), "Resolve deadline reached");
                break;
            }
        };

        match outcome {
            Ok(Some(event)) => {
                let newer = best
                    .as_ref()
                    .map_or(true, |current| event.created_at > current.value.created_at);

                debug!(%address, %kind, created_at = event.created_at, newer, "Relay answered");

                if newer {
                    best = Some(Sourced {
                        source: address,
                        value: event,
                    });
                }
            }
            Ok(None) => debug!(%address, %kind, "Relay holds no matching document"),
            Err(err) => debug!(%address, %kind, error = %err, "Relay query failed"),
        }
    }

    best
}

#[cfg(test)]
#[path = "tests/resolve.rs"]
mod tests;
