mod common;
mod fixtures;

use std::time::Duration;

use common::{closed_address, MockRelay};
use fixtures::{account, event};
use nihao_primitives::event::Kind;
use nihao_relay::{RelayPool, WsConnector};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_newest_version_wins_over_websocket() {
    let me = account(1);
    let stale = MockRelay::with_events(vec![event(me, Kind::PROFILE, 100, Vec::new())])
        .spawn()
        .await;
    let fresh = MockRelay {
        reply_delay: Duration::from_millis(200),
        ..MockRelay::with_events(vec![event(me, Kind::PROFILE, 200, Vec::new())])
    }
    .spawn()
    .await;

    let connector = WsConnector::new(CONNECT_TIMEOUT);
    let mut pool = RelayPool::connect_all(&connector, &[stale, fresh.clone()]).await;

    let found = pool.resolve(me, Kind::PROFILE, DEADLINE).await.unwrap();

    assert_eq!(found.source, fresh);
    assert_eq!(found.value.created_at, 200);

    pool.close_all().await;
}

#[tokio::test]
async fn test_pool_serves_several_kinds_and_skips_dead_relays() {
    let me = account(1);
    let relay = MockRelay::with_events(vec![
        event(me, Kind::PROFILE, 10, Vec::new()),
        event(me, Kind::FOLLOW_LIST, 20, Vec::new()),
    ])
    .spawn()
    .await;
    let dead = closed_address().await;

    let connector = WsConnector::new(CONNECT_TIMEOUT);
    let mut pool = RelayPool::connect_all(&connector, &[dead, relay]).await;
    assert_eq!(pool.len(), 1);

    let profile = pool.resolve(me, Kind::PROFILE, DEADLINE).await;
    let follows = pool.resolve(me, Kind::FOLLOW_LIST, DEADLINE).await;
    let relays = pool.resolve(me, Kind::RELAY_LIST, DEADLINE).await;

    assert_eq!(profile.map(|found| found.value.created_at), Some(10));
    assert_eq!(follows.map(|found| found.value.created_at), Some(20));
    assert!(relays.is_none());

    pool.close_all().await;
}

#[tokio::test]
async fn test_slow_relay_is_cut_off_by_deadline() {
    let me = account(1);
    let slow = MockRelay {
        reply_delay: Duration::from_secs(30),
        ..MockRelay::with_events(vec![event(me, Kind::PROFILE, 500, Vec::new())])
    }
    .spawn()
    .await;
    let fast = MockRelay::with_events(vec![event(me, Kind::PROFILE, 5, Vec::new())])
        .spawn()
        .await;

    let connector = WsConnector::new(CONNECT_TIMEOUT);
    let mut pool = RelayPool::connect_all(&connector, &[slow, fast.clone()]).await;

    let found = pool
        .resolve(me, Kind::PROFILE, Duration::from_millis(500))
        .await
        .unwrap();

    assert_eq!(found.source, fast);
    assert_eq!(found.value.created_at, 5);
}
