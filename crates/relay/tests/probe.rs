mod common;

use common::{closed_address, MockRelay};
use nihao_primitives::capability::{CapabilityDocument, Limitation};
use nihao_relay::{Probe, Prober, RelayConfig};

fn prober() -> Prober {
    let config = RelayConfig {
        reliable: Vec::new(),
        ..RelayConfig::default()
    };

    Prober::new(&config)
}

#[tokio::test]
async fn test_documented_relay() {
    let address = MockRelay::with_events(Vec::new()).spawn().await;

    let record = prober().probe(&address).await;

    assert!(record.reachable);
    assert!(record.has_document());
    assert_eq!(record.summary().as_deref(), Some("mock"));
    assert!(record.score >= 0.65, "score {}", record.score);
    assert!(record.issues.is_empty() || record.issues[0].starts_with("slow"));
}

#[tokio::test]
async fn test_relay_without_document_is_still_reachable() {
    let relay = MockRelay {
        document: None,
        ..MockRelay::default()
    };
    let address = relay.spawn().await;

    let record = prober().probe(&address).await;

    assert!(record.reachable);
    assert!(!record.has_document());
    assert!(record.issues.contains(&"no capability document".to_owned()));
}

#[tokio::test]
async fn test_limitations_are_reported() {
    let relay = MockRelay {
        document: Some(CapabilityDocument {
            limitation: Some(Limitation {
                auth_required: true,
                payment_required: true,
                ..Limitation::default()
            }),
            ..CapabilityDocument::default()
        }),
        ..MockRelay::default()
    };
    let address = relay.spawn().await;

    let record = prober().probe(&address).await;

    assert!(record.auth_required);
    assert!(record.payment_required);
    assert!(record.issues.contains(&"auth required".to_owned()));
    assert!(record.issues.contains(&"payment required".to_owned()));
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let address = closed_address().await;

    let record = prober().probe(&address).await;

    assert!(!record.reachable);
    assert_eq!(record.score, 0.0);
    assert_eq!(record.issues, vec!["unreachable".to_owned()]);
}

#[tokio::test]
async fn test_score_all_keeps_input_order() {
    let up = MockRelay::with_events(Vec::new()).spawn().await;
    let down = closed_address().await;

    let records = prober().score_all(&[down.clone(), up.clone()]).await;

    assert_eq!(records[0].address, down);
    assert_eq!(records[1].address, up);
    assert!(!records[0].reachable);
    assert!(records[1].reachable);
}
