use proptest::prelude::*;

use super::*;

#[test]
fn test_normalize_table() {
    let cases = [
        ("wss://relay.damus.io", Some("wss://relay.damus.io")),
        ("wss://relay.damus.io/", Some("wss://relay.damus.io")),
        ("wss://relay.damus.io///", Some("wss://relay.damus.io")),
        ("  wss://nos.lol  ", Some("wss://nos.lol")),
        ("https://example.com", None),
        ("", None),
        ("ws://localhost:8080", Some("ws://localhost:8080")),
    ];

    for (input, expected) in cases {
        let got = PeerAddress::normalize(input);
        assert_eq!(
            got.as_ref().map(PeerAddress::as_str),
            expected,
            "normalize({input:?})"
        );
    }
}

#[test]
fn test_trailing_slash_and_whitespace_collapse() {
    let a = PeerAddress::normalize("wss://nos.lol").unwrap();
    let b = PeerAddress::normalize(" wss://nos.lol/ ").unwrap();

    assert_eq!(a, b);
}

#[test]
fn test_document_url_rewrites_scheme() {
    let secure: PeerAddress = "wss://relay.damus.io".parse().unwrap();
    let plain: PeerAddress = "ws://127.0.0.1:7777/path".parse().unwrap();

    assert_eq!(secure.document_url(), "https://relay.damus.io");
    assert_eq!(plain.document_url(), "http://127.0.0.1:7777/path");
}

#[test]
fn test_from_str_rejects_unknown_transport() {
    let err = "http://relay.example".parse::<PeerAddress>().unwrap_err();

    assert_eq!(
        err,
        AddressError::UnsupportedTransport("http://relay.example".to_owned())
    );
}

#[test]
fn test_deserialize_normalizes() {
    let address: PeerAddress = serde_json::from_str(r#""wss://nos.lol/""#).unwrap();
    assert_eq!(address.as_str(), "wss://nos.lol");

    let _ignored = serde_json::from_str::<PeerAddress>(r#""nos.lol""#).unwrap_err();
}

proptest! {
    #[test]
    fn normalize_is_idempotent(host in "[a-z0-9.]{0,16}", pad in " {0,3}", slashes in "/{0,3}") {
        let raw = format!("{pad}wss://{host}{slashes}{pad}");

        if let Some(once) = PeerAddress::normalize(&raw) {
            let twice = PeerAddress::normalize(once.as_str());
            prop_assert_eq!(Some(once), twice);
        }
    }
}
