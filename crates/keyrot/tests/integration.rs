use keyrot::prelude::*;
use keyrot::keystore::ManualClock;
use keyrot::{KeyStore, load_settings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn key_id(token: &str) -> Vec<u8> {
    let bytes = keyrot::envelope::decode_token(token).unwrap();
    bytes[1..].split(|&b| b == 0).next().unwrap().to_vec()
}

#[test]
fn round_trips_nested_payloads() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = RandomEncryption::open(tmp.path()).unwrap();

    let payload = Payload::Map(vec![
        (Payload::from("user"), Payload::from("ada")),
        (Payload::from("roles"), Payload::from(vec![Payload::from("admin"), Payload::from("ops")])),
        (Payload::from("remember"), Payload::from(true)),
        (Payload::from("avatar"), Payload::Nil),
    ]);

    let token = engine.encrypt(&payload).unwrap();
    assert_eq!(engine.decrypt(&token).unwrap(), payload);
}

#[test]
fn instances_share_keys_through_the_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let issuer = RandomEncryption::open(tmp.path()).unwrap();
    let verifier = RandomEncryption::open(tmp.path()).unwrap();

    let token = issuer.encrypt(&Payload::from(3)).unwrap();
    assert_eq!(verifier.decrypt(&token).unwrap(), Payload::from(3));

    let reply = verifier.encrypt(&Payload::from("ack")).unwrap();
    assert_eq!(key_id(&reply), key_id(&token));
    assert_eq!(issuer.decrypt(&reply).unwrap(), Payload::from("ack"));
}

#[test]
fn rejects_malformed_tokens() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = RandomEncryption::open(tmp.path()).unwrap();

    for token in ["", "BBBB", "\0spam", "AAAA", "not base64 at all!"] {
        let err = engine.decrypt(token).unwrap_err();
        assert!(err.is_decryption(), "{token:?} gave {err}");
    }

    let err = engine.decrypt("BBBB").unwrap_err();
    assert_eq!(err.decryption_failure(), Some(DecryptionFailure::UnknownFormat));
}

#[test]
fn tokens_expire_with_their_key() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = ManualClock::default();
    let store = KeyStore::builder().root(tmp.path()).clock(clock.clone()).build().unwrap();
    let engine = RandomEncryption::from_store(store);

    let token = engine.encrypt(&Payload::from("short lived")).unwrap();
    clock.advance(engine.duration());
    assert_eq!(engine.decrypt(&token).unwrap(), Payload::from("short lived"));

    clock.advance(Duration::from_secs(2 * 3600));
    let err = engine.decrypt(&token).unwrap_err();
    assert_eq!(err.decryption_failure(), Some(DecryptionFailure::KeyNotFound));
}

#[test]
fn zero_freshness_rotates_every_call() {
    let tmp = tempfile::tempdir().unwrap();
    let config = KeyStoreConfig { freshness: Duration::ZERO, ..KeyStoreConfig::default() };
    let engine = RandomEncryption::with_config(tmp.path(), config).unwrap();

    let first = engine.encrypt(&Payload::from(1)).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    let second = engine.encrypt(&Payload::from(2)).unwrap();

    assert_ne!(key_id(&first), key_id(&second));
    assert_eq!(engine.decrypt(&first).unwrap(), Payload::from(1));
    assert_eq!(engine.decrypt(&second).unwrap(), Payload::from(2));
}

#[test]
fn opens_from_a_settings_file() {
    let tmp = tempfile::tempdir().unwrap();
    let keys = tmp.path().join("keys");
    let path = tmp.path().join("keyrot.toml");
    std::fs::write(
        &path,
        format!("dir = {:?}\nlength = 64\nfreshness = 60\nmax_age = 600\n", keys.display().to_string()),
    )
    .unwrap();

    let settings = load_settings(Some(&path)).unwrap();
    let engine = RandomEncryption::from_settings(&settings).unwrap();

    assert_eq!(engine.config().length, 64);
    assert_eq!(engine.duration(), Duration::from_secs(540));
    assert!(keys.is_dir());

    let token = engine.encrypt(&Payload::from("configured")).unwrap();
    assert_eq!(engine.decrypt(&token).unwrap(), Payload::from("configured"));
}

#[test]
fn invalid_key_length_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut settings = Settings::new(tmp.path());
    settings.length = 7;

    let err = RandomEncryption::from_settings(&settings).unwrap_err();
    assert!(matches!(err, KeyStoreError::InvalidConfiguration { .. }));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    csrf: String,
    scopes: Vec<String>,
}

#[test]
fn round_trips_serde_values() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = RandomEncryption::open(tmp.path()).unwrap();
    let session = Session { user_id: 7, csrf: "x9f".into(), scopes: vec!["read".into()] };

    let token = engine.encrypt_value(&session).unwrap();
    assert_eq!(engine.decrypt_value::<Session>(&token).unwrap(), session);
    assert!(engine.decrypt(&token).unwrap().get("csrf").is_some());
}

#[test]
fn clones_share_the_current_key() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = RandomEncryption::open(tmp.path()).unwrap();
    let clone = engine.clone();

    let a = engine.encrypt_with(&Payload::from("a"), EncryptOptions::default()).unwrap();
    let b = clone.encrypt(&Payload::from("b")).unwrap();
    assert_eq!(key_id(&a), key_id(&b));
    assert_eq!(clone.reader().cached_keys(), 0);
    assert_eq!(clone.decrypt(&a).unwrap(), Payload::from("a"));
    assert_eq!(engine.reader().cached_keys(), 1);
}
