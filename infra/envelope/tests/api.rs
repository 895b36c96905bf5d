pub mod fixtures;

use fixtures::{HEADER_LEN, flip_bit, key_id, setup_codec, setup_codec_with};
use keyrot_envelope::{
    DecryptionFailure, Decryptor, EncryptOptions, Encryptor, EnvelopeError, Payload,
    SIGNATURE_LEN, decode_token, encode_token,
};
use keyrot_keystore::{KeyStore, ManualClock};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn failure(result: Result<Payload, EnvelopeError>) -> DecryptionFailure {
    result.expect_err("decryption should fail").decryption_failure().expect("decryption error")
}

#[test]
fn roundtrip_nested_payload() {
    let codec = setup_codec();
    let payload = Payload::Map(vec![
        (Payload::from("user"), Payload::from("ada")),
        (Payload::from("roles"), Payload::Array(vec![Payload::from("admin"), Payload::from("dev")])),
        (Payload::from("ttl"), Payload::from(3600)),
        (Payload::from("score"), Payload::Float(-0.25)),
        (Payload::from("avatar"), Payload::from(b"\x89PNG".as_slice())),
        (Payload::from("deleted"), Payload::Nil),
        (Payload::from("big"), Payload::UInt(u64::MAX)),
    ]);

    let token = codec.encryptor.encrypt(&payload).unwrap();
    assert_eq!(codec.decryptor.decrypt(&token).unwrap(), payload);
}

#[test]
fn tokens_are_url_safe_and_unpadded() {
    let codec = setup_codec();
    for n in 0..8 {
        let token = codec.encryptor.encrypt(&Payload::from("x".repeat(n))).unwrap();
        assert!(
            token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
            "unexpected character in {token}"
        );
    }
}

#[test]
fn padded_tokens_are_accepted() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::Int(3)).unwrap();
    let padded = format!("{token}{}", "=".repeat((4 - token.len() % 4) % 4));

    assert_eq!(codec.decryptor.decrypt(&padded).unwrap(), Payload::Int(3));
}

#[test]
fn small_scalar_token_has_fixed_overhead() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::Int(3)).unwrap();

    assert!((70..=90).contains(&token.len()), "token length {}", token.len());
}

#[test]
fn compressible_payload_yields_short_token() {
    let codec = setup_codec();
    let zeros = codec.encryptor.encrypt(&Payload::from("0".repeat(4000))).unwrap();

    let mut noise = vec![0u8; 4000];
    getrandom::fill(&mut noise).unwrap();
    let random = codec.encryptor.encrypt(&Payload::Bytes(noise)).unwrap();

    assert!(zeros.len() < 200, "token length {}", zeros.len());
    assert!(random.len() > 4000);
    assert_eq!(codec.decryptor.decrypt(&zeros).unwrap(), Payload::from("0".repeat(4000)));
}

#[test]
fn always_compress_applies_even_when_larger() {
    let codec = setup_codec();
    let plain = codec.encryptor.encrypt(&Payload::Int(3)).unwrap();
    let forced = codec
        .encryptor
        .encrypt_with(&Payload::Int(3), EncryptOptions::default().always_compress(true))
        .unwrap();

    assert!(forced.len() > plain.len());
    assert_eq!(codec.decryptor.decrypt(&forced).unwrap(), Payload::Int(3));
}

#[test]
fn encryption_is_not_deterministic() {
    let codec = setup_codec();
    let a = codec.encryptor.encrypt(&Payload::from("same")).unwrap();
    let b = codec.encryptor.encrypt(&Payload::from("same")).unwrap();

    assert_ne!(a, b);
    assert_eq!(key_id(&a), key_id(&b));
}

#[test]
fn malformed_text_is_a_decryption_error() {
    let codec = setup_codec();

    assert_eq!(failure(codec.decryptor.decrypt("BBBB")), DecryptionFailure::UnknownFormat);
    assert_eq!(failure(codec.decryptor.decrypt("")), DecryptionFailure::InvalidFormat);
    assert_eq!(failure(codec.decryptor.decrypt("B")), DecryptionFailure::InvalidFormat);
    assert_eq!(failure(codec.decryptor.decrypt("not base64!")), DecryptionFailure::InvalidFormat);
    assert_eq!(
        failure(codec.decryptor.decrypt(&encode_token(b"\x00spam"))),
        DecryptionFailure::KeyIdMissing
    );
    assert_eq!(
        failure(codec.decryptor.decrypt(&encode_token(b"\x00nokey\x00"))),
        DecryptionFailure::KeyNotFound
    );
    assert_eq!(
        failure(codec.decryptor.decrypt(&encode_token(b"\x00../etc/passwd\x00"))),
        DecryptionFailure::KeyNotFound
    );

    let mut oversized = vec![0u8];
    oversized.extend_from_slice(&[b'a'; 300]);
    oversized.push(0);
    oversized.extend_from_slice(&[0u8; 60]);
    let err = codec.decryptor.decrypt(&encode_token(&oversized)).unwrap_err();
    assert!(err.is_decryption(), "oversized key id surfaced as {err}");
    assert_eq!(err.decryption_failure(), Some(DecryptionFailure::KeyNotFound));
    assert!(!err.to_string().contains(&codec.dir.path().display().to_string()));
}

#[test]
fn tampered_ciphertext_fails_signature_check() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::from("payload")).unwrap();
    let last = decode_token(&token).unwrap().len() - 1;

    let tampered = flip_bit(&token, last, 4);
    assert_eq!(failure(codec.decryptor.decrypt(&tampered)), DecryptionFailure::SignatureMismatch);
}

#[test]
fn tampered_signature_or_iv_fails_signature_check() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::from("payload")).unwrap();

    for byte in [HEADER_LEN, HEADER_LEN + SIGNATURE_LEN - 1, HEADER_LEN + SIGNATURE_LEN] {
        let tampered = flip_bit(&token, byte, 0);
        assert_eq!(
            failure(codec.decryptor.decrypt(&tampered)),
            DecryptionFailure::SignatureMismatch,
            "byte {byte}"
        );
    }
}

#[test]
fn truncated_envelope_fails_signature_check() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::from("payload")).unwrap();
    let bytes = decode_token(&token).unwrap();

    for len in [HEADER_LEN, HEADER_LEN + 10, HEADER_LEN + SIGNATURE_LEN, bytes.len() - 1] {
        let truncated = encode_token(&bytes[..len]);
        assert_eq!(
            failure(codec.decryptor.decrypt(&truncated)),
            DecryptionFailure::SignatureMismatch,
            "length {len}"
        );
    }
}

#[test]
fn tampered_marker_is_unknown_format() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::Nil).unwrap();

    assert_eq!(failure(codec.decryptor.decrypt(&flip_bit(&token, 0, 7))), DecryptionFailure::UnknownFormat);
}

#[test]
fn expired_key_is_reported_as_not_found() {
    let clock = ManualClock::default();
    let codec = setup_codec_with(|builder| builder.clock(clock.clone()));
    let token = codec.encryptor.encrypt(&Payload::from("short-lived")).unwrap();
    assert!(codec.decryptor.decrypt(&token).is_ok());

    clock.advance(Duration::from_secs(3601));
    let err = codec.decryptor.decrypt(&token).unwrap_err();

    assert_eq!(err.decryption_failure(), Some(DecryptionFailure::KeyNotFound));
    assert!(err.to_string().contains("key not found or expired"));
}

#[test]
fn tokens_survive_key_rotation() {
    let clock = ManualClock::default();
    let codec = setup_codec_with(|builder| builder.clock(clock.clone()));
    let before = codec.encryptor.encrypt(&Payload::from(1)).unwrap();

    clock.advance(Duration::from_secs(301));
    let after = codec.encryptor.encrypt(&Payload::from(2)).unwrap();

    assert_ne!(key_id(&before), key_id(&after), "key should have rotated");
    assert_eq!(codec.decryptor.decrypt(&before).unwrap(), Payload::Int(1));
    assert_eq!(codec.decryptor.decrypt(&after).unwrap(), Payload::Int(2));
}

#[test]
fn tokens_cross_instances_sharing_a_directory() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::from("shared")).unwrap();

    let other = Decryptor::new(KeyStore::builder().root(codec.dir.path()).reader().unwrap());
    assert_eq!(other.decrypt(&token).unwrap(), Payload::from("shared"));
}

#[test]
fn larger_cipher_keys_roundtrip() {
    for length in [56, 64] {
        let codec = setup_codec_with(|builder| builder.length(length));
        let token = codec.encryptor.encrypt(&Payload::from("aes")).unwrap();
        assert_eq!(codec.decryptor.decrypt(&token).unwrap(), Payload::from("aes"));
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    admin: bool,
    expires: u64,
}

#[test]
fn typed_values_roundtrip() {
    let codec = setup_codec();
    let session = Session { user: "ada".to_owned(), admin: true, expires: 1_700_000_000 };

    let token = codec.encryptor.encrypt_value(&session).unwrap();
    let restored: Session = codec.decryptor.decrypt_value(&token).unwrap();
    assert_eq!(restored, session);

    // Struct fields travel as a named map.
    let payload = codec.decryptor.decrypt(&token).unwrap();
    assert_eq!(payload.get("user"), Some(&Payload::from("ada")));
}

#[test]
fn typed_value_of_wrong_shape_is_invalid_payload() {
    let codec = setup_codec();
    let token = codec.encryptor.encrypt(&Payload::from("not a session")).unwrap();

    let err = codec.decryptor.decrypt_value::<Session>(&token).unwrap_err();
    assert_eq!(err.decryption_failure(), Some(DecryptionFailure::InvalidPayload));
}

#[test]
fn packed_bytes_roundtrip() {
    let codec = setup_codec();
    let packed = Payload::from("raw").to_packed().unwrap();

    let token = codec.encryptor.seal_packed(&packed).unwrap();
    assert_eq!(codec.decryptor.open_packed(&token).unwrap().as_slice(), packed.as_slice());
}

#[test]
fn encryptor_options_apply_to_every_call() {
    let dir = tempfile::tempdir().unwrap();
    let store = KeyStore::builder().root(dir.path()).build().unwrap();
    let options = EncryptOptions::default().always_compress(true).compress_level(9);
    let encryptor = Encryptor::with_options(store.writer, options);

    assert_eq!(encryptor.options(), options);
    let token = encryptor.encrypt(&Payload::Int(3)).unwrap();
    assert_eq!(Decryptor::new(store.reader).decrypt(&token).unwrap(), Payload::Int(3));
}
