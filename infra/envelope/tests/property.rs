pub mod fixtures;

use fixtures::{HEADER_LEN, flip_bit, setup_codec};
use keyrot_envelope::{DecryptionFailure, Payload, decode_token, uniform_time_eq};
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_payload() -> impl Strategy<Value = Payload> {
    let leaf = prop_oneof![
        Just(Payload::Nil),
        any::<bool>().prop_map(Payload::Bool),
        any::<i64>().prop_map(Payload::Int),
        ((1u64 << 63)..=u64::MAX).prop_map(Payload::UInt),
        any::<f64>().prop_filter("NaN never compares equal", |f| !f.is_nan()).prop_map(Payload::Float),
        ".{0,40}".prop_map(Payload::String),
        vec(any::<u8>(), 0..64).prop_map(Payload::Bytes),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Payload::Array),
            vec((inner.clone(), inner), 0..4).prop_map(Payload::Map),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_arbitrary_payloads(payload in arb_payload(), always_compress in any::<bool>()) {
        let codec = setup_codec();
        let options = keyrot_envelope::EncryptOptions::default().always_compress(always_compress);

        let token = codec.encryptor.encrypt_with(&payload, options).unwrap();
        prop_assert_eq!(codec.decryptor.decrypt(&token).unwrap(), payload);
    }

    #[test]
    fn any_flipped_bit_after_the_key_id_is_detected(
        data in vec(any::<u8>(), 0..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let codec = setup_codec();
        let token = codec.encryptor.encrypt(&Payload::Bytes(data)).unwrap();
        let len = decode_token(&token).unwrap().len();
        let byte = HEADER_LEN + position.index(len - HEADER_LEN);

        let err = codec.decryptor.decrypt(&flip_bit(&token, byte, bit)).unwrap_err();
        prop_assert_eq!(err.decryption_failure(), Some(DecryptionFailure::SignatureMismatch));
    }

    #[test]
    fn uniform_time_eq_matches_slice_equality(a in vec(any::<u8>(), 0..48), b in vec(any::<u8>(), 0..48)) {
        prop_assert_eq!(uniform_time_eq(&a, &b), a == b);
        prop_assert!(uniform_time_eq(&a, &a.clone()));
    }
}
