//! Property-based tests for ring VRF signatures

use proptest::prelude::*;
use ring_vrf::*;
use std::sync::OnceLock;

struct Fixture {
    srs: Srs,
    secret: SecretKey,
    ring: Ring,
    signature: Vec<u8>,
}

const SIGNER: usize = 2;

// Ring of six, signer at index 2 with seed ff..ff, input "foo" and aux "bar"
fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let srs = Srs::generate(4).unwrap();
        let secret = SecretKey::from_hex_seed(&"ff".repeat(32)).unwrap();
        let keys = (0..6u8)
            .map(|i| {
                if i as usize == SIGNER {
                    *secret.public()
                } else {
                    *SecretKey::from_seed(&[i; 32]).unwrap().public()
                }
            })
            .collect::<Vec<PublicKey>>();
        let ring = Ring::new(keys, 6).unwrap();
        let signature = sign(&secret, &ring, &srs, b"foo", b"bar", SIGNER)
            .unwrap()
            .to_bytes()
            .unwrap();
        Fixture {
            srs,
            secret,
            ring,
            signature,
        }
    })
}

#[test]
fn fixture_signature_verifies() {
    let f = fixture();
    let expected = f.secret.vrf_output(&VrfInput::new(b"foo"));
    assert_eq!(
        verify(&f.ring, &f.srs, b"foo", b"bar", &f.signature).unwrap(),
        Verification::Valid(expected)
    );
}

// Property test: any single byte change is rejected, never an error
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tampered_signature_rejected(
        index in 0usize..RingVrfSignature::encoded_len(3),
        mask in 1u8..=255
    ) {
        let f = fixture();
        let mut tampered = f.signature.clone();
        tampered[index] ^= mask;
        let result = verify(&f.ring, &f.srs, b"foo", b"bar", &tampered);
        prop_assert_eq!(result.unwrap(), Verification::Rejected);
    }
}

// Property test: arbitrary bytes never verify
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_bytes_rejected(sig in prop::collection::vec(any::<u8>(), 0..700)) {
        let f = fixture();
        let result = verify(&f.ring, &f.srs, b"foo", b"bar", &sig);
        prop_assert_eq!(result.unwrap(), Verification::Rejected);
    }
}

// Property test: the signature binds the input and aux data
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn other_messages_rejected(
        input in prop::collection::vec(any::<u8>(), 0..16),
        aux in prop::collection::vec(any::<u8>(), 0..16)
    ) {
        prop_assume!(input != b"foo" || aux != b"bar");
        let f = fixture();
        let result = verify(&f.ring, &f.srs, &input, &aux, &f.signature);
        prop_assert_eq!(result.unwrap(), Verification::Rejected);
    }
}

// Property test: the VRF output depends only on the secret and the input
proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn output_independent_of_ring(
        ring_size in 1usize..=16,
        seed in any::<u64>(),
        aux in prop::collection::vec(any::<u8>(), 0..8)
    ) {
        let f = fixture();
        let signer = (seed as usize) % ring_size;
        let keys = (0..ring_size)
            .map(|i| {
                if i == signer {
                    *f.secret.public()
                } else {
                    let mut s = seed.to_le_bytes().to_vec();
                    s.extend_from_slice(&(i as u64).to_le_bytes());
                    *SecretKey::from_seed(&s).unwrap().public()
                }
            })
            .collect::<Vec<PublicKey>>();
        let ring = Ring::new(keys, ring_size).unwrap();
        let signature = sign(&f.secret, &ring, &f.srs, b"foo", &aux, signer)
            .unwrap()
            .to_bytes()
            .unwrap();
        let result = verify(&ring, &f.srs, b"foo", &aux, &signature).unwrap();
        prop_assert_eq!(
            result,
            Verification::Valid(f.secret.vrf_output(&VrfInput::new(b"foo")))
        );
    }
}

// Property test: ring parsing reports errors without panicking
proptest! {
    #[test]
    fn ring_parsing_total(keys in prop::collection::vec("[0-9a-fz ]{0,70}", 1..5)) {
        let refs = keys.iter().map(String::as_str).collect::<Vec<&str>>();
        let n = refs.len();
        match Ring::from_hex(&refs, n) {
            Ok(ring) => prop_assert_eq!(ring.len(), n),
            Err(RingVrfError::Parse { index: Some(i), .. })
            | Err(RingVrfError::InvalidKey { index: i }) => prop_assert!(i < n),
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }
}

// Property test: SRS decoding reports errors without panicking
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn srs_decoding_total(bytes in prop::collection::vec(any::<u8>(), 0..1200)) {
        match Srs::from_bytes(&bytes) {
            Ok(srs) => prop_assert_eq!(srs.to_bytes(), bytes),
            Err(RingVrfError::Format { len }) => prop_assert_eq!(len, bytes.len()),
            Err(RingVrfError::CorruptData { .. }) => {}
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }
}
