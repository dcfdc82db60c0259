#![allow(non_snake_case)]
use ring_vrf::proofs::OneOfManyProofs;
use ring_vrf::*;

use rand::rngs::OsRng;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

const RING_SIZE: usize = 1000;

fn setup() -> (Srs, Vec<SecretKey>, Ring) {
    let srs = Srs::generate(10).unwrap(); // Rings of up to 1024 members
    let secrets = (0..RING_SIZE)
        .map(|_| SecretKey::random(&mut OsRng))
        .collect::<Vec<SecretKey>>();
    let ring = Ring::new(secrets.iter().map(|s| *s.public()).collect(), RING_SIZE).unwrap();
    (srs, secrets, ring)
}

pub fn ring_vrf(c: &mut Criterion) {
    let (srs, secrets, ring) = setup();
    let l: usize = 1; // Index within the ring, of the signer
    let commitment = aggregate(&ring, &srs).unwrap();

    c.bench_function("Aggregate ring of 1000", |b| {
        b.iter(|| aggregate(black_box(&ring), black_box(&srs)).unwrap())
    });

    c.bench_function("Sign in ring of 1000", |b| {
        b.iter(|| {
            sign_with_commitment(
                &secrets[l],
                black_box(&ring),
                black_box(&srs),
                &commitment,
                b"foo",
                b"bar",
                l,
            )
            .unwrap()
        })
    });

    let signature = sign_with_commitment(&secrets[l], &ring, &srs, &commitment, b"foo", b"bar", l)
        .unwrap()
        .to_bytes()
        .unwrap();
    c.bench_function("Verify in ring of 1000", |b| {
        b.iter(|| {
            assert!(verify_with_commitment(
                black_box(&ring),
                black_box(&srs),
                &commitment,
                b"foo",
                b"bar",
                black_box(&signature)
            )
            .unwrap()
            .is_valid());
        })
    });
}

pub fn batch_verify_membership(c: &mut Criterion) {
    let l: usize = 1; // Index within the set, of the prover's commitment
    let v = Scalar::random(&mut OsRng); // Value of the prover's commitment
    let r = Scalar::random(&mut OsRng); // Blinding factor for prover's commitment

    let gens = Srs::generate(12).unwrap().proof_gens(12).unwrap(); // Set generators
    let C_l = gens.commit(&v, &r); // Prover's commitment

    // Build a random set containing the prover's commitment at index `l`
    let mut set = (1..gens.max_set_size())
        .map(|_| RistrettoPoint::random(&mut OsRng))
        .collect::<Vec<RistrettoPoint>>();
    set.insert(l, C_l);

    // Compute new commitment, to same value as `C_l`
    let r_new = Scalar::random(&mut OsRng);
    let C_new = gens.commit(&v, &r_new); // New commitment to same value

    let prover_transcript = Transcript::new(b"bench example");
    let mut proofs = Vec::new();
    let mut offsets = Vec::new();
    for _ in 0..100 {
        let mut tscpt = prover_transcript.clone();
        proofs.push(
            set.iter()
                .prove_with_offset(&gens, &mut tscpt, l, &(r - r_new), &C_new)
                .unwrap(),
        );
        offsets.push(C_new);
    }

    let verifier_transcript = Transcript::new(b"bench example");
    c.bench_function("Batch verify 100 membership proofs", |b| {
        b.iter(|| {
            let mut t = verifier_transcript.clone();
            assert!(set
                .iter()
                .verify_batch_with_offsets(
                    black_box(&gens),
                    black_box(&mut t),
                    black_box(&proofs[..]),
                    black_box(offsets.as_slice())
                )
                .is_ok());
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = ring_vrf, batch_verify_membership
}
criterion_main!(benches);
