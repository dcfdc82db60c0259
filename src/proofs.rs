//! One-of-many membership proofs.
//!
//! A prover convinces a verifier that it knows the index `l` of a commitment
//! within a set of Pedersen commitments, and a blinding factor `r` such that
//! `C_l - O = r*G` for a public offset `O`, without revealing `l` or `r`.
//! Ring VRF signatures use the set of ring public keys and the signer's key
//! commitment as the offset.
//!
//! See [One-out-of-Many Proofs](https://eprint.iacr.org/2014/764) and
//! [Lelantus](https://eprint.iacr.org/2019/373) for the batch verification
//! strategy.
#![allow(non_snake_case)]
use crate::errors::{ProofError, ProofResult};
use crate::gray_code::{flipped_bit, gray_code};
use crate::transcript::TranscriptProtocol;
use core::iter::{self, Iterator};
use core::ops::Mul;
use core::slice;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use merlin::Transcript;
use polynomials::Polynomial;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest proof domain, in bits.
pub const MAX_PROOF_BITS: usize = 32;

/// A collection of generator points used to compute membership proofs over
/// sets of `2^n_bits` commitments. Instances are handed out by
/// [`Srs::proof_gens`](crate::srs::Srs::proof_gens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofGens {
    pub n_bits: usize,
    G: RistrettoPoint,
    H: Vec<RistrettoPoint>,
}

/// A bit commitment proof. This is used as part of a [`OneOfManyProof`] and
/// not meant for use on its own. A zero knowledge proof that the prover knows
/// the openings of commitments to a sequence of bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BitProof {
    pub(crate) A: RistrettoPoint,
    pub(crate) C: RistrettoPoint,
    pub(crate) D: RistrettoPoint,
    pub(crate) f1_j: Vec<Scalar>,
    pub(crate) z_A: Scalar,
    pub(crate) z_C: Scalar,
}

/// A zero knowledge proof of membership in a set. A prover can convince a
/// verifier that he knows the index of a commitment within a set of
/// commitments, and the opening of that commitment,
/// without revealing any information about the commitment or its location
/// within the set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OneOfManyProof {
    pub(crate) B: RistrettoPoint,
    pub(crate) bit_proof: BitProof,
    pub(crate) G_k: Vec<RistrettoPoint>,
    pub(crate) z: Scalar,
}

impl OneOfManyProof {
    /// The number of index bits this proof commits to.
    pub fn n_bits(&self) -> usize {
        self.G_k.len()
    }
}

impl ProofGens {
    /// Assemble proof generators from a blinding generator `G` and `2*n_bits`
    /// bit commitment generators `H`.
    pub(crate) fn from_generators(
        n_bits: usize,
        G: RistrettoPoint,
        H: Vec<RistrettoPoint>,
    ) -> ProofResult<ProofGens> {
        if n_bits <= 1 {
            return Err(ProofError::SetIsTooSmall);
        }
        if n_bits > MAX_PROOF_BITS {
            return Err(ProofError::SetIsTooLarge);
        }
        if H.len() != 2 * n_bits {
            return Err(ProofError::InvalidProofSize);
        }
        Ok(ProofGens { n_bits, G, H })
    }

    /// Returns the exact set size proofs and verifications operate on. For
    /// example, a 10 bit proof covers a set of `2^10 = 1024` members.
    pub fn max_set_size(&self) -> usize {
        1usize << self.n_bits
    }

    /// The blinding generator.
    pub fn blinding(&self) -> &RistrettoPoint {
        &self.G
    }

    /// Create a pedersen commitment, with value `v` and blinding factor `r`.
    pub fn commit(&self, v: &Scalar, r: &Scalar) -> RistrettoPoint {
        v * self.H[0] + r * self.G
    }

    /// Commit to the bits in `l`, and generate the corresponding proof.
    /// Note, `l` must be within the supported set size, eg, for an `n` bit
    /// proof, `l` mus reside within the range: 0 <= `l` < 2^`n`.
    ///
    /// This proof uses a [`merlin`] transcript to generate a challenge
    /// scalar for use as a non-interactive proof protocol.
    ///
    /// This function returns the bit commitment, `B`, its assosciated
    /// [`BitProof`], and the challenge scalar `x`.
    ///
    /// ```
    /// # use rand::rngs::OsRng;
    /// # use ring_vrf::srs::Srs;
    /// # use curve25519_dalek::scalar::Scalar;
    /// # use merlin::Transcript;
    /// let gens = Srs::generate(5).unwrap().proof_gens(5).unwrap();
    /// let l = 7; // Some index within the range 0 <= `l` < 2^5
    ///
    /// let a_j = (0..gens.n_bits)
    ///     .map(|_| Scalar::random(&mut OsRng))
    ///     .collect::<Vec<Scalar>>();
    ///
    /// let mut t = Transcript::new(b"doctest example");
    /// let (B, proof, x) = gens.commit_bits(&mut t.clone(), l, &a_j).unwrap();
    /// assert_eq!(gens.verify_bits(&mut t, &B, &proof).unwrap(), x);
    /// ```
    pub fn commit_bits(
        &self,
        transcript: &mut Transcript,
        l: usize,
        a_j: &[Scalar],
    ) -> ProofResult<(RistrettoPoint, BitProof, Scalar)> {
        if l >= self.max_set_size() {
            return Err(ProofError::IndexOutOfBounds);
        }
        if a_j.len() != self.n_bits {
            return Err(ProofError::InvalidProofSize);
        }

        transcript.bit_proof_domain_sep(self.n_bits as u64);

        // The prover rekeys the transcript RNG with its witness (`l`).
        let mut rng = {
            let builder = transcript
                .build_rng()
                .rekey_with_witness_bytes(b"l", Scalar::from(l as u64).as_bytes());

            use rand::thread_rng;
            builder.finalize(&mut thread_rng())
        };

        let b_j_i = (0..2)
            .map(|i| {
                (0..self.n_bits)
                    .map(|j| Scalar::from(delta(bit(l, j), i) as u32))
                    .collect()
            })
            .collect::<Vec<Vec<Scalar>>>();

        let r_A = Scalar::random(&mut rng);
        let r_B = Scalar::random(&mut rng);
        let r_C = Scalar::random(&mut rng);
        let r_D = Scalar::random(&mut rng);
        let a_j_i = iter::once(a_j.to_vec())
            .chain(iter::once(a_j.iter().map(|a| -a).collect()))
            .collect::<Vec<Vec<Scalar>>>();
        let A = a_j_i.iter().flatten().commit(self, &r_A)?;
        let B = b_j_i.iter().flatten().commit(self, &r_B)?;
        let C = a_j_i
            .iter()
            .flatten()
            .zip(b_j_i.iter().flatten())
            .map(|(a, b)| a * (Scalar::one() - Scalar::from(2u32) * b))
            .commit(self, &r_C)?;
        let D = a_j_i.iter().flatten().map(|a| -a * a).commit(self, &r_D)?;

        transcript.validate_and_append_point(b"A", &A.compress())?;
        transcript.validate_and_append_point(b"B", &B.compress())?;
        transcript.validate_and_append_point(b"C", &C.compress())?;
        transcript.validate_and_append_point(b"D", &D.compress())?;

        let x = transcript.challenge_scalar(b"bit-proof-challenge");

        let f1_j = a_j_i[1]
            .iter()
            .zip(b_j_i[1].iter())
            .map(|(a, b)| b * x + a)
            .collect();
        let z_A = r_B * x + r_A;
        let z_C = r_C * x + r_D;

        for f in &f1_j {
            transcript.append_scalar(b"f1_j", f);
        }
        transcript.append_scalar(b"z_A", &z_A);
        transcript.append_scalar(b"z_C", &z_C);

        Ok((
            B,
            BitProof {
                A,
                C,
                D,
                f1_j,
                z_A,
                z_C,
            },
            x,
        ))
    }

    /// Verify a bit commitment proof, returning its challenge scalar.
    pub fn verify_bits(
        &self,
        transcript: &mut Transcript,
        B: &RistrettoPoint,
        proof: &BitProof,
    ) -> ProofResult<Scalar> {
        transcript.bit_proof_domain_sep(self.n_bits as u64);

        transcript.validate_and_append_point(b"A", &proof.A.compress())?;
        transcript.validate_and_append_point(b"B", &B.compress())?;
        transcript.validate_and_append_point(b"C", &proof.C.compress())?;
        transcript.validate_and_append_point(b"D", &proof.D.compress())?;

        let x = transcript.challenge_scalar(b"bit-proof-challenge");

        for f in &proof.f1_j {
            transcript.append_scalar(b"f1_j", f);
        }
        transcript.append_scalar(b"z_A", &proof.z_A);
        transcript.append_scalar(b"z_C", &proof.z_C);

        if proof.f1_j.len() != self.n_bits {
            return Err(ProofError::InvalidProofSize);
        }

        // All scalars must be canonical
        for f in &proof.f1_j {
            if !f.is_canonical() {
                return Err(ProofError::InvalidScalar(*f));
            }
        }
        if !proof.z_A.is_canonical() {
            return Err(ProofError::InvalidScalar(proof.z_A));
        }
        if !proof.z_C.is_canonical() {
            return Err(ProofError::InvalidScalar(proof.z_C));
        }

        // Inflate f1_j to include reconstructed f0_j vector
        let f_j_i = iter::once(proof.f1_j.iter().map(|f| x - f).collect())
            .chain(iter::once(proof.f1_j.clone()))
            .collect::<Vec<Vec<Scalar>>>();

        // Relation R1
        if x * B + proof.A != f_j_i.iter().flatten().commit(self, &proof.z_A)? {
            return Err(ProofError::VerificationFailed);
        }
        let r1 = f_j_i
            .iter()
            .flat_map(|f_j| f_j.iter().map(move |f| f * (x - f)))
            .commit(self, &proof.z_C)?;
        if x * proof.C + proof.D != r1 {
            return Err(ProofError::VerificationFailed);
        }
        Ok(x)
    }
}

pub trait OneOfManyProofs {
    //! Trait for computing and verifying OneOfMany zero-knowledge membership
    //! proofs over a set of points. Each method iterates over a set of
    //! [`RistrettoPoint`]s whose length must equal
    //! [`ProofGens::max_set_size`]. A prover knows the index `l` of one member
    //! and a blinding factor `r` such that `C_l - offset = r*G`.
    //!
    //! The offset is subtracted from every member before the proof is
    //! computed, so `C_l - offset` is the commitment to zero being proven.
    //!
    //! ```
    //! # use rand::rngs::OsRng;
    //! # use ring_vrf::proofs::OneOfManyProofs;
    //! # use ring_vrf::srs::Srs;
    //! # use curve25519_dalek::scalar::Scalar;
    //! # use curve25519_dalek::ristretto::RistrettoPoint;
    //! # use merlin::Transcript;
    //! let gens = Srs::generate(5).unwrap().proof_gens(5).unwrap();
    //!
    //! // The prover's commitment to some value `v`, third in the set
    //! let l: usize = 3;
    //! let v = Scalar::random(&mut OsRng);
    //! let r = Scalar::random(&mut OsRng);
    //! let C_l = gens.commit(&v, &r);
    //!
    //! let mut set = (1..gens.max_set_size())
    //!     .map(|_| RistrettoPoint::random(&mut OsRng))
    //!     .collect::<Vec<RistrettoPoint>>();
    //! set.insert(l, C_l);
    //!
    //! // A fresh commitment to the same value is the offset
    //! let r_new = Scalar::random(&mut OsRng);
    //! let C_new = gens.commit(&v, &r_new);
    //!
    //! let t = Transcript::new(b"OneOfMany-Test");
    //! let proof = set
    //!     .iter()
    //!     .prove_with_offset(&gens, &mut t.clone(), l, &(r - r_new), &C_new)
    //!     .unwrap();
    //! assert!(set
    //!     .iter()
    //!     .verify_with_offset(&gens, &mut t.clone(), &proof, &C_new)
    //!     .is_ok());
    //! ```

    /// Prove knowledge of `l` and `r` with `C_l - offset = r*G`.
    fn prove_with_offset(
        &self,
        gens: &ProofGens,
        transcript: &mut Transcript,
        l: usize,
        r: &Scalar,
        offset: &RistrettoPoint,
    ) -> ProofResult<OneOfManyProof>;

    /// Verify a proof of knowledge of a member opening to `offset`.
    fn verify_with_offset(
        &self,
        gens: &ProofGens,
        transcript: &mut Transcript,
        proof: &OneOfManyProof,
        offset: &RistrettoPoint,
    ) -> ProofResult<()> {
        self.verify_batch_with_offsets(
            gens,
            transcript,
            slice::from_ref(proof),
            slice::from_ref(offset),
        )
    }

    /// Batch verification of membership proofs over one set, each with its
    /// own offset.
    fn verify_batch_with_offsets(
        &self,
        gens: &ProofGens,
        transcript: &mut Transcript,
        proofs: &[OneOfManyProof],
        offsets: &[RistrettoPoint],
    ) -> ProofResult<()>;
}

impl<'a, I> OneOfManyProofs for I
where
    I: Iterator<Item = &'a RistrettoPoint> + Clone,
{
    fn prove_with_offset(
        &self,
        gens: &ProofGens,
        transcript: &mut Transcript,
        l: usize,
        r: &Scalar,
        offset: &RistrettoPoint,
    ) -> ProofResult<OneOfManyProof> {
        if l >= gens.max_set_size() {
            return Err(ProofError::IndexOutOfBounds);
        }

        transcript.one_of_many_proof_domain_sep(gens.n_bits as u64);

        // The prover rekeys the transcript RNG with its witness (`l` and `r`).
        let mut rng = {
            let builder = transcript
                .build_rng()
                .rekey_with_witness_bytes(b"l", Scalar::from(l as u64).as_bytes())
                .rekey_with_witness_bytes(b"r", r.as_bytes());

            use rand::thread_rng;
            builder.finalize(&mut thread_rng())
        };

        let rho_k = (0..gens.n_bits)
            .map(|_| Scalar::random(&mut rng))
            .collect::<Vec<Scalar>>();
        let a_j = (0..gens.n_bits)
            .map(|_| Scalar::random(&mut rng))
            .collect::<Vec<Scalar>>();
        let a_j_i = iter::once(a_j.clone())
            .chain(iter::once(a_j.iter().map(|a| -a).collect()))
            .collect::<Vec<Vec<Scalar>>>();

        let l_code = gray_code(l);
        let mut G_k = rho_k
            .iter()
            .map(|rho| gens.commit(&Scalar::zero(), rho))
            .collect::<Vec<RistrettoPoint>>();
        let mut i = 0;
        for C_i in self.clone() {
            if i >= gens.max_set_size() {
                return Err(ProofError::SetIsTooLarge);
            }
            let C_i = C_i - offset;
            let p_i = compute_p_i(gray_code(i), l_code, &a_j_i);
            for (k, p) in p_i.iter().enumerate() {
                G_k[k] += p * C_i;
            }
            i += 1;
        }
        if i < gens.max_set_size() {
            return Err(ProofError::SetIsTooSmall);
        }
        for G in &G_k {
            transcript.validate_and_append_point(b"G_k", &G.compress())?;
        }

        let (B, bit_proof, x) = gens.commit_bits(&mut transcript.clone(), l_code, &a_j)?;

        let rho_x = Polynomial::from(rho_k)
            .eval(x)
            .ok_or(ProofError::InvalidProofSize)?;
        let z = r * scalar_exp(x, gens.n_bits) - rho_x;

        transcript.append_scalar(b"z", &z);

        Ok(OneOfManyProof {
            B,
            bit_proof,
            G_k,
            z,
        })
    }

    fn verify_batch_with_offsets(
        &self,
        gens: &ProofGens,
        transcript: &mut Transcript,
        proofs: &[OneOfManyProof],
        offsets: &[RistrettoPoint],
    ) -> ProofResult<()> {
        transcript.one_of_many_proof_domain_sep(gens.n_bits as u64);

        // Every proof must have an offset
        if proofs.len() != offsets.len() {
            return Err(ProofError::VerificationFailed);
        }

        let mut x_vec = Vec::with_capacity(proofs.len());
        for p in proofs {
            if p.G_k.len() != gens.n_bits {
                return Err(ProofError::InvalidProofSize);
            }
            if !p.z.is_canonical() {
                return Err(ProofError::InvalidScalar(p.z));
            }

            let mut t = transcript.clone();
            for G in &p.G_k {
                t.validate_and_append_point(b"G_k", &G.compress())?;
            }
            x_vec.push(gens.verify_bits(&mut t, &p.B, &p.bit_proof)?);
        }

        // Each proof's equation is scaled by its own random weight, so errors
        // in different proofs cannot cancel out in the sum.
        let w_vec = if proofs.len() == 1 {
            vec![Scalar::one()]
        } else {
            let mut builder = transcript.build_rng();
            for p in proofs {
                builder = builder.rekey_with_witness_bytes(b"z", p.z.as_bytes());
            }
            use rand::thread_rng;
            let mut rng = builder.finalize(&mut thread_rng());
            proofs
                .iter()
                .map(|_| Scalar::random(&mut rng))
                .collect::<Vec<Scalar>>()
        };

        let mut coeff_iters = proofs
            .iter()
            .zip(x_vec.iter())
            .map(|(p, x)| SetCoefficientIterator::new(&p.bit_proof.f1_j, x))
            .collect::<ProofResult<Vec<SetCoefficientIterator>>>()?;

        // Every set coefficient vector sums to x^n, so each offset is weighted
        // by its proof's x^n.
        let O = offsets
            .iter()
            .zip(x_vec.iter().zip(w_vec.iter()))
            .map(|(O, (&x, w))| O * (w * scalar_exp(x, gens.n_bits)))
            .sum::<RistrettoPoint>();
        let mut set_size: usize = 0;
        let C = self
            .clone()
            .map(|C_i| {
                set_size += 1;
                C_i * coeff_iters
                    .iter_mut()
                    .zip(w_vec.iter())
                    .filter_map(|(coeff_iter, w)| coeff_iter.next().map(|c| w * c))
                    .sum::<Scalar>()
            })
            .sum::<RistrettoPoint>();
        if set_size < gens.max_set_size() {
            return Err(ProofError::SetIsTooSmall);
        } else if set_size > gens.max_set_size() {
            return Err(ProofError::SetIsTooLarge);
        }
        let E = gens.commit(
            &Scalar::zero(),
            &proofs
                .iter()
                .zip(w_vec.iter())
                .map(|(p, w)| w * p.z)
                .sum::<Scalar>(),
        );
        let G = proofs
            .iter()
            .zip(x_vec.iter().zip(w_vec.iter()))
            .map(|(p, (&x, w))| {
                Polynomial::from(p.G_k.clone())
                    .eval(x)
                    .map(|G| G * w)
                    .ok_or(ProofError::InvalidProofSize)
            })
            .collect::<ProofResult<Vec<RistrettoPoint>>>()?
            .into_iter()
            .sum::<RistrettoPoint>();
        if C.is_identity() || E.is_identity() || G.is_identity() {
            return Err(ProofError::VerificationFailed);
        }
        if C != E + G + O {
            return Err(ProofError::VerificationFailed);
        }

        Ok(())
    }
}

trait VectorCommit {
    fn commit(self, gens: &ProofGens, r: &Scalar) -> ProofResult<RistrettoPoint>;
}

impl<I, T> VectorCommit for I
where
    I: Iterator<Item = T>,
    T: Mul<RistrettoPoint, Output = RistrettoPoint>,
{
    fn commit(self, gens: &ProofGens, r: &Scalar) -> ProofResult<RistrettoPoint> {
        let mut c = r * gens.G;
        for (i, v) in self.enumerate() {
            if i >= gens.H.len() {
                return Err(ProofError::SetIsTooLarge);
            }
            c += v * gens.H[i];
        }
        Ok(c)
    }
}

// Iterates over the set coefficients in Gray code order. Each coefficient
// differs from the previous one in a single tensor factor.
#[derive(Clone)]
struct SetCoefficientIterator {
    f0_j: Vec<Scalar>,
    f0_inv_j: Vec<Scalar>,
    f1_j: Vec<Scalar>,
    f1_inv_j: Vec<Scalar>,
    n: usize,
    max_n: usize,
    nth_code: usize,
    nth_coeff: Scalar,
}

impl SetCoefficientIterator {
    fn new(f1_j: &[Scalar], x: &Scalar) -> ProofResult<SetCoefficientIterator> {
        let f1_j = f1_j.to_vec();
        let f0_j: Vec<Scalar> = f1_j.iter().map(|f1| x - f1).collect();
        // A zero factor has no inverse; honest proofs hit one with negligible
        // probability.
        if f0_j.iter().chain(f1_j.iter()).any(|f| f == &Scalar::zero()) {
            return Err(ProofError::VerificationFailed);
        }
        let mut f1_inv_j = f1_j.clone();
        Scalar::batch_invert(&mut f1_inv_j[..]);
        let mut f0_inv_j = f0_j.clone();
        Scalar::batch_invert(&mut f0_inv_j[..]);
        let max_n = 1usize << f1_j.len();
        let nth_coeff = f0_j.iter().product();
        Ok(SetCoefficientIterator {
            f0_j,
            f0_inv_j,
            f1_j,
            f1_inv_j,
            n: 0,
            max_n,
            nth_code: gray_code(0),
            nth_coeff,
        })
    }
}

impl Iterator for SetCoefficientIterator {
    type Item = Scalar;

    #[inline]
    fn next(&mut self) -> Option<Scalar> {
        if self.n >= self.max_n {
            return None;
        }
        let coeff = self.nth_coeff;
        self.n += 1;
        if self.n < self.max_n {
            let j = flipped_bit(self.n);
            if bit(self.nth_code, j) == 1 {
                self.nth_coeff *= self.f1_inv_j[j];
                self.nth_coeff *= self.f0_j[j];
            } else {
                self.nth_coeff *= self.f0_inv_j[j];
                self.nth_coeff *= self.f1_j[j];
            }
            self.nth_code = gray_code(self.n);
        }
        Some(coeff)
    }
}

fn compute_p_i(i: usize, l: usize, a_j_i: &[Vec<Scalar>]) -> Vec<Scalar> {
    debug_assert!(a_j_i.len() == 2);
    debug_assert!(a_j_i[0].len() == a_j_i[1].len());
    let n_bits = a_j_i[0].len();

    let mut p = Polynomial::from(Vec::with_capacity(n_bits));
    p.push(Scalar::one());

    for j in 0..n_bits {
        let mut f = Polynomial::new();
        f.push(a_j_i[bit(i, j)][j]);
        if 0 != delta(bit(l, j), bit(i, j)) {
            f.push(Scalar::one());
        }
        p *= f;
    }

    // Drop the degree `n` term; it is only non-zero for `i == l`
    let mut v: Vec<Scalar> = p.into();
    v.resize_with(n_bits, Scalar::zero);
    v
}

fn scalar_exp(base: Scalar, exp: usize) -> Scalar {
    let mut res = Scalar::one();
    for _ in 0..exp {
        res *= base;
    }
    res
}

fn bit(v: usize, j: usize) -> usize {
    (v >> j) & 1
}

fn delta(a: usize, b: usize) -> usize {
    if a == b {
        1
    } else {
        0
    }
}
