//! Structured reference string.
//!
//! An SRS for a domain of `N` bits holds every public generator the ring VRF
//! needs for rings of up to `2^N` members:
//!
//! ```text
//! G             blinding generator of key commitments and membership proofs
//! H[0..2N]      bit commitment generators of membership proofs
//! R[0..2^N]     ring commitment generators
//! ```
//!
//! On disk it is the plain concatenation of the compressed generators, in the
//! order above, so the file length alone determines `N`.
#![allow(non_snake_case)]
use crate::curve::{self, POINT_LEN};
use crate::errors::{Result, RingVrfError};
use crate::proofs::ProofGens;
use curve25519_dalek::constants;
use curve25519_dalek::ristretto::RistrettoPoint;
use sha3::Sha3_512;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Smallest supported domain, in bits.
pub const MIN_DOMAIN_BITS: usize = 2;

/// Largest supported domain, in bits.
pub const MAX_DOMAIN_BITS: usize = 16;

const SRS_ID_DOMAIN: &[u8] = b"ring-vrf srs id";

/// Public parameters shared by every aggregation, signature and verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Srs {
    domain_bits: usize,
    G: RistrettoPoint,
    H: Vec<RistrettoPoint>,
    R: Vec<RistrettoPoint>,
    id: [u8; 32],
}

impl Srs {
    /// Number of generators in an SRS for a `domain_bits` domain.
    pub fn generator_count(domain_bits: usize) -> usize {
        1 + 2 * domain_bits + (1 << domain_bits)
    }

    /// Expected encoded length of an SRS for a `domain_bits` domain.
    pub fn encoded_len(domain_bits: usize) -> usize {
        Srs::generator_count(domain_bits) * POINT_LEN
    }

    /// Deterministically derive an SRS for a `domain_bits` domain.
    ///
    /// The generators form a SHA3-512 hash chain seeded with the Ristretto
    /// basepoint, so no party knows a discrete log relation between them:
    /// ```text
    /// G    = hash(B)
    /// H[0] = hash(G)
    /// ...
    /// R[i] = hash(previous generator)
    /// ```
    ///
    /// ```
    /// # use ring_vrf::srs::Srs;
    /// let srs = Srs::generate(5).unwrap();
    /// assert_eq!(srs.max_ring_size(), 32);
    /// assert_eq!(Srs::from_bytes(&srs.to_bytes()).unwrap(), srs);
    /// ```
    pub fn generate(domain_bits: usize) -> Result<Srs> {
        check_domain(domain_bits)?;
        let count = Srs::generator_count(domain_bits);
        let mut gens = Vec::with_capacity(count);
        let mut prev = constants::RISTRETTO_BASEPOINT_POINT;
        for _ in 0..count {
            prev = RistrettoPoint::hash_from_bytes::<Sha3_512>(prev.compress().as_bytes());
            gens.push(prev);
        }
        Ok(Srs::from_generators(domain_bits, gens))
    }

    /// Read and validate an SRS file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Srs> {
        let bytes = fs::read(path)?;
        Srs::from_bytes(&bytes)
    }

    /// Validate an encoded SRS.
    ///
    /// Fails with [`RingVrfError::Format`] if the length fits no supported
    /// domain, and with [`RingVrfError::CorruptData`] naming the first
    /// generator that does not decode, is the identity, or repeats an earlier
    /// generator.
    pub fn from_bytes(bytes: &[u8]) -> Result<Srs> {
        let domain_bits = (MIN_DOMAIN_BITS..=MAX_DOMAIN_BITS)
            .find(|&bits| Srs::encoded_len(bits) == bytes.len())
            .ok_or(RingVrfError::Format { len: bytes.len() })?;

        let mut seen = HashSet::with_capacity(Srs::generator_count(domain_bits));
        let gens = bytes
            .chunks(POINT_LEN)
            .enumerate()
            .map(|(index, chunk)| {
                if !seen.insert(chunk) {
                    return Err(RingVrfError::CorruptData { index });
                }
                curve::decode_point(chunk).ok_or(RingVrfError::CorruptData { index })
            })
            .collect::<Result<Vec<RistrettoPoint>>>()?;

        Ok(Srs::from_generators(domain_bits, gens))
    }

    fn from_generators(domain_bits: usize, mut gens: Vec<RistrettoPoint>) -> Srs {
        let R = gens.split_off(1 + 2 * domain_bits);
        let H = gens.split_off(1);
        let mut srs = Srs {
            domain_bits,
            G: gens[0],
            H,
            R,
            id: [0u8; 32],
        };
        let wide = curve::hash_wide(SRS_ID_DOMAIN, &[&srs.to_bytes()]);
        srs.id.copy_from_slice(&wide[..32]);
        srs
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Srs::encoded_len(self.domain_bits));
        for p in core::iter::once(&self.G).chain(&self.H).chain(&self.R) {
            out.extend_from_slice(&curve::encode_point(p));
        }
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// A digest of the encoded SRS, used to tell SRS instances apart.
    pub fn id(&self) -> &[u8; 32] {
        &self.id
    }

    pub fn domain_bits(&self) -> usize {
        self.domain_bits
    }

    /// The largest ring this SRS supports.
    pub fn max_ring_size(&self) -> usize {
        1 << self.domain_bits
    }

    pub fn check_ring_size(&self, ring_size: usize) -> Result<()> {
        if ring_size > self.max_ring_size() {
            Err(RingVrfError::UnsupportedRingSize {
                ring_size,
                max: self.max_ring_size(),
            })
        } else {
            Ok(())
        }
    }

    /// The blinding generator.
    pub fn blinding_generator(&self) -> &RistrettoPoint {
        &self.G
    }

    /// The ring commitment generators.
    pub fn ring_generators(&self) -> &[RistrettoPoint] {
        &self.R
    }

    /// Generators for a membership proof over `2^n_bits` slots.
    pub fn proof_gens(&self, n_bits: usize) -> Result<ProofGens> {
        if n_bits > self.domain_bits {
            return Err(RingVrfError::UnsupportedRingSize {
                ring_size: 1 << n_bits,
                max: self.max_ring_size(),
            });
        }
        Ok(ProofGens::from_generators(
            n_bits,
            self.G,
            self.H[..2 * n_bits].to_vec(),
        )?)
    }
}

impl core::fmt::Debug for Srs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Srs")
            .field("domain_bits", &self.domain_bits)
            .field("id", &hex::encode(self.id))
            .finish()
    }
}

fn check_domain(domain_bits: usize) -> Result<()> {
    if (MIN_DOMAIN_BITS..=MAX_DOMAIN_BITS).contains(&domain_bits) {
        Ok(())
    } else {
        Err(RingVrfError::UnsupportedDomain { bits: domain_bits })
    }
}

/// Loaded SRS instances keyed by file path.
///
/// Loading parses and validates thousands of points, so callers that resolve
/// an SRS by path on every request share one of these. Entries are never
/// evicted, so the cache grows by one SRS per distinct path.
#[derive(Debug, Default)]
pub struct SrsCache {
    entries: Mutex<HashMap<PathBuf, Arc<Srs>>>,
}

impl SrsCache {
    pub fn new() -> SrsCache {
        SrsCache::default()
    }

    /// Return the SRS at `path`, loading it on first use. Failed loads are not
    /// cached.
    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Srs>> {
        let path = path.as_ref();
        if let Some(srs) = self.lock().get(path) {
            return Ok(Arc::clone(srs));
        }
        // Load without holding the lock; concurrent loads of one path are
        // idempotent and the first insert wins.
        let srs = Arc::new(Srs::load(path)?);
        Ok(Arc::clone(
            self.lock().entry(path.to_path_buf()).or_insert(srs),
        ))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Srs>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
