//! Rings of public keys and their commitments.
//!
//! A ring commitment is a Pedersen vector commitment to the member keys,
//! position by position:
//!
//! ```text
//! C = sum_i m_i * R_i,    m_i = hash_to_scalar(i, P_i)
//! ```
//!
//! where the `R_i` are the SRS ring generators. It is serialized together with
//! the ring length, and signatures bind it into their transcripts.
use crate::curve::{self, POINT_LEN};
use crate::errors::{Result, RingVrfError};
use crate::keys::PublicKey;
use crate::srs::Srs;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use sha3::{Digest, Sha3_512};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const RING_MEMBER_DOMAIN: &[u8] = b"ring-vrf member";

/// Length of an encoded [`RingCommitment`].
pub const RING_COMMITMENT_LEN: usize = POINT_LEN + 4;

/// Smallest membership proof domain, in bits.
pub const MIN_PROOF_BITS: usize = 2;

/// An ordered set of public keys. Positions are the member indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    keys: Vec<PublicKey>,
}

impl Ring {
    /// Build a ring, checking that `ring_size` matches the number of keys.
    pub fn new(keys: Vec<PublicKey>, ring_size: usize) -> Result<Ring> {
        check_count(keys.len(), ring_size)?;
        Ok(Ring { keys })
    }

    /// Parse hex encoded keys. The key count is checked before any key is
    /// parsed, and the first bad key is reported by index.
    ///
    /// ```
    /// # use ring_vrf::keys::SecretKey;
    /// # use ring_vrf::ring::Ring;
    /// # use rand::rngs::OsRng;
    /// let hex_keys = (0..3)
    ///     .map(|_| SecretKey::random(&mut OsRng).public().to_hex())
    ///     .collect::<Vec<String>>();
    /// let refs = hex_keys.iter().map(String::as_str).collect::<Vec<&str>>();
    ///
    /// let ring = Ring::from_hex(&refs, 3).unwrap();
    /// assert_eq!(ring.len(), 3);
    /// assert!(Ring::from_hex(&refs, 4).is_err());
    /// ```
    pub fn from_hex<S: AsRef<str>>(keys: &[S], ring_size: usize) -> Result<Ring> {
        check_count(keys.len(), ring_size)?;
        let keys = keys
            .iter()
            .enumerate()
            .map(|(i, k)| PublicKey::from_hex(k.as_ref(), i))
            .collect::<Result<Vec<PublicKey>>>()?;
        Ok(Ring { keys })
    }

    /// Parse whitespace separated hex keys.
    pub fn from_hex_list(keys: &str, ring_size: usize) -> Result<Ring> {
        Ring::from_hex(&keys.split_whitespace().collect::<Vec<&str>>(), ring_size)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; empty rings are refused at construction.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    pub fn get(&self, index: usize) -> Option<&PublicKey> {
        self.keys.get(index)
    }

    /// Index bits of the membership proof over this ring.
    pub fn proof_bits(&self) -> usize {
        let n = self.keys.len();
        let bits = if n <= 1 {
            0
        } else {
            (usize::BITS - (n - 1).leading_zeros()) as usize
        };
        bits.max(MIN_PROOF_BITS)
    }

    /// The member points padded to `2^n_bits` slots. Slots past the end of the
    /// ring repeat the first member.
    pub(crate) fn padded_points(&self, n_bits: usize) -> Vec<RistrettoPoint> {
        (0..1usize << n_bits)
            .map(|i| *self.keys.get(i).unwrap_or(&self.keys[0]).as_point())
            .collect()
    }
}

fn check_count(actual: usize, declared: usize) -> Result<()> {
    if actual == 0 || actual != declared {
        Err(RingVrfError::RingSizeMismatch { declared, actual })
    } else {
        Ok(())
    }
}

/// A commitment to the ordered members of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<u8>", into = "Vec<u8>")
)]
pub struct RingCommitment {
    point: RistrettoPoint,
    ring_len: u32,
}

impl RingCommitment {
    pub fn ring_len(&self) -> usize {
        self.ring_len as usize
    }

    pub fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }

    /// Check that this commitment can stand for `ring` under `srs`.
    ///
    /// Only the ring length is compared in release builds. Debug builds also
    /// recompute the commitment and assert that it matches.
    pub(crate) fn check_ring(&self, ring: &Ring, srs: &Srs) -> Result<()> {
        if self.ring_len() != ring.len() {
            return Err(RingVrfError::RingSizeMismatch {
                declared: self.ring_len(),
                actual: ring.len(),
            });
        }
        srs.check_ring_size(ring.len())?;
        debug_assert!(
            aggregate(ring, srs).map_or(false, |c| c == *self),
            "ring commitment does not match the ring and SRS"
        );
        Ok(())
    }

    /// Encode as `C || LE32(ring_len)`.
    pub fn to_bytes(&self) -> [u8; RING_COMMITMENT_LEN] {
        let mut out = [0u8; RING_COMMITMENT_LEN];
        out[..POINT_LEN].copy_from_slice(&curve::encode_point(&self.point));
        out[POINT_LEN..].copy_from_slice(&self.ring_len.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<RingCommitment> {
        if bytes.len() != RING_COMMITMENT_LEN {
            return None;
        }
        let point = curve::decode_point(&bytes[..POINT_LEN])?;
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[POINT_LEN..]);
        let ring_len = u32::from_le_bytes(len);
        if ring_len == 0 {
            return None;
        }
        Some(RingCommitment { point, ring_len })
    }
}

impl TryFrom<Vec<u8>> for RingCommitment {
    type Error = &'static str;

    fn try_from(bytes: Vec<u8>) -> core::result::Result<RingCommitment, Self::Error> {
        RingCommitment::from_bytes(&bytes).ok_or("invalid ring commitment")
    }
}

impl From<RingCommitment> for Vec<u8> {
    fn from(commitment: RingCommitment) -> Vec<u8> {
        commitment.to_bytes().to_vec()
    }
}

/// Commit to the members of `ring` under `srs`.
///
/// ```
/// # use ring_vrf::keys::SecretKey;
/// # use ring_vrf::ring::{aggregate, Ring};
/// # use ring_vrf::srs::Srs;
/// # use rand::rngs::OsRng;
/// let srs = Srs::generate(3).unwrap();
/// let keys = (0..5)
///     .map(|_| *SecretKey::random(&mut OsRng).public())
///     .collect::<Vec<_>>();
/// let ring = Ring::new(keys, 5).unwrap();
///
/// let commitment = aggregate(&ring, &srs).unwrap();
/// assert_eq!(commitment, aggregate(&ring, &srs).unwrap());
/// assert_eq!(commitment.to_bytes().len(), 36);
/// ```
pub fn aggregate(ring: &Ring, srs: &Srs) -> Result<RingCommitment> {
    srs.check_ring_size(ring.len())?;
    let ring_len =
        u32::try_from(ring.len()).map_err(|_| RingVrfError::Serialization("ring too long"))?;
    let scalars = ring.keys.iter().enumerate().map(|(i, key)| {
        curve::hash_to_scalar(
            RING_MEMBER_DOMAIN,
            &[&(i as u64).to_le_bytes(), key.as_bytes()],
        )
    });
    let point = RistrettoPoint::vartime_multiscalar_mul(
        scalars,
        srs.ring_generators()[..ring.len()].iter(),
    );
    Ok(RingCommitment { point, ring_len })
}

/// Default bound on the number of cached ring commitments.
pub const DEFAULT_COMMITMENT_CACHE_CAPACITY: usize = 1024;

/// Ring commitments keyed by SRS identity and ring contents.
///
/// The cache holds at most `capacity` commitments. Inserting into a full
/// cache evicts an arbitrary entry.
#[derive(Debug)]
pub struct CommitmentCache {
    entries: Mutex<HashMap<[u8; 32], RingCommitment>>,
    capacity: usize,
}

impl Default for CommitmentCache {
    fn default() -> CommitmentCache {
        CommitmentCache::with_capacity(DEFAULT_COMMITMENT_CACHE_CAPACITY)
    }
}

impl CommitmentCache {
    pub fn new() -> CommitmentCache {
        CommitmentCache::default()
    }

    /// A cache bounded to `capacity` commitments, at least one.
    pub fn with_capacity(capacity: usize) -> CommitmentCache {
        CommitmentCache {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the commitment to `ring` under `srs`, aggregating on first use.
    /// Failed aggregations are not cached.
    pub fn get_or_aggregate(&self, ring: &Ring, srs: &Srs) -> Result<RingCommitment> {
        let key = cache_key(ring, srs);
        if let Some(commitment) = self.lock().get(&key) {
            return Ok(*commitment);
        }
        let commitment = aggregate(ring, srs)?;
        let mut entries = self.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(evicted) = entries.keys().next().copied() {
                entries.remove(&evicted);
            }
        }
        Ok(*entries.entry(key).or_insert(commitment))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[u8; 32], RingCommitment>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn cache_key(ring: &Ring, srs: &Srs) -> [u8; 32] {
    let mut h = Sha3_512::new();
    h.input(srs.id());
    for key in &ring.keys {
        h.input(key.as_bytes());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.result()[..32]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;
    use rand::rngs::OsRng;

    fn random_keys(n: usize) -> Vec<PublicKey> {
        (0..n)
            .map(|_| *SecretKey::random(&mut OsRng).public())
            .collect()
    }

    #[test]
    fn ring_size_is_checked() {
        let keys = random_keys(4);
        assert!(Ring::new(keys.clone(), 4).is_ok());
        assert!(matches!(
            Ring::new(keys.clone(), 5).unwrap_err(),
            RingVrfError::RingSizeMismatch {
                declared: 5,
                actual: 4
            }
        ));
        assert!(matches!(
            Ring::new(Vec::new(), 0).unwrap_err(),
            RingVrfError::RingSizeMismatch {
                declared: 0,
                actual: 0
            }
        ));

        // Counting happens before parsing
        assert!(matches!(
            Ring::from_hex(&["zz", "zz"], 3).unwrap_err(),
            RingVrfError::RingSizeMismatch { .. }
        ));
    }

    #[test]
    fn first_bad_key_is_reported() {
        let mut hex_keys = random_keys(5)
            .iter()
            .map(PublicKey::to_hex)
            .collect::<Vec<String>>();
        hex_keys[1] = "00".repeat(32);
        hex_keys[3] = "nothex".to_string();
        assert!(matches!(
            Ring::from_hex(&hex_keys, 5).unwrap_err(),
            RingVrfError::InvalidKey { index: 1 }
        ));
        hex_keys[1] = "abcd".to_string();
        assert!(matches!(
            Ring::from_hex(&hex_keys, 5).unwrap_err(),
            RingVrfError::Parse { index: Some(1), .. }
        ));

        let joined = random_keys(3)
            .iter()
            .map(PublicKey::to_hex)
            .collect::<Vec<String>>()
            .join(" \n");
        assert_eq!(Ring::from_hex_list(&joined, 3).unwrap().len(), 3);
    }

    #[test]
    fn proof_bits_and_padding() {
        let bits = |n| Ring::new(random_keys(n), n).unwrap().proof_bits();
        assert_eq!(bits(1), 2);
        assert_eq!(bits(2), 2);
        assert_eq!(bits(4), 2);
        assert_eq!(bits(5), 3);
        assert_eq!(bits(6), 3);
        assert_eq!(bits(8), 3);
        assert_eq!(bits(9), 4);

        let ring = Ring::new(random_keys(6), 6).unwrap();
        let padded = ring.padded_points(3);
        assert_eq!(padded.len(), 8);
        for (i, key) in ring.keys().iter().enumerate() {
            assert_eq!(&padded[i], key.as_point());
        }
        assert_eq!(&padded[6], ring.keys()[0].as_point());
        assert_eq!(&padded[7], ring.keys()[0].as_point());
    }

    #[test]
    fn commitment_binds_members_and_order() {
        let srs = Srs::generate(3).unwrap();
        let keys = random_keys(6);
        let ring = Ring::new(keys.clone(), 6).unwrap();
        let commitment = aggregate(&ring, &srs).unwrap();
        assert_eq!(commitment.ring_len(), 6);
        assert_eq!(commitment, aggregate(&ring, &srs).unwrap());

        let mut swapped = keys.clone();
        swapped.swap(0, 1);
        assert_ne!(
            commitment,
            aggregate(&Ring::new(swapped, 6).unwrap(), &srs).unwrap()
        );

        let mut replaced = keys.clone();
        replaced[5] = random_keys(1)[0];
        assert_ne!(
            commitment,
            aggregate(&Ring::new(replaced, 6).unwrap(), &srs).unwrap()
        );

        let shorter = Ring::new(keys[..5].to_vec(), 5).unwrap();
        assert_ne!(commitment, aggregate(&shorter, &srs).unwrap());

        // A different SRS commits differently
        assert_ne!(
            commitment.as_point(),
            aggregate(&ring, &Srs::generate(4).unwrap())
                .unwrap()
                .as_point()
        );
    }

    #[test]
    fn oversized_ring() {
        let srs = Srs::generate(2).unwrap();
        let ring = Ring::new(random_keys(5), 5).unwrap();
        assert!(matches!(
            aggregate(&ring, &srs).unwrap_err(),
            RingVrfError::UnsupportedRingSize {
                ring_size: 5,
                max: 4
            }
        ));
    }

    #[test]
    fn commitment_encoding() {
        let srs = Srs::generate(3).unwrap();
        let ring = Ring::new(random_keys(7), 7).unwrap();
        let commitment = aggregate(&ring, &srs).unwrap();
        let bytes = commitment.to_bytes();
        assert_eq!(&bytes[POINT_LEN..], &[7, 0, 0, 0]);
        assert_eq!(RingCommitment::from_bytes(&bytes), Some(commitment));
        assert_eq!(RingCommitment::from_bytes(&bytes[1..]), None);

        let mut zero_len = bytes;
        zero_len[POINT_LEN..].copy_from_slice(&[0; 4]);
        assert_eq!(RingCommitment::from_bytes(&zero_len), None);
    }

    #[test]
    fn cache_aggregates_once() {
        let srs_a = Srs::generate(3).unwrap();
        let srs_b = Srs::generate(4).unwrap();
        let ring = Ring::new(random_keys(5), 5).unwrap();
        let cache = CommitmentCache::new();
        assert!(cache.is_empty());

        let first = cache.get_or_aggregate(&ring, &srs_a).unwrap();
        assert_eq!(first, aggregate(&ring, &srs_a).unwrap());
        assert_eq!(cache.get_or_aggregate(&ring, &srs_a).unwrap(), first);
        assert_eq!(cache.len(), 1);

        cache.get_or_aggregate(&ring, &srs_b).unwrap();
        assert_eq!(cache.len(), 2);

        let too_big = Ring::new(random_keys(9), 9).unwrap();
        assert!(cache.get_or_aggregate(&too_big, &srs_a).is_err());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_is_bounded() {
        let srs = Srs::generate(2).unwrap();
        let cache = CommitmentCache::with_capacity(3);
        assert_eq!(cache.capacity(), 3);
        for _ in 0..10 {
            let ring = Ring::new(random_keys(2), 2).unwrap();
            let commitment = cache.get_or_aggregate(&ring, &srs).unwrap();
            assert_eq!(commitment, aggregate(&ring, &srs).unwrap());
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(CommitmentCache::with_capacity(0).capacity(), 1);
        assert_eq!(
            CommitmentCache::new().capacity(),
            DEFAULT_COMMITMENT_CACHE_CAPACITY
        );
    }
}
