//! C ABI exports.
//!
//! Keys cross the boundary as whitespace separated hex, secrets as a hex
//! encoded 32 byte seed, and SRS files by path. Buffers returned by
//! [`ring_vrf_ffi_aggregator`] and [`ring_vrf_ffi_sign`] are allocated with
//! `malloc` and must be released with [`ring_vrf_ffi_free`].
//!
//! Every call records a status code, readable with
//! [`ring_vrf_ffi_last_status`] on the same thread. The codes are listed in
//! [`errors::status`](crate::errors::status).
use crate::errors::{status, RingVrfError};
use crate::keys::SecretKey;
use crate::prover::sign_with_commitment;
use crate::ring::{CommitmentCache, Ring, RingCommitment};
use crate::srs::{Srs, SrsCache};
use crate::verifier::{verify_with_commitment, Verification};
use crate::vrf::VRF_OUTPUT_LEN;
use libc::{c_char, c_int, c_uchar};
use std::cell::Cell;
use std::ffi::CStr;
use std::ptr;
use std::slice;
use std::sync::{Arc, OnceLock};

// One entry per distinct SRS path; callers are expected to use a handful of
// SRS files for the life of the process.
static SRS_CACHE: OnceLock<SrsCache> = OnceLock::new();
// Bounded, see `CommitmentCache::with_capacity`.
static COMMITMENT_CACHE: OnceLock<CommitmentCache> = OnceLock::new();

thread_local! {
    static LAST_STATUS: Cell<c_int> = Cell::new(status::OK);
}

type FfiResult<T> = Result<T, c_int>;

impl From<RingVrfError> for c_int {
    fn from(e: RingVrfError) -> c_int {
        e.status_code()
    }
}

fn set_status(code: c_int) {
    LAST_STATUS.with(|s| s.set(code));
}

/// Status of the last call made on this thread.
#[no_mangle]
pub extern "C" fn ring_vrf_ffi_last_status() -> c_int {
    LAST_STATUS.with(|s| s.get())
}

/// Aggregate the ring commitment for `ring_size` keys under the SRS at
/// `srs_path`. Returns a buffer of `*out_len` bytes, or null on error.
///
/// # Safety
/// `keys_str` and `srs_path` must be null or NUL terminated strings, and
/// `out_len` null or writable.
#[no_mangle]
pub unsafe extern "C" fn ring_vrf_ffi_aggregator(
    keys_str: *const c_char,
    ring_size: c_int,
    srs_path: *const c_char,
    out_len: *mut c_int,
) -> *mut c_uchar {
    let result = (|| -> FfiResult<Vec<u8>> {
        let (ring, srs) = ring_and_srs(keys_str, ring_size, srs_path)?;
        let commitment = commitment(&ring, &srs)?;
        Ok(commitment.to_bytes().to_vec())
    })();
    into_buffer(result, out_len)
}

/// Sign `input` and `aux` as ring member `signer_idx`. Returns a signature
/// buffer of `*out_len` bytes, or null on error.
///
/// # Safety
/// String arguments must be null or NUL terminated. `input` and `aux` must be
/// null or valid for reads of `input_len` and `aux_len` bytes, and `out_len`
/// null or writable.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn ring_vrf_ffi_sign(
    secret_hex: *const c_char,
    keys_str: *const c_char,
    ring_size: c_int,
    srs_path: *const c_char,
    input: *const c_uchar,
    input_len: c_int,
    aux: *const c_uchar,
    aux_len: c_int,
    signer_idx: c_int,
    out_len: *mut c_int,
) -> *mut c_uchar {
    let result = (|| -> FfiResult<Vec<u8>> {
        let secret = SecretKey::from_hex_seed(c_str(secret_hex)?)?;
        let (ring, srs) = ring_and_srs(keys_str, ring_size, srs_path)?;
        let input = bytes(input, input_len)?;
        let aux = bytes(aux, aux_len)?;
        let signer_idx =
            usize::try_from(signer_idx).map_err(|_| status::KEY_INDEX_MISMATCH)?;
        let commitment = commitment(&ring, &srs)?;
        let signature =
            sign_with_commitment(&secret, &ring, &srs, &commitment, input, aux, signer_idx)?;
        Ok(signature.to_bytes()?)
    })();
    into_buffer(result, out_len)
}

/// Verify a signature. Returns 1 and copies the 32 byte VRF output into
/// `out_vrf` on success, 0 otherwise.
///
/// # Safety
/// String arguments must be null or NUL terminated. `input`, `aux` and `sig`
/// must be null or valid for reads of their lengths, and `out_vrf` null or
/// writable for 32 bytes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn ring_vrf_ffi_verify(
    keys_str: *const c_char,
    ring_size: c_int,
    srs_path: *const c_char,
    input: *const c_uchar,
    input_len: c_int,
    aux: *const c_uchar,
    aux_len: c_int,
    sig: *const c_uchar,
    sig_len: c_int,
    out_vrf: *mut c_uchar,
) -> c_int {
    let result = (|| -> FfiResult<Verification> {
        if out_vrf.is_null() {
            return Err(status::NULL_ARGUMENT);
        }
        let (ring, srs) = ring_and_srs(keys_str, ring_size, srs_path)?;
        let input = bytes(input, input_len)?;
        let aux = bytes(aux, aux_len)?;
        let sig = bytes(sig, sig_len)?;
        let commitment = commitment(&ring, &srs)?;
        Ok(verify_with_commitment(
            &ring,
            &srs,
            &commitment,
            input,
            aux,
            sig,
        )?)
    })();
    match result {
        Ok(Verification::Valid(output)) => {
            ptr::copy_nonoverlapping(output.as_bytes().as_ptr(), out_vrf, VRF_OUTPUT_LEN);
            set_status(status::OK);
            1
        }
        Ok(Verification::Rejected) => {
            set_status(status::REJECTED);
            0
        }
        Err(code) => {
            set_status(code);
            0
        }
    }
}

/// Release a buffer returned by [`ring_vrf_ffi_aggregator`] or
/// [`ring_vrf_ffi_sign`]. Null is ignored.
///
/// # Safety
/// `ptr` must be null or a buffer from this library that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn ring_vrf_ffi_free(ptr: *mut c_uchar, _len: c_int) {
    if ptr.is_null() {
        return;
    }
    libc::free(ptr as *mut libc::c_void);
}

unsafe fn c_str<'a>(ptr: *const c_char) -> FfiResult<&'a str> {
    if ptr.is_null() {
        return Err(status::NULL_ARGUMENT);
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| status::PARSE)
}

unsafe fn bytes<'a>(ptr: *const c_uchar, len: c_int) -> FfiResult<&'a [u8]> {
    if ptr.is_null() {
        return Err(status::NULL_ARGUMENT);
    }
    let len = usize::try_from(len).map_err(|_| status::PARSE)?;
    Ok(slice::from_raw_parts(ptr, len))
}

unsafe fn ring_and_srs(
    keys_str: *const c_char,
    ring_size: c_int,
    srs_path: *const c_char,
) -> FfiResult<(Ring, Arc<Srs>)> {
    let keys = c_str(keys_str)?;
    let path = c_str(srs_path)?;
    let ring_size = usize::try_from(ring_size).map_err(|_| status::RING_SIZE_MISMATCH)?;
    let ring = Ring::from_hex_list(keys, ring_size)?;
    let srs = SRS_CACHE.get_or_init(SrsCache::new).get_or_load(path)?;
    Ok((ring, srs))
}

fn commitment(ring: &Ring, srs: &Srs) -> FfiResult<RingCommitment> {
    Ok(COMMITMENT_CACHE
        .get_or_init(CommitmentCache::new)
        .get_or_aggregate(ring, srs)?)
}

unsafe fn into_buffer(result: FfiResult<Vec<u8>>, out_len: *mut c_int) -> *mut c_uchar {
    if !out_len.is_null() {
        *out_len = 0;
    }
    let data = match result {
        Ok(data) => data,
        Err(code) => {
            set_status(code);
            return ptr::null_mut();
        }
    };
    if out_len.is_null() {
        set_status(status::NULL_ARGUMENT);
        return ptr::null_mut();
    }
    let len = match c_int::try_from(data.len()) {
        Ok(len) => len,
        Err(_) => {
            set_status(status::ALLOCATION);
            return ptr::null_mut();
        }
    };
    let buf = libc::malloc(data.len()) as *mut c_uchar;
    if buf.is_null() {
        set_status(status::ALLOCATION);
        return ptr::null_mut();
    }
    ptr::copy_nonoverlapping(data.as_ptr(), buf, data.len());
    *out_len = len;
    set_status(status::OK);
    buf
}
