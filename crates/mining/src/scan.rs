// Path: crates/mining/src/scan.rs
//! Device-abstracted nonce scanning and the u-draw acceptance math
//! (`spec.md` §4.9).
//!
//! The per-nonce digest is `sha3_256(header_prefix || mixSeed ||
//! u64le(nonce))`, where `header_prefix = sha3_256(header.signing_preimage
//! (DOMAIN_MINING))` — a 32-byte pre-hash of everything in the header except
//! `nonce`, computed once per template rather than once per nonce attempt.
//! This keeps the hot loop's per-attempt input to exactly 72 bytes
//! (32 + 32 + 8), small enough for a single-block Keccak permutation, which
//! is what bounds whether a GPU kernel can take the whole header in one
//! absorb rather than falling back to CPU.

use animica_codec::digest::Digest32;
use animica_codec::hash::sha3_256;
use animica_types::header::Header;
use animica_types::{MiningError, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Domain tag for the mining u-draw preimage, distinguishing it from any
/// other use of `Header::signing_preimage` (e.g. a future PQ header
/// signature).
pub const DOMAIN_MINING: &[u8] = b"animica.mining.scan.v1";

/// Number of nonce attempts a CPU worker batches between checks of the
/// shared stop flag, bounding how long a scan overruns a stale template.
pub const STOP_CHECK_INTERVAL: u64 = 2048;

/// Upper bound on `|header_prefix| + |mixSeed| + |nonce|` for a single
/// Keccak-f[1600] absorb (rate 136 bytes for SHA3-256); a GPU kernel that
/// assumes a single block must fall back to CPU above this.
pub const SINGLE_BLOCK_LIMIT: usize = 136;

/// Precompute the per-template prefix: `sha3_256(header.signing_preimage(
/// DOMAIN_MINING))`. Callers scanning many nonces against the same header
/// compute this once and reuse it via [`scan_digest_with_prefix`].
pub fn header_prefix(header: &Header) -> Digest32 {
    sha3_256(&header.signing_preimage(DOMAIN_MINING))
}

/// Compute the scan digest for `header` at `nonce` (recomputes
/// `header_prefix` each call; prefer [`scan_digest_with_prefix`] in a hot
/// loop scanning many nonces against one header).
pub fn scan_digest(header: &Header, nonce: u64) -> Digest32 {
    scan_digest_with_prefix(&header_prefix(header), &header.mix_seed, nonce)
}

/// Compute the scan digest from an already-hashed `header_prefix`:
/// `sha3_256(header_prefix || mixSeed || u64le(nonce))`.
pub fn scan_digest_with_prefix(prefix: &Digest32, mix_seed: &Digest32, nonce: u64) -> Digest32 {
    let mut preimage = Vec::with_capacity(SINGLE_BLOCK_LIMIT);
    preimage.extend_from_slice(prefix.as_bytes());
    preimage.extend_from_slice(mix_seed.as_bytes());
    preimage.extend_from_slice(&nonce.to_le_bytes());
    sha3_256(&preimage)
}

/// Map a 32-byte digest to a uniform draw `u` in `(0, 1]`: the first 16
/// bytes, read big-endian as two `u64`s `hi`/`lo`, scaled as
/// `hi / 2^64 + (lo + 1) / 2^128` (`spec.md` §4.9).
pub fn map_uniform(digest: &Digest32) -> f64 {
    let bytes = digest.as_bytes();
    let mut hi_buf = [0u8; 8];
    let mut lo_buf = [0u8; 8];
    hi_buf.copy_from_slice(&bytes[0..8]);
    lo_buf.copy_from_slice(&bytes[8..16]);
    let hi = u64::from_be_bytes(hi_buf);
    let lo = u64::from_be_bytes(lo_buf);
    (hi as f64) / (u64::MAX as f64 + 1.0) + (lo as f64 + 1.0) / ((u64::MAX as f64 + 1.0) * (u64::MAX as f64 + 1.0))
}

/// Whether the uniform draw `u` accepts at threshold `theta_micro`:
/// `u <= e^(-theta_micro / 1e6)`.
pub fn ratio_accepts(u: f64, theta_micro: u64) -> bool {
    let threshold = (-(theta_micro as f64) / 1_000_000.0).exp();
    u <= threshold
}

/// Difficulty ratio for a found share: `-ln(u) * 1e6 / theta_micro`, the
/// pool-accounting measure of how far under threshold the draw landed.
pub fn d_ratio(u: f64, theta_micro: u64) -> f64 {
    if theta_micro == 0 {
        return f64::INFINITY;
    }
    (-u.ln()) * 1_000_000.0 / (theta_micro as f64)
}

/// A single accepted draw: the nonce, its digest, the uniform value, and the
/// resulting difficulty ratio.
#[derive(Debug, Clone)]
pub struct ScanHit {
    /// The nonce that produced this hit.
    pub nonce: u64,
    /// The scan digest at that nonce.
    pub digest: Digest32,
    /// The uniform draw `u` in `(0, 1]`.
    pub u: f64,
    /// Difficulty ratio relative to `share_target_micro`.
    pub d_ratio: f64,
}

/// Shared state a scan loop consults to learn whether its current template
/// has gone stale and it should stop early instead of exhausting its range.
#[derive(Debug, Default)]
pub struct ScanContext {
    stop: AtomicBool,
}

impl ScanContext {
    /// Construct a fresh, not-yet-stopped context.
    pub fn new() -> Self {
        ScanContext::default()
    }

    /// Signal every worker sharing this context to stop at the next check.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// A pluggable nonce-scanning backend. The CPU backend ([`CpuScanner`]) is
/// always available; a `cuda`-feature backend may additionally be compiled
/// in, but since no CUDA toolchain binding ships in this workspace it always
/// reports [`MiningError::KernelUnavailable`] so callers genuinely exercise
/// the CPU fallback path.
pub trait ScanDevice: Send + Sync {
    /// Scan `[start, start + count)` against `header` at `share_target_micro`,
    /// returning every nonce whose draw accepts, honoring `ctx`'s stop flag.
    fn scan_range(
        &self,
        header: &Header,
        start: u64,
        count: u64,
        share_target_micro: u64,
        ctx: &ScanContext,
    ) -> Result<Vec<ScanHit>>;
}

/// Rayon-parallel CPU scanner: splits `[start, start+count)` into
/// `STOP_CHECK_INTERVAL`-sized chunks processed in parallel, checking the
/// shared stop flag between chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuScanner;

impl ScanDevice for CpuScanner {
    fn scan_range(
        &self,
        header: &Header,
        start: u64,
        count: u64,
        share_target_micro: u64,
        ctx: &ScanContext,
    ) -> Result<Vec<ScanHit>> {
        use rayon::prelude::*;

        let prefix = header_prefix(header);
        let mix_seed = header.mix_seed;
        let chunk = STOP_CHECK_INTERVAL;
        let chunk_starts: Vec<u64> = (0..count).step_by(chunk as usize).map(|o| start + o).collect();

        let hits: Vec<ScanHit> = chunk_starts
            .into_par_iter()
            .map_init(
                || (),
                |(), chunk_start| {
                    if ctx.is_stopped() {
                        return Vec::new();
                    }
                    let end = chunk_start.saturating_add(chunk).min(start + count);
                    let mut local = Vec::new();
                    for nonce in chunk_start..end {
                        let digest = scan_digest_with_prefix(&prefix, &mix_seed, nonce);
                        let u = map_uniform(&digest);
                        if ratio_accepts(u, share_target_micro) {
                            local.push(ScanHit {
                                nonce,
                                digest,
                                u,
                                d_ratio: d_ratio(u, share_target_micro),
                            });
                        }
                    }
                    local
                },
            )
            .flatten()
            .collect();
        Ok(hits)
    }
}

/// A `cuda`-feature-gated scan device. No CUDA toolchain binding ships in
/// this workspace; this device always reports `KernelUnavailable` so a
/// caller that enables the feature still falls back to [`CpuScanner`]
/// honestly rather than silently succeeding with a fake kernel.
#[cfg(feature = "cuda")]
#[derive(Debug, Default, Clone, Copy)]
pub struct CudaScanner;

#[cfg(feature = "cuda")]
impl ScanDevice for CudaScanner {
    fn scan_range(
        &self,
        _header: &Header,
        _start: u64,
        _count: u64,
        _share_target_micro: u64,
        _ctx: &ScanContext,
    ) -> Result<Vec<ScanHit>> {
        Err(MiningError::KernelUnavailable("no CUDA toolchain binding in this build".into()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animica_codec::digest::Digest32;

    fn genesis() -> Header {
        Header::genesis(
            1,
            1,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::ZERO,
            Digest32::from_array([7; 32]),
            Digest32::ZERO,
            Digest32::ZERO,
            // A generous threshold so a small range reliably yields hits.
            50_000,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn map_uniform_is_in_open_unit_interval() {
        for b in [0u8, 1, 128, 255] {
            let d = Digest32::from_array([b; 32]);
            let u = map_uniform(&d);
            assert!(u > 0.0 && u <= 1.0);
        }
    }

    #[test]
    fn higher_theta_accepts_a_superset_of_draws() {
        let d = Digest32::from_array([42; 32]);
        let u = map_uniform(&d);
        if ratio_accepts(u, 100_000) {
            assert!(ratio_accepts(u, 200_000));
        }
    }

    #[test]
    fn scan_digest_excludes_nonce_from_header_hash_but_not_from_digest() {
        let h = genesis();
        let d1 = scan_digest(&h, 0);
        let d2 = scan_digest(&h, 1);
        assert_ne!(d1, d2);
    }

    #[test]
    fn prefixed_and_unprefixed_digest_agree() {
        let h = genesis();
        let prefix = header_prefix(&h);
        assert_eq!(scan_digest(&h, 7), scan_digest_with_prefix(&prefix, &h.mix_seed, 7));
    }

    #[test]
    fn per_attempt_input_fits_a_single_keccak_block() {
        // header_prefix (32) + mixSeed (32) + nonce (8) must always be well
        // under the 136-byte rate, independent of header size.
        assert!(32 + 32 + 8 <= SINGLE_BLOCK_LIMIT);
    }

    #[test]
    fn cpu_scanner_finds_hits_over_a_range_with_generous_threshold() {
        let h = genesis();
        let ctx = ScanContext::new();
        let hits = CpuScanner.scan_range(&h, 0, 20_000, h.theta_micro, &ctx).unwrap();
        assert!(!hits.is_empty());
        for hit in &hits {
            assert!(ratio_accepts(hit.u, h.theta_micro));
            assert_eq!(hit.digest, scan_digest(&h, hit.nonce));
        }
    }

    #[test]
    fn stop_flag_halts_further_accumulation() {
        let h = genesis();
        let ctx = ScanContext::new();
        ctx.request_stop();
        let hits = CpuScanner.scan_range(&h, 0, 20_000, h.theta_micro, &ctx).unwrap();
        assert!(hits.is_empty());
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn cuda_scanner_reports_kernel_unavailable() {
        let h = genesis();
        let ctx = ScanContext::new();
        let err = CudaScanner.scan_range(&h, 0, 10, h.theta_micro, &ctx).unwrap_err();
        assert!(matches!(
            err,
            animica_types::AnimicaError::Mining(MiningError::KernelUnavailable(_))
        ));
    }
}
