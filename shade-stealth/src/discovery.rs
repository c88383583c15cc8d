//! Payment discovery (recipient scan).
//!
//! Each announcement is checked independently:
//!
//! 1. Foreign scheme ids are skipped without any curve work.
//! 2. `S = viewing_sk · E`, candidate tag `= keccak256(S)[0]`.
//! 3. Tag mismatch: not ours. This is the common case and is not an error.
//! 4. Tag match: derive `stealth_sk = spending_sk + s` and check it controls
//!    the announced address. A mismatch here is a [`ShadeError::RecoveryMismatch`].

use std::time::Instant;

use tracing::warn;

use shade_core::error::{Result, ShadeError};
use shade_core::types::{Announcement, PrivateKey, PublicKey, RecipientKeys};
use shade_crypto::{
    addresses_match, derive_stealth_keys, ecdh, hash_shared_secret, verify_view_tag,
    StealthKeyPair,
};

use crate::trace::DerivationTrace;

/// Result of scanning a single announcement.
#[derive(Debug)]
pub enum ScanResult {
    /// View tag didn't match - not for this recipient
    NotForUs,
    /// Announcement uses a scheme other than secp256k1 and was skipped
    UnsupportedScheme(u64),
    /// View tag matched and the recovered key controls the address
    Discovered(StealthKeyPair),
    /// The announcement could not be processed, or recovery disagreed with it
    Failed(ShadeError),
}

impl ScanResult {
    /// Returns true if a payment was discovered.
    pub fn is_discovered(&self) -> bool {
        matches!(self, ScanResult::Discovered(_))
    }

    /// Returns the discovered keys if present.
    pub fn into_keys(self) -> Option<StealthKeyPair> {
        match self {
            ScanResult::Discovered(keys) => Some(keys),
            _ => None,
        }
    }

    /// Returns the failure if present.
    pub fn error(&self) -> Option<&ShadeError> {
        match self {
            ScanResult::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Statistics for scanning operations.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Total announcements scanned
    pub total_scanned: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// Number of payments discovered
    pub discoveries: u64,
    /// Number of failed announcements (mismatches included)
    pub errors: u64,
    /// View tag matched but the recovered key did not control the address
    pub mismatches: u64,
    /// Announcements skipped for a foreign scheme id
    pub unsupported: u64,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a scan result.
    pub fn record(&mut self, result: &ScanResult) {
        self.total_scanned += 1;
        match result {
            ScanResult::Discovered(_) => {
                self.view_tag_matches += 1;
                self.discoveries += 1;
            }
            ScanResult::Failed(e) => {
                self.errors += 1;
                if failed_after_tag_match(e) {
                    self.view_tag_matches += 1;
                }
                if e.is_protocol_inconsistency() {
                    self.mismatches += 1;
                }
            }
            ScanResult::UnsupportedScheme(_) => {
                self.unsupported += 1;
            }
            ScanResult::NotForUs => {}
        }
    }

    /// Adds another batch's counters into this one.
    pub fn merge(&mut self, other: &ScanStats) {
        self.total_scanned += other.total_scanned;
        self.view_tag_matches += other.view_tag_matches;
        self.discoveries += other.discoveries;
        self.errors += other.errors;
        self.mismatches += other.mismatches;
        self.unsupported += other.unsupported;
        self.duration_ms += other.duration_ms;
    }

    /// Returns the scan rate (announcements per second).
    pub fn rate(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            (self.total_scanned as f64 / self.duration_ms as f64) * 1000.0
        }
    }

    /// Returns the filter efficiency (percentage of announcements filtered).
    pub fn filter_efficiency(&self) -> f64 {
        if self.total_scanned == 0 {
            0.0
        } else {
            ((self.total_scanned - self.view_tag_matches) as f64 / self.total_scanned as f64) * 100.0
        }
    }
}

/// Errors that can only be raised once the view tag has matched.
///
/// ECDH between a valid scalar and a validated point never yields the
/// identity, so `PointAtInfinity` comes from the stealth key derivation.
fn failed_after_tag_match(error: &ShadeError) -> bool {
    error.is_protocol_inconsistency() || matches!(error, ShadeError::PointAtInfinity)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE ANNOUNCEMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Tries to recover the stealth key pair for one announcement.
///
/// Returns `Ok(None)` when the view tag does not match. Errors are real
/// failures: `UnsupportedScheme`, `InvalidAnnouncement` (no view tag),
/// `InvalidPoint` (bad ephemeral key), `PointAtInfinity`, or
/// `RecoveryMismatch` when the tag matched but the derived address differs.
pub fn try_recover(
    announcement: &Announcement,
    viewing_sk: &PrivateKey,
    spending_sk: &PrivateKey,
) -> Result<Option<StealthKeyPair>> {
    recover(announcement, viewing_sk, spending_sk, None)
}

fn recover(
    announcement: &Announcement,
    viewing_sk: &PrivateKey,
    spending_sk: &PrivateKey,
    trace: Option<&mut Option<DerivationTrace>>,
) -> Result<Option<StealthKeyPair>> {
    if !announcement.is_supported_scheme() {
        return Err(ShadeError::UnsupportedScheme(announcement.scheme_id));
    }

    let announced_tag = announcement.view_tag().ok_or_else(|| {
        ShadeError::InvalidAnnouncement("metadata is empty (no view tag)".into())
    })?;

    let ephemeral_pk = PublicKey::from_bytes(&announcement.ephemeral_public_key)?;
    let shared_secret = ecdh(viewing_sk, &ephemeral_pk)?;
    let digest = hash_shared_secret(&shared_secret);
    let tag_matches = verify_view_tag(&digest, announced_tag);

    let keys = if tag_matches {
        Some(derive_stealth_keys(spending_sk, &digest))
    } else {
        None
    };

    if let Some(slot) = trace {
        let mut recorded = DerivationTrace::new(ephemeral_pk, shared_secret, digest);
        if let Some(Ok(keys)) = &keys {
            recorded.record_stealth_key(keys.public_key, keys.address);
        }
        *slot = Some(recorded);
    }

    let keys = match keys {
        None => return Ok(None),
        Some(result) => result?,
    };

    if !addresses_match(&keys.address, &announcement.stealth_address) {
        return Err(ShadeError::RecoveryMismatch {
            expected: announcement.stealth_address.to_hex(),
            derived: keys.address.to_hex(),
        });
    }

    Ok(Some(keys))
}

/// Scans one announcement with the recipient's keys.
pub fn scan_announcement(announcement: &Announcement, keys: &RecipientKeys) -> ScanResult {
    to_scan_result(
        announcement,
        recover(announcement, &keys.viewing.secret, &keys.spending.secret, None),
    )
}

/// Scans one announcement and records the intermediate values.
///
/// The trace is `None` when scanning stopped before the ECDH step.
pub fn scan_announcement_traced(
    announcement: &Announcement,
    keys: &RecipientKeys,
) -> (ScanResult, Option<DerivationTrace>) {
    let mut trace = None;
    let result = recover(
        announcement,
        &keys.viewing.secret,
        &keys.spending.secret,
        Some(&mut trace),
    );
    (to_scan_result(announcement, result), trace)
}

fn to_scan_result(announcement: &Announcement, result: Result<Option<StealthKeyPair>>) -> ScanResult {
    match result {
        Ok(Some(keys)) => ScanResult::Discovered(keys),
        Ok(None) => ScanResult::NotForUs,
        Err(ShadeError::UnsupportedScheme(id)) => ScanResult::UnsupportedScheme(id),
        Err(e) => {
            if let ShadeError::RecoveryMismatch { expected, derived } = &e {
                warn!(
                    announcement_id = announcement.id,
                    %expected,
                    %derived,
                    "View tag matched but recovered key does not control the announced address"
                );
            }
            ScanResult::Failed(e)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// A payment found in a batch.
#[derive(Debug)]
pub struct Discovery {
    /// Position in the scanned slice
    pub index: usize,
    /// The announcement that led to this discovery
    pub announcement: Announcement,
    /// Recovered stealth keys
    pub keys: StealthKeyPair,
}

/// An announcement that failed to scan.
#[derive(Debug)]
pub struct ScanFailure {
    /// Position in the scanned slice
    pub index: usize,
    /// Registry id of the announcement
    pub announcement_id: u64,
    /// What went wrong
    pub error: ShadeError,
}

/// Outcome of scanning a batch of announcements.
#[derive(Debug, Default)]
pub struct ScanBatch {
    /// Discoveries in input order
    pub discoveries: Vec<Discovery>,
    /// Failures in input order
    pub failures: Vec<ScanFailure>,
    /// Counters for the batch
    pub stats: ScanStats,
}

impl ScanBatch {
    fn push(&mut self, index: usize, announcement: &Announcement, result: ScanResult) {
        self.stats.record(&result);
        match result {
            ScanResult::Discovered(keys) => self.discoveries.push(Discovery {
                index,
                announcement: announcement.clone(),
                keys,
            }),
            ScanResult::Failed(error) => self.failures.push(ScanFailure {
                index,
                announcement_id: announcement.id,
                error,
            }),
            ScanResult::NotForUs | ScanResult::UnsupportedScheme(_) => {}
        }
    }
}

/// Scans a batch of announcements sequentially.
pub fn scan_announcements(announcements: &[Announcement], keys: &RecipientKeys) -> ScanBatch {
    let start = Instant::now();
    let results = announcements.iter().map(|a| scan_announcement(a, keys));
    collect_batch(announcements, results, start)
}

/// Scans a batch of announcements on the rayon thread pool.
///
/// Output is identical to [`scan_announcements`], order included.
#[cfg(feature = "parallel")]
pub fn scan_announcements_parallel(announcements: &[Announcement], keys: &RecipientKeys) -> ScanBatch {
    let start = Instant::now();
    let results = scan_each_parallel(announcements, keys);
    collect_batch(announcements, results, start)
}

/// Scans every announcement on the rayon thread pool.
///
/// `results[i]` belongs to `announcements[i]`.
#[cfg(feature = "parallel")]
pub fn scan_each_parallel(announcements: &[Announcement], keys: &RecipientKeys) -> Vec<ScanResult> {
    use rayon::prelude::*;

    announcements
        .par_iter()
        .map(|a| scan_announcement(a, keys))
        .collect()
}

fn collect_batch(
    announcements: &[Announcement],
    results: impl IntoIterator<Item = ScanResult>,
    start: Instant,
) -> ScanBatch {
    let mut batch = ScanBatch::default();
    for (index, (announcement, result)) in announcements.iter().zip(results).enumerate() {
        batch.push(index, announcement, result);
    }
    batch.stats.duration_ms = start.elapsed().as_millis() as u64;
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::create_stealth_payment;
    use shade_core::types::EthAddress;
    use shade_crypto::generate_keypair;
    use test_case::test_case;

    fn recipient() -> RecipientKeys {
        RecipientKeys::new(generate_keypair(), generate_keypair())
    }

    fn announcement_for(keys: &RecipientKeys) -> Announcement {
        create_stealth_payment(&keys.meta_address()).unwrap().announcement
    }

    /// Announcement for another recipient whose tag never matches `keys`.
    fn unrelated_to(keys: &RecipientKeys) -> Announcement {
        let mut ann = announcement_for(&recipient());
        let digest = hash_shared_secret(
            &ecdh(
                &keys.viewing.secret,
                &PublicKey::from_bytes(&ann.ephemeral_public_key).unwrap(),
            )
            .unwrap(),
        );
        ann.metadata[0] = !digest.view_tag();
        ann
    }

    #[test]
    fn test_scan_announcement_discovery() {
        let keys = recipient();
        let payment = create_stealth_payment(&keys.meta_address()).unwrap();

        let result = scan_announcement(&payment.announcement, &keys);
        assert!(result.is_discovered());

        let found = result.into_keys().unwrap();
        assert_eq!(found.address, payment.stealth_address);
        assert_eq!(found.public_key, payment.stealth_public_key);
        assert_eq!(found.private_key.public_key(), payment.stealth_public_key);
    }

    #[test]
    fn test_try_recover_not_for_us() {
        let keys = recipient();
        let ann = unrelated_to(&keys);

        let result = try_recover(&ann, &keys.viewing.secret, &keys.spending.secret).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_recovery_mismatch_on_forced_collision() {
        let keys = recipient();
        let mut ann = announcement_for(&keys);
        ann.stealth_address = EthAddress::from_array([0x99; 20]);

        let err = try_recover(&ann, &keys.viewing.secret, &keys.spending.secret).unwrap_err();
        assert!(matches!(err, ShadeError::RecoveryMismatch { .. }));

        let result = scan_announcement(&ann, &keys);
        assert!(matches!(
            result.error(),
            Some(ShadeError::RecoveryMismatch { .. })
        ));
    }

    #[test_case(0 ; "scheme zero")]
    #[test_case(2 ; "scheme two")]
    #[test_case(u64::MAX ; "scheme max")]
    fn test_unsupported_scheme_skipped(scheme_id: u64) {
        let keys = recipient();
        let mut ann = announcement_for(&keys);
        ann.scheme_id = scheme_id;

        assert!(matches!(
            scan_announcement(&ann, &keys),
            ScanResult::UnsupportedScheme(id) if id == scheme_id
        ));
    }

    #[test]
    fn test_empty_metadata_is_invalid() {
        let keys = recipient();
        let mut ann = announcement_for(&keys);
        ann.metadata.clear();

        assert!(matches!(
            scan_announcement(&ann, &keys).error(),
            Some(ShadeError::InvalidAnnouncement(_))
        ));
    }

    #[test]
    fn test_bad_ephemeral_key_is_invalid_point() {
        let keys = recipient();
        let mut ann = announcement_for(&keys);
        ann.ephemeral_public_key[0] = 0x07;

        assert!(matches!(
            scan_announcement(&ann, &keys).error(),
            Some(ShadeError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_scan_traced() {
        let keys = recipient();
        let payment = create_stealth_payment(&keys.meta_address()).unwrap();

        let (result, trace) = scan_announcement_traced(&payment.announcement, &keys);
        assert!(result.is_discovered());

        let trace = trace.unwrap();
        assert_eq!(trace.view_tag, payment.view_tag);
        assert_eq!(trace.stealth_address, Some(payment.stealth_address));
    }

    #[test]
    fn test_scan_traced_foreign_scheme_has_no_trace() {
        let keys = recipient();
        let mut ann = announcement_for(&keys);
        ann.scheme_id = 9;

        let (_, trace) = scan_announcement_traced(&ann, &keys);
        assert!(trace.is_none());
    }

    #[test]
    fn test_scan_batch_order_and_failures() {
        let keys = recipient();

        let mut broken = announcement_for(&keys);
        broken.metadata.clear();
        broken.id = 77;

        let announcements = vec![
            announcement_for(&keys),
            unrelated_to(&keys),
            broken,
            announcement_for(&keys),
        ];

        let batch = scan_announcements(&announcements, &keys);
        let indices: Vec<usize> = batch.discoveries.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 3]);

        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].index, 2);
        assert_eq!(batch.failures[0].announcement_id, 77);

        assert_eq!(batch.stats.total_scanned, 4);
        assert_eq!(batch.stats.discoveries, 2);
        assert_eq!(batch.stats.errors, 1);
        assert_eq!(batch.stats.view_tag_matches, 2);
    }

    #[test]
    fn test_scan_batch_unrelated_never_fails() {
        let keys = recipient();
        let announcements: Vec<Announcement> = (0..300).map(|_| unrelated_to(&keys)).collect();

        let batch = scan_announcements(&announcements, &keys);
        assert!(batch.discoveries.is_empty());
        assert!(batch.failures.is_empty());
        assert_eq!(batch.stats.view_tag_matches, 0);
        assert_eq!(batch.stats.errors, 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let keys = recipient();
        let other = recipient();

        let announcements: Vec<Announcement> = (0..40)
            .map(|i| {
                if i % 7 == 0 {
                    announcement_for(&keys)
                } else {
                    announcement_for(&other)
                }
            })
            .collect();

        let sequential = scan_announcements(&announcements, &keys);
        let parallel = scan_announcements_parallel(&announcements, &keys);

        let seq: Vec<_> = sequential.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
        let par: Vec<_> = parallel.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 6);
        assert_eq!(sequential.stats.discoveries, parallel.stats.discoveries);
    }

    #[test]
    fn test_stats_efficiency() {
        let mut stats = ScanStats::new();
        for _ in 0..3 {
            stats.record(&ScanResult::NotForUs);
        }
        stats.record(&ScanResult::Failed(ShadeError::RecoveryMismatch {
            expected: "a".into(),
            derived: "b".into(),
        }));

        assert_eq!(stats.total_scanned, 4);
        assert_eq!(stats.view_tag_matches, 1);
        assert_eq!(stats.mismatches, 1);
        assert!((stats.filter_efficiency() - 75.0).abs() < 1e-9);
    }

    #[test_case(ShadeError::PointAtInfinity, 1, 0 ; "zero stealth key after tag match")]
    #[test_case(ShadeError::RecoveryMismatch { expected: "a".into(), derived: "b".into() }, 1, 1 ; "mismatch")]
    #[test_case(ShadeError::InvalidPoint("bad".into()), 0, 0 ; "bad ephemeral key")]
    #[test_case(ShadeError::InvalidAnnouncement("empty".into()), 0, 0 ; "no view tag")]
    fn test_stats_tag_matches_for_failures(error: ShadeError, tag_matches: u64, mismatches: u64) {
        let mut stats = ScanStats::new();
        stats.record(&ScanResult::Failed(error));

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.view_tag_matches, tag_matches);
        assert_eq!(stats.mismatches, mismatches);
    }
}
