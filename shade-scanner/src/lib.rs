//! # SHADE Scanner
//!
//! Registry-driven scanning of announcements to discover payments.
//!
//! ## Features
//!
//! - **Batch Processing**: Walks the registry in id order, one page at a time
//! - **Progress Reporting**: Callbacks for UI progress updates
//! - **Resumable Scans**: Track position to resume interrupted scans
//! - **Parallel Scanning**: Optional rayon-backed page scanning
//!
//! ## Example
//!
//! ```rust,ignore
//! use shade_scanner::{Scanner, ScannerConfig};
//!
//! let scanner = Scanner::from_wallet(wallet);
//! let report = scanner.scan_with_config(&registry, ScannerConfig::new().parallel(true)).await?;
//!
//! for discovery in &report.discoveries {
//!     println!("Found payment at: {}", discovery.keys.address);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use shade_core::constants::{DEFAULT_SCAN_BATCH_SIZE, MAX_SCAN_BATCH_SIZE};
use shade_core::error::Result;
use shade_core::traits::AnnouncementRegistry;
use shade_core::types::{Announcement, RecipientKeys};
use shade_stealth::discovery::{scan_announcement, Discovery, ScanFailure, ScanResult, ScanStats};
use shade_stealth::ShadeWallet;

/// Progress is reported after this many scanned announcements.
const PROGRESS_INTERVAL: u64 = 100;

/// Scanner configuration.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Page size requested from the registry
    pub batch_size: usize,
    /// Whether to stop on first discovery
    pub stop_on_first: bool,
    /// Lowest block number to scan (inclusive)
    pub from_block: Option<u64>,
    /// Highest block number to scan (inclusive)
    pub to_block: Option<u64>,
    /// First announcement id to scan
    pub start_id: u64,
    /// Scan each page on the rayon pool
    pub parallel: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            stop_on_first: false,
            from_block: None,
            to_block: None,
            start_id: 0,
            parallel: false,
        }
    }
}

impl ScannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size, clamped to `1..=MAX_SCAN_BATCH_SIZE`.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_SCAN_BATCH_SIZE);
        self
    }

    /// Enables stopping on first discovery.
    pub fn stop_on_first(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    /// Only scans announcements mined in `[from, to]`.
    ///
    /// Announcements without a block number are skipped while a range is set.
    pub fn block_range(mut self, from: u64, to: u64) -> Self {
        self.from_block = Some(from);
        self.to_block = Some(to);
        self
    }

    /// Sets the lower block bound only.
    pub fn from_block(mut self, from: u64) -> Self {
        self.from_block = Some(from);
        self
    }

    /// Sets the upper block bound only.
    pub fn to_block(mut self, to: u64) -> Self {
        self.to_block = Some(to);
        self
    }

    /// Starts at announcement `id`.
    pub fn start_id(mut self, id: u64) -> Self {
        self.start_id = id;
        self
    }

    /// Continues after the last announcement recorded in `position`.
    pub fn resume_from(mut self, position: &ScanPosition) -> Self {
        self.start_id = position.next_id();
        self
    }

    /// Scans pages on the rayon pool (needs the `parallel` feature).
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    fn has_block_range(&self) -> bool {
        self.from_block.is_some() || self.to_block.is_some()
    }

    fn in_block_range(&self, announcement: &Announcement) -> bool {
        if !self.has_block_range() {
            return true;
        }
        match announcement.block_number {
            Some(block) => {
                self.from_block.map_or(true, |from| block >= from)
                    && self.to_block.map_or(true, |to| block <= to)
            }
            None => false,
        }
    }
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Scan progress information.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Announcements in the registry when the scan started
    pub total: u64,
    /// Announcements scanned so far
    pub scanned: u64,
    /// Discoveries found so far
    pub discoveries: u64,
    /// Current scan rate (announcements per second)
    pub rate: f64,
    /// Estimated time remaining in seconds
    pub eta_seconds: Option<f64>,
    /// Percentage complete (0-100)
    pub percent: f64,
}

impl ScanProgress {
    /// Creates a new progress tracker.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            scanned: 0,
            discoveries: 0,
            rate: 0.0,
            eta_seconds: None,
            percent: 0.0,
        }
    }

    /// Updates progress with new values.
    pub fn update(&mut self, scanned: u64, discoveries: u64, elapsed_ms: u64) {
        self.scanned = scanned;
        self.discoveries = discoveries;

        if elapsed_ms > 0 {
            self.rate = (scanned as f64 / elapsed_ms as f64) * 1000.0;
        }

        if self.total > 0 {
            self.percent = ((scanned as f64 / self.total as f64) * 100.0).min(100.0);

            if self.rate > 0.0 {
                let remaining = self.total.saturating_sub(scanned);
                self.eta_seconds = Some(remaining as f64 / self.rate);
            }
        }
    }

    /// Marks the scan as finished.
    fn finish(&mut self, scanned: u64, discoveries: u64, elapsed_ms: u64) {
        self.update(scanned, discoveries, elapsed_ms);
        self.percent = 100.0;
        self.eta_seconds = Some(0.0);
    }
}

/// Scan position for resumable scanning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPosition {
    /// Last announcement ID passed by the scanner (scanned or skipped)
    pub last_id: u64,
    /// Block of the last scanned announcement, if known
    pub last_block: Option<u64>,
    /// Total announcements scanned in this session
    pub total_scanned: u64,
    /// Total discoveries in this session
    pub total_discoveries: u64,
}

impl ScanPosition {
    /// Creates a new scan position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first id a resumed scan should read.
    pub fn next_id(&self) -> u64 {
        if self.total_scanned == 0 && self.last_id == 0 {
            0
        } else {
            self.last_id.saturating_add(1)
        }
    }

    /// Updates position after scanning an announcement.
    pub fn update(&mut self, announcement: &Announcement, discovered: bool) {
        self.last_id = announcement.id;
        if announcement.block_number.is_some() {
            self.last_block = announcement.block_number;
        }
        self.total_scanned += 1;
        if discovered {
            self.total_discoveries += 1;
        }
    }

    fn skip_to(&mut self, id: u64) {
        self.last_id = self.last_id.max(id);
    }
}

/// Scan result summary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of announcements scanned
    pub total_scanned: u64,
    /// Number of view tag matches
    pub view_tag_matches: u64,
    /// Number of payments discovered
    pub discoveries: u64,
    /// Number of failed announcements
    pub errors: u64,
    /// View tag matched but the address did not
    pub mismatches: u64,
    /// Announcements skipped for a foreign scheme id
    pub unsupported: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Scan rate (announcements per second)
    pub rate: f64,
    /// Filter efficiency (% filtered by view tag)
    pub filter_efficiency: f64,
}

impl From<ScanStats> for ScanSummary {
    fn from(stats: ScanStats) -> Self {
        Self {
            total_scanned: stats.total_scanned,
            view_tag_matches: stats.view_tag_matches,
            discoveries: stats.discoveries,
            errors: stats.errors,
            mismatches: stats.mismatches,
            unsupported: stats.unsupported,
            duration_ms: stats.duration_ms,
            rate: stats.rate(),
            filter_efficiency: stats.filter_efficiency(),
        }
    }
}

/// Everything one scan produced.
///
/// `Discovery::index` and `ScanFailure::index` count scanned announcements
/// from the start of this scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Payments found, in id order
    pub discoveries: Vec<Discovery>,
    /// Announcements that failed to scan, in id order
    pub failures: Vec<ScanFailure>,
    /// Counters for this scan
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Returns true if any announcement failed with a recovery mismatch.
    pub fn has_mismatches(&self) -> bool {
        self.summary.mismatches > 0
    }
}

/// Main scanner for discovering payments.
///
/// Statistics and the scan position accumulate across calls until
/// [`Scanner::reset_position`].
pub struct Scanner {
    keys: RecipientKeys,
    position: RwLock<ScanPosition>,
    stats: RwLock<ScanStats>,
}

impl Scanner {
    /// Creates a scanner for the given recipient keys.
    pub fn new(keys: RecipientKeys) -> Self {
        Self {
            keys,
            position: RwLock::new(ScanPosition::new()),
            stats: RwLock::new(ScanStats::new()),
        }
    }

    /// Creates a scanner from a wallet.
    pub fn from_wallet(wallet: ShadeWallet) -> Self {
        Self::new(wallet.into_keys())
    }

    /// Returns the current scan position.
    pub fn position(&self) -> ScanPosition {
        self.position.read().clone()
    }

    /// Returns the accumulated statistics.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Resets the scan position and statistics.
    pub fn reset_position(&self) {
        *self.position.write() = ScanPosition::new();
        *self.stats.write() = ScanStats::new();
    }

    /// Scans all announcements in the registry.
    pub async fn scan_all(&self, registry: &dyn AnnouncementRegistry) -> Result<ScanReport> {
        self.run(registry, &ScannerConfig::default(), None).await
    }

    /// Scans with custom configuration.
    pub async fn scan_with_config(
        &self,
        registry: &dyn AnnouncementRegistry,
        config: ScannerConfig,
    ) -> Result<ScanReport> {
        self.run(registry, &config, None).await
    }

    /// Scans with progress reporting.
    ///
    /// The callback runs every 100 scanned announcements and once at the end.
    pub async fn scan_with_progress(
        &self,
        registry: &dyn AnnouncementRegistry,
        config: ScannerConfig,
        progress_callback: ProgressCallback,
    ) -> Result<ScanReport> {
        self.run(registry, &config, Some(&progress_callback)).await
    }

    /// Scans a single announcement.
    pub fn scan_one(&self, announcement: &Announcement) -> ScanResult {
        let result = scan_announcement(announcement, &self.keys);
        self.stats.write().record(&result);
        result
    }

    #[instrument(skip_all, fields(start_id = config.start_id, parallel = config.parallel))]
    async fn run(
        &self,
        registry: &dyn AnnouncementRegistry,
        config: &ScannerConfig,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<ScanReport> {
        let start = Instant::now();
        let batch_size = config.batch_size.clamp(1, MAX_SCAN_BATCH_SIZE);

        let mut progress = ScanProgress::new(registry.count().await?);
        let mut report = ScanReport::default();
        let mut run_stats = ScanStats::new();
        let mut next_id = config.start_id;

        info!(batch_size, "Starting scan");

        'pages: loop {
            let page = registry.get_range(next_id, batch_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            let page_last_id = last.id;

            let window: Vec<Announcement> = page
                .into_iter()
                .filter(|a| config.in_block_range(a))
                .collect();

            debug!(
                from_id = next_id,
                to_id = page_last_id,
                in_window = window.len(),
                "Scanning page"
            );

            let results = self.scan_page(&window, config.parallel);

            for (announcement, result) in window.iter().zip(results) {
                let index = run_stats.total_scanned as usize;
                let discovered = result.is_discovered();

                run_stats.record(&result);
                self.stats.write().record(&result);
                self.position.write().update(announcement, discovered);

                match result {
                    ScanResult::Discovered(keys) => report.discoveries.push(Discovery {
                        index,
                        announcement: announcement.clone(),
                        keys,
                    }),
                    ScanResult::Failed(error) => report.failures.push(ScanFailure {
                        index,
                        announcement_id: announcement.id,
                        error,
                    }),
                    ScanResult::NotForUs | ScanResult::UnsupportedScheme(_) => {}
                }

                if let Some(callback) = progress_callback {
                    if run_stats.total_scanned % PROGRESS_INTERVAL == 0 {
                        progress.update(
                            run_stats.total_scanned,
                            run_stats.discoveries,
                            start.elapsed().as_millis() as u64,
                        );
                        callback(progress.clone());
                    }
                }

                if discovered && config.stop_on_first {
                    info!(id = announcement.id, "Stopping on first discovery");
                    break 'pages;
                }
            }

            self.position.write().skip_to(page_last_id);

            match page_last_id.checked_add(1) {
                Some(id) => next_id = id,
                None => break,
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        run_stats.duration_ms = elapsed_ms;
        self.stats.write().duration_ms += elapsed_ms;

        if let Some(callback) = progress_callback {
            progress.finish(run_stats.total_scanned, run_stats.discoveries, elapsed_ms);
            callback(progress);
        }

        if run_stats.mismatches > 0 {
            warn!(
                mismatches = run_stats.mismatches,
                "Scan found announcements whose view tag matched but address did not"
            );
        }

        info!(
            discoveries = run_stats.discoveries,
            scanned = run_stats.total_scanned,
            errors = run_stats.errors,
            duration_ms = elapsed_ms,
            rate = format!("{:.2}/s", run_stats.rate()),
            "Scan complete"
        );

        report.summary = run_stats.into();
        Ok(report)
    }

    /// Scans one page. The sequential path is lazy so stop-on-first skips
    /// the rest of the page.
    fn scan_page<'a>(
        &'a self,
        window: &'a [Announcement],
        parallel: bool,
    ) -> Box<dyn Iterator<Item = ScanResult> + 'a> {
        #[cfg(feature = "parallel")]
        if parallel {
            return Box::new(shade_stealth::scan_each_parallel(window, &self.keys).into_iter());
        }
        #[cfg(not(feature = "parallel"))]
        if parallel {
            debug!("parallel scanning requested without the `parallel` feature; scanning sequentially");
        }

        Box::new(window.iter().map(|a| scan_announcement(a, &self.keys)))
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("meta_address", &self.keys.meta_address())
            .field("position", &*self.position.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use shade_core::types::EthAddress;
    use shade_crypto::generate_keypair;
    use shade_registry::{MemoryRegistry, Registry};
    use shade_stealth::create_stealth_payment;

    fn setup_scanner_and_registry() -> (Scanner, MemoryRegistry, shade_core::types::MetaAddress) {
        let keys = RecipientKeys::new(generate_keypair(), generate_keypair());
        let meta = keys.meta_address();
        (Scanner::new(keys), MemoryRegistry::new(), meta)
    }

    fn announcement_for(meta: &shade_core::types::MetaAddress) -> Announcement {
        create_stealth_payment(meta).unwrap().announcement
    }

    fn unrelated_announcement() -> Announcement {
        let other = RecipientKeys::new(generate_keypair(), generate_keypair());
        announcement_for(&other.meta_address())
    }

    #[tokio::test]
    async fn test_scan_empty_registry() {
        let (scanner, registry, _) = setup_scanner_and_registry();

        let report = scanner.scan_all(&registry).await.unwrap();
        assert!(report.discoveries.is_empty());
        assert_eq!(report.summary.total_scanned, 0);
    }

    #[tokio::test]
    async fn test_scan_finds_payment() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        let ann = announcement_for(&meta);
        let expected = ann.stealth_address;
        registry.publish(ann).await.unwrap();

        let report = scanner.scan_all(&registry).await.unwrap();
        assert_eq!(report.discoveries.len(), 1);
        assert_eq!(report.discoveries[0].keys.address, expected);
    }

    #[tokio::test]
    async fn test_scan_ignores_other_payments() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        registry.publish(announcement_for(&meta)).await.unwrap();
        for _ in 0..10 {
            registry.publish(unrelated_announcement()).await.unwrap();
        }

        let report = scanner.scan_all(&registry).await.unwrap();
        assert_eq!(report.discoveries.len(), 1);
        assert_eq!(report.summary.total_scanned, 11);
    }

    #[tokio::test]
    async fn test_scan_walks_pages_in_id_order() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        for i in 0..25 {
            let ann = if i % 6 == 0 {
                announcement_for(&meta)
            } else {
                unrelated_announcement()
            };
            registry.publish(ann).await.unwrap();
        }

        let config = ScannerConfig::new().batch_size(4);
        let report = scanner.scan_with_config(&registry, config).await.unwrap();

        let ids: Vec<u64> = report.discoveries.iter().map(|d| d.announcement.id).collect();
        assert_eq!(ids, vec![1, 7, 13, 19, 25]);
        assert_eq!(scanner.position().last_id, 25);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        for i in 0..30 {
            let ann = if i % 4 == 0 {
                announcement_for(&meta)
            } else {
                unrelated_announcement()
            };
            registry.publish(ann).await.unwrap();
        }

        let sequential = scanner
            .scan_with_config(&registry, ScannerConfig::new().batch_size(7))
            .await
            .unwrap();
        let parallel = scanner
            .scan_with_config(&registry, ScannerConfig::new().batch_size(7).parallel(true))
            .await
            .unwrap();

        let seq: Vec<_> = sequential.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
        let par: Vec<_> = parallel.discoveries.iter().map(|d| (d.index, d.keys.address)).collect();
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 8);
    }

    #[tokio::test]
    async fn test_scan_stop_on_first() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        registry.publish(unrelated_announcement()).await.unwrap();
        for _ in 0..5 {
            registry.publish(announcement_for(&meta)).await.unwrap();
        }

        let config = ScannerConfig::new().stop_on_first();
        let report = scanner.scan_with_config(&registry, config).await.unwrap();

        assert_eq!(report.discoveries.len(), 1);
        assert_eq!(report.summary.total_scanned, 2);
        assert_eq!(scanner.position().last_id, 2);
    }

    #[tokio::test]
    async fn test_scan_block_filter() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        for block in [100u64, 200, 300] {
            let mut ann = announcement_for(&meta);
            ann.block_number = Some(block);
            registry.publish(ann).await.unwrap();
        }
        registry.publish(announcement_for(&meta)).await.unwrap();

        let config = ScannerConfig::new().block_range(150, 250);
        let report = scanner.scan_with_config(&registry, config).await.unwrap();
        assert_eq!(report.discoveries.len(), 1);
        assert_eq!(report.discoveries[0].announcement.block_number, Some(200));

        // Position moves past skipped announcements too
        assert_eq!(scanner.position().last_id, 4);

        let open_ended = ScannerConfig::new().from_block(150);
        let report = scanner.scan_with_config(&registry, open_ended).await.unwrap();
        assert_eq!(report.discoveries.len(), 2);
    }

    #[tokio::test]
    async fn test_resume_from_position() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        registry.publish(announcement_for(&meta)).await.unwrap();
        registry.publish(announcement_for(&meta)).await.unwrap();
        scanner.scan_all(&registry).await.unwrap();

        registry.publish(announcement_for(&meta)).await.unwrap();

        let config = ScannerConfig::new().resume_from(&scanner.position());
        let report = scanner.scan_with_config(&registry, config).await.unwrap();

        assert_eq!(report.discoveries.len(), 1);
        assert_eq!(report.discoveries[0].announcement.id, 3);
        assert_eq!(scanner.position().total_discoveries, 3);
    }

    #[tokio::test]
    async fn test_mismatch_is_reported() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        let mut tampered = announcement_for(&meta);
        tampered.stealth_address = EthAddress::from_array([0x5a; 20]);
        registry.publish(tampered).await.unwrap();

        let report = scanner.scan_all(&registry).await.unwrap();
        assert!(report.discoveries.is_empty());
        assert!(report.has_mismatches());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].announcement_id, 1);
        assert!(report.failures[0].error.is_protocol_inconsistency());
    }

    #[tokio::test]
    async fn test_unsupported_scheme_counted() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        let mut foreign = announcement_for(&meta);
        foreign.scheme_id = 2;
        registry.publish(foreign).await.unwrap();

        let report = scanner.scan_all(&registry).await.unwrap();
        assert!(report.discoveries.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.summary.unsupported, 1);
    }

    #[tokio::test]
    async fn test_scan_stats_accumulate() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        registry.publish(announcement_for(&meta)).await.unwrap();
        for _ in 0..10 {
            registry.publish(unrelated_announcement()).await.unwrap();
        }

        scanner.scan_all(&registry).await.unwrap();
        scanner.scan_all(&registry).await.unwrap();

        let stats = scanner.stats();
        assert_eq!(stats.discoveries, 2);
        assert_eq!(stats.total_scanned, 22);
    }

    #[tokio::test]
    async fn test_scan_progress_callback() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        for _ in 0..150 {
            registry.publish(announcement_for(&meta)).await.unwrap();
        }

        let progress_updates = Arc::new(RwLock::new(Vec::new()));
        let updates_clone = progress_updates.clone();

        let callback: ProgressCallback = Box::new(move |progress| {
            updates_clone.write().push(progress);
        });

        scanner
            .scan_with_progress(&registry, ScannerConfig::new(), callback)
            .await
            .unwrap();

        let updates = progress_updates.read();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].scanned, 100);

        let last = updates.last().unwrap();
        assert_eq!(last.scanned, 150);
        assert_eq!(last.discoveries, 150);
        assert!(last.percent >= 99.0);
    }

    #[tokio::test]
    async fn test_reset_position() {
        let (scanner, registry, meta) = setup_scanner_and_registry();

        registry.publish(announcement_for(&meta)).await.unwrap();
        scanner.scan_all(&registry).await.unwrap();
        scanner.reset_position();

        assert_eq!(scanner.position(), ScanPosition::new());
        assert_eq!(scanner.stats().total_scanned, 0);
    }

    #[test]
    fn test_scan_one_records_stats() {
        let (scanner, _, meta) = setup_scanner_and_registry();

        assert!(scanner.scan_one(&announcement_for(&meta)).is_discovered());
        assert_eq!(scanner.stats().discoveries, 1);
    }

    #[test]
    fn test_from_wallet() {
        let wallet = ShadeWallet::generate();
        let meta = *wallet.meta_address();
        let scanner = Scanner::from_wallet(wallet);

        assert!(scanner.scan_one(&announcement_for(&meta)).is_discovered());
    }

    #[test]
    fn test_batch_size_clamped() {
        assert_eq!(ScannerConfig::new().batch_size(0).batch_size, 1);
        assert_eq!(
            ScannerConfig::new().batch_size(usize::MAX).batch_size,
            MAX_SCAN_BATCH_SIZE
        );
        assert_eq!(ScannerConfig::default().batch_size, DEFAULT_SCAN_BATCH_SIZE);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ScanSummary::from(ScanStats::new());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_scanned\":0"));
    }

    #[test]
    fn test_scan_progress_eta() {
        let mut progress = ScanProgress::new(1000);

        // 500 scanned in 1000ms
        progress.update(500, 2, 1000);

        assert!((progress.percent - 50.0).abs() < 0.1);
        assert!((progress.rate - 500.0).abs() < 1.0);
        assert!((progress.eta_seconds.unwrap() - 1.0).abs() < 0.1);
    }
}
