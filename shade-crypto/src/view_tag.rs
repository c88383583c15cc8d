//! View tag computation for efficient scanning.
//!
//! View tags enable recipients to quickly filter announcements:
//! - Each announcement carries the first byte of `keccak256(S)` as `metadata[0]`
//! - Recipients compute their candidate tag with one ECDH and one hash
//! - Only announcements with matching view tags need the point addition
//!   and address check
//!
//! ## Efficiency
//!
//! With 1-byte view tags (256 possible values), ~99.6% of announcements
//! are rejected before any further curve work.
//!
//! ## Security
//!
//! View tags leak 8 bits of the shared-secret digest. The remaining 248 bits
//! still protect the stealth scalar, and a tag alone does not identify the
//! recipient.

use shade_core::constants::VIEW_TAG_SPACE;

use crate::curve::SharedSecret;
use crate::hash::{hash_shared_secret, SecretDigest};

/// Computes the view tag of a shared secret.
pub fn compute_view_tag(shared_secret: &SharedSecret) -> u8 {
    hash_shared_secret(shared_secret).view_tag()
}

/// Checks a digest against an announced tag in constant time.
pub fn verify_view_tag(digest: &SecretDigest, expected_tag: u8) -> bool {
    subtle::ConstantTimeEq::ct_eq(&digest.view_tag(), &expected_tag).into()
}

/// View tag distribution tracker.
///
/// Useful for analyzing the distribution of view tags in a registry.
#[derive(Debug, Clone)]
pub struct ViewTagStats {
    /// Count of each view tag value
    pub distribution: Vec<u64>,
    /// Total number of tags analyzed
    pub total: u64,
}

impl Default for ViewTagStats {
    fn default() -> Self {
        Self {
            distribution: vec![0; VIEW_TAG_SPACE],
            total: 0,
        }
    }
}

impl ViewTagStats {
    /// Creates a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a view tag.
    pub fn add(&mut self, tag: u8) {
        self.distribution[tag as usize] += 1;
        self.total += 1;
    }

    /// Returns the most common view tag.
    pub fn most_common(&self) -> Option<(u8, u64)> {
        if self.total == 0 {
            return None;
        }

        self.distribution
            .iter()
            .enumerate()
            .max_by_key(|(_, &count)| count)
            .map(|(tag, &count)| (tag as u8, count))
    }

    /// Returns the expected count per tag for uniform distribution.
    pub fn expected_uniform_count(&self) -> f64 {
        self.total as f64 / VIEW_TAG_SPACE as f64
    }

    /// Computes chi-squared statistic for uniformity test.
    pub fn chi_squared(&self) -> f64 {
        let expected = self.expected_uniform_count();
        if expected == 0.0 {
            return 0.0;
        }

        self.distribution
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                (diff * diff) / expected
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{ecdh, generate_keypair};
    use crate::hash::keccak256;
    use rand::Rng;

    #[test]
    fn test_view_tag_is_first_digest_byte() {
        let a = generate_keypair();
        let b = generate_keypair();
        let shared = ecdh(&a.secret, &b.public).unwrap();

        assert_eq!(compute_view_tag(&shared), keccak256(shared.as_bytes())[0]);
    }

    #[test]
    fn test_verify_view_tag() {
        let a = generate_keypair();
        let b = generate_keypair();
        let digest = hash_shared_secret(&ecdh(&a.secret, &b.public).unwrap());
        let correct_tag = digest.view_tag();

        assert!(verify_view_tag(&digest, correct_tag));
        assert!(!verify_view_tag(&digest, correct_tag.wrapping_add(1)));
    }

    #[test]
    fn test_view_tag_distribution() {
        let mut rng = rand::thread_rng();
        let mut stats = ViewTagStats::new();

        for _ in 0..10_000 {
            let mut bytes = [0u8; 33];
            bytes[0] = 0x02;
            rng.fill(&mut bytes[1..]);
            stats.add(compute_view_tag(&SharedSecret::from_array(bytes)));
        }

        // 255 degrees of freedom, critical value at p=0.001 is ~330
        let chi_sq = stats.chi_squared();
        assert!(chi_sq < 500.0, "View tags are not uniformly distributed: χ² = {}", chi_sq);
    }

    #[test]
    fn test_view_tag_stats() {
        let mut stats = ViewTagStats::new();
        assert!(stats.most_common().is_none());

        stats.add(0);
        stats.add(0);
        stats.add(1);
        stats.add(255);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.distribution[0], 2);
        assert_eq!(stats.distribution[255], 1);
        assert_eq!(stats.most_common(), Some((0, 2)));
    }
}
