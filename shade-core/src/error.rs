//! Error types for SHADE.
//!
//! This module provides the error hierarchy for the protocol core using `thiserror`.
//! A view-tag mismatch during scanning is not an error and never appears here.

use thiserror::Error;

/// Result type alias using `ShadeError`.
pub type Result<T> = std::result::Result<T, ShadeError>;

/// Main error type for all SHADE operations.
#[derive(Debug, Error)]
pub enum ShadeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Scalar is zero or not below the curve order.
    #[error("Scalar out of range: must satisfy 0 < k < n")]
    InvalidRange,

    /// Bytes do not decode to a point on the curve.
    #[error("Invalid curve point: {0}")]
    InvalidPoint(String),

    /// Point addition produced the identity element.
    #[error("Point addition produced the point at infinity")]
    PointAtInfinity,

    /// Invalid key size.
    #[error("Invalid key: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Required length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// View tag matched but the recovered key does not control the announced address.
    #[error("Recovery mismatch: announced {expected}, derived {derived}")]
    RecoveryMismatch {
        /// Stealth address carried by the announcement
        expected: String,
        /// Address derived from the recovered key
        derived: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // STEALTH ADDRESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid meta-address format or content.
    #[error("Malformed meta-address: {0}")]
    MalformedMetaAddress(String),

    /// Invalid Ethereum address format.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Announcement uses a scheme this implementation does not process.
    #[error("Unsupported scheme id: {0}")]
    UnsupportedScheme(u64),

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Identifier or record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid announcement format.
    #[error("Invalid announcement: {0}")]
    InvalidAnnouncement(String),

    /// Announcement already published.
    #[error("Duplicate announcement: {0}")]
    DuplicateAnnouncement(String),

    /// Registry is corrupted or unusable.
    #[error("Registry error: {0}")]
    RegistryError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// File format version mismatch.
    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads
        expected: u8,
        /// Version found in the file
        actual: u8,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ShadeError {
    /// Returns true if the operation can be retried with fresh randomness.
    ///
    /// For generation a `PointAtInfinity` means "retry with a new ephemeral key".
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ShadeError::PointAtInfinity | ShadeError::InvalidRange)
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            ShadeError::InvalidRange
                | ShadeError::InvalidPoint(_)
                | ShadeError::PointAtInfinity
                | ShadeError::InvalidKeySize { .. }
                | ShadeError::RecoveryMismatch { .. }
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ShadeError::ValidationError(_)
                | ShadeError::MalformedMetaAddress(_)
                | ShadeError::InvalidAddress(_)
                | ShadeError::InvalidAnnouncement(_)
                | ShadeError::UnsupportedScheme(_)
                | ShadeError::VersionMismatch { .. }
        )
    }

    /// Returns true if the error signals sender/recipient disagreement
    /// rather than a routine failure. These should be logged or alerted on.
    pub fn is_protocol_inconsistency(&self) -> bool {
        matches!(self, ShadeError::RecoveryMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShadeError::InvalidKeySize {
            expected: 33,
            actual: 65,
        };
        assert!(err.to_string().contains("33"));
        assert!(err.to_string().contains("65"));

        let err = ShadeError::VersionMismatch {
            expected: 1,
            actual: 9,
        };
        assert_eq!(err.to_string(), "Version mismatch: expected 1, got 9");
    }

    #[test]
    fn test_error_classification() {
        assert!(ShadeError::PointAtInfinity.is_recoverable());
        assert!(!ShadeError::InvalidPoint("bad".into()).is_recoverable());

        assert!(ShadeError::InvalidPoint("bad".into()).is_crypto_error());
        assert!(!ShadeError::NotFound("alice".into()).is_crypto_error());

        assert!(ShadeError::MalformedMetaAddress("x".into()).is_validation_error());
        assert!(ShadeError::UnsupportedScheme(2).is_validation_error());
    }

    #[test]
    fn test_recovery_mismatch_is_distinct() {
        let err = ShadeError::RecoveryMismatch {
            expected: "0xaa".into(),
            derived: "0xbb".into(),
        };
        assert!(err.is_protocol_inconsistency());
        assert!(!ShadeError::PointAtInfinity.is_protocol_inconsistency());
        assert!(err.to_string().contains("0xaa"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(ShadeError::from);
        assert!(matches!(result, Err(ShadeError::JsonError(_))));
    }
}
