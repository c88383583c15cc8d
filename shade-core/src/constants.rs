//! Protocol constants for SHADE.
//!
//! Sizes follow SEC1 encodings of secp256k1 points and the ERC-5564 / ERC-6538
//! wire formats.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a private key (scalar) in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a compressed public key in bytes (parity prefix + x-coordinate).
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Size of an uncompressed public key in bytes (0x04 + x + y).
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Order `n` of the secp256k1 group, big-endian.
///
/// Every scalar in the protocol is reduced modulo this value.
pub const CURVE_ORDER: [u8; PRIVATE_KEY_SIZE] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
    0x41, 0x41,
];

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TAG CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of view tag in bytes.
/// Using 1 byte gives 99.6% filtering efficiency (1/256 false positive rate).
pub const VIEW_TAG_SIZE: usize = 1;

/// Number of possible view tag values (2^8 = 256).
pub const VIEW_TAG_SPACE: usize = 256;

/// Expected filtering efficiency as a percentage.
pub const VIEW_TAG_EFFICIENCY: f64 = 99.609375; // (255/256) * 100

// ═══════════════════════════════════════════════════════════════════════════════
// ERC-5564 / ERC-6538
// ═══════════════════════════════════════════════════════════════════════════════

/// Scheme identifier for the secp256k1 stealth address scheme.
pub const SCHEME_ID_SECP256K1: u64 = 1;

/// Scheme tag of a stealth meta-address string.
pub const META_ADDRESS_SCHEME_TAG: &str = "st";

/// Network tag of a stealth meta-address string.
pub const META_ADDRESS_CHAIN_TAG: &str = "eth";

/// Canonical prefix of an encoded meta-address.
pub const META_ADDRESS_PREFIX: &str = "st:eth:0x";

/// Size of a meta-address in bytes (spending key + viewing key).
pub const META_ADDRESS_SIZE: usize = 2 * COMPRESSED_PUBLIC_KEY_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of Ethereum address in bytes (20 bytes = 160 bits).
pub const ETH_ADDRESS_SIZE: usize = 20;

/// Size of keccak256 hash output.
pub const KECCAK256_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// PERFORMANCE TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default batch size for scanning announcements.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1000;

/// Maximum announcements to scan in a single request.
pub const MAX_SCAN_BATCH_SIZE: usize = 10_000;
