// Ledger constants shared by mining, validation and submission checks

// ========== Genesis ==========
/// `previous_hash` carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Genesis timestamp (ms). Fixed so every ledger starts from the same block hash.
pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000_000;

pub const GENESIS_NONCE: u64 = 0;

// ========== Merkle ==========
/// Text hashed to form the root of a block without transactions.
/// Must never equal the empty string, so an empty block still commits to something.
pub const EMPTY_MERKLE_SENTINEL: &str = "EMPTY_BLOCK";

// ========== Submission limits ==========
pub const MAX_PRODUCT_NAME_LEN: usize = 256;
pub const MAX_DETAILS_LEN: usize = 16 * 1024;

/// Clock drift tolerated on submitted timestamps: 2 hours, in ms
pub const MAX_FUTURE_TIMESTAMP_MS: i64 = 2 * 60 * 60 * 1000;

