//! Allocator Constants
//!
//! Network defaults used when the caller does not override them with
//! on-chain readings.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (validator-grade participation stake)
//! - Default (no feature) - Testnet values (small stakes for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! dualstake-common = { path = "...", features = ["mainnet"] }
//! ```

/// Token Metadata
pub mod token {
    /// One whole token in smallest units
    pub const ONE: u128 = 1_000_000_000;
}

/// Pool Parameters
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod pool {
    use super::token::ONE;

    /// Number of pools in a delegation pair
    pub const POOL_COUNT: usize = 2;

    /// Default minimum participation stake for a pool to be active
    /// - Mainnet: 300,000 tokens
    /// - Testnet: 10 tokens
    #[cfg(feature = "mainnet")]
    pub const MIN_PARTICIPATION_STAKE: u128 = 300_000 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const MIN_PARTICIPATION_STAKE: u128 = 10 * ONE;

    /// Default minimum single stake accepted by a pool
    /// - Mainnet: 10 tokens
    /// - Testnet: 1 token
    #[cfg(feature = "mainnet")]
    pub const MIN_POOL_STAKE: u128 = 10 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const MIN_POOL_STAKE: u128 = ONE;
}

/// Request fingerprint domain tags
pub mod fingerprint {
    /// Domain tag for stake requests
    pub const STAKE_TAG: &[u8] = b"dualstake/stake/v1";
    /// Domain tag for unstake requests
    pub const UNSTAKE_TAG: &[u8] = b"dualstake/unstake/v1";
    /// Domain tag for pool selection requests
    pub const SELECT_TAG: &[u8] = b"dualstake/select/v1";
}
