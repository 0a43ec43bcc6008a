//! Dualstake Common Library
//!
//! Shared types, constants, and utilities for the dual-pool staking allocator.
//!
//! ## Model
//!
//! A delegation-pool client stakes through a *pair* of pools. Each pool is
//! only productive while its balance sits at or above the network's minimum
//! participation stake. The allocator decides how a stake or unstake amount
//! is split across the pair:
//!
//! - **Amounts** are unsigned integers in the chain's smallest unit
//!   (no floating point anywhere)
//! - **Requests** carry the on-chain readings the caller fetched beforehand
//! - **Plans** carry the resulting split plus the decision that produced it
//! - **Events** record every allocation for off-chain indexing
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec and String for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{string::String, vec::Vec};
#[cfg(feature = "std")]
pub use std::{string::String, vec::Vec};

pub mod constants;
pub mod errors;
pub mod events;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use events::*;
pub use math::*;
pub use types::*;
