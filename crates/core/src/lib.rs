//! Crave & Dine Core - Shared types library.
//!
//! This crate provides common types used across all Crave & Dine components:
//! - `storefront` - Cart and checkout subsystem for the ordering site
//! - `integration-tests` - Cross-crate test suite
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no storage. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, addresses, and
//!   payment states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
