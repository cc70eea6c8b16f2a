//! Crave & Dine Storefront - cart and checkout subsystem.
//!
//! This crate owns the client-side cart state and drives payment to
//! completion against the restaurant backend and the Razorpay gateway.
//!
//! # Architecture
//!
//! - [`cart::CartStore`] - sole owner of cart lines and all derived totals,
//!   persisted to a namespaced JSON store after every mutation
//! - [`payment::CheckoutOrchestrator`] - sequences the three-step payment
//!   protocol (create order, collect payment, verify) and clears the cart
//!   only after the backend confirms the payment
//! - [`backend::BackendClient`] - REST client for the ordering backend
//! - [`payment::gateway`] - awaitable wrapper around the Razorpay checkout
//!   widget hosted by the embedding UI
//!
//! The orchestrator never mutates cart lines directly; it reads a snapshot
//! and signals `clear` on verified success.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod payment;
