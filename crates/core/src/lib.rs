//! Ra9ia Core - Shared types library.
//!
//! This crate provides the domain logic shared by the storefront:
//! - cart line items and the cart itself
//! - the single pricing module both the cart and order messages use
//! - order message composition
//! - Telegram / WhatsApp deep-link construction
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no session
//! access, no HTTP clients. Persistence is the caller's job: a [`cart::Cart`]
//! serializes to and restores from a plain string.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`cart`] - Line items keyed by product, color and size
//! - [`pricing`] - Line totals, subtotals and item counts
//! - [`order`] - Order message composer
//! - [`handoff`] - Chat deep links and destination resolution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod handoff;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartLineItem, LineKey};
pub use handoff::{Channel, ContactSettings, HandoffError};
pub use order::{CustomerContact, OrderMessage, OrderReference, ShippingAddress};
pub use types::*;
