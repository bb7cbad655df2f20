//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart store
//! - `order` - Order references and chat handoff
//! - `restock` - Restock sign-up de-duplication and creation

pub mod cart;
pub mod order;
pub mod restock;

pub use cart::{CartStorage, CartStorageError, CartStore};
