//! Session-related types.
//!
//! The session is the visitor's storage slot: it holds the cart and nothing
//! that identifies a person.

/// Session keys.
pub mod keys {
    /// Key for the JSON-serialized cart line list.
    pub const CART: &str = "cart";
}
