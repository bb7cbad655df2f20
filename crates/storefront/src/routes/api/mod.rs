//! JSON API endpoints.

pub mod restock;
