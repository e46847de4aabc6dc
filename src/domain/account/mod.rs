//! Account domain
//!
//! Accounts own API keys, subscribers and lists. Every ownership check
//! compares a resource's owning account against the caller's account.

mod entity;

pub use entity::AccountId;
