//! Subscriber domain
//!
//! The business collaborator behind the guarded endpoints.

mod entity;
mod repository;

pub use entity::{EmailConsent, EmailStatus, List, Page, Subscriber, SubscriberList};
pub use repository::SubscriberRepository;
