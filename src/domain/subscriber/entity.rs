//! Subscriber, list and membership entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::AccountId;

/// Account-wide email deliverability state of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    Active,
    /// Unsubscribed from every list
    Unsubscribed,
    /// Marked a message as spam
    Spam,
    Bounced,
}

/// Per-list consent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailConsent {
    #[default]
    Subscribed,
    Unsubscribed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub account_id: AccountId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_status: EmailStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(account_id: AccountId, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            email: email.into(),
            first_name: None,
            last_name: None,
            email_status: EmailStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Mailing list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub account_id: AccountId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl List {
    pub fn new(account_id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Membership of a subscriber in a list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberList {
    pub subscriber_id: String,
    pub list_id: String,
    pub email_consent: EmailConsent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriberList {
    pub fn new(
        subscriber_id: impl Into<String>,
        list_id: impl Into<String>,
        email_consent: EmailConsent,
    ) -> Self {
        let now = Utc::now();
        Self {
            subscriber_id: subscriber_id.into(),
            list_id: list_id.into(),
            email_consent,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Offset pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }

    /// Apply the window to an already-ordered sequence
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}
