//! Subscriber API request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::subscriber::{EmailConsent, EmailStatus, Subscriber, SubscriberList};
use crate::infrastructure::subscriber::SubscriberPatch;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_status: EmailStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            id: subscriber.id,
            email: subscriber.email,
            first_name: subscriber.first_name,
            last_name: subscriber.last_name,
            email_status: subscriber.email_status,
            created_at: subscriber.created_at,
            updated_at: subscriber.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberListResponse {
    pub subscriber_id: String,
    pub list_id: String,
    pub email_consent: EmailConsent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriberList> for SubscriberListResponse {
    fn from(membership: SubscriberList) -> Self {
        Self {
            subscriber_id: membership.subscriber_id,
            list_id: membership.list_id,
            email_consent: membership.email_consent,
            created_at: membership.created_at,
            updated_at: membership.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriberRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
}

impl From<UpdateSubscriberRequest> for SubscriberPatch {
    fn from(request: UpdateSubscriberRequest) -> Self {
        Self {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailStatusRequest {
    pub email_status: EmailStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddSubscriberToListRequest {
    #[validate(length(min = 1))]
    pub list_id: String,
    #[serde(default)]
    pub email_consent: EmailConsent,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSubscriberFromListRequest {
    #[validate(length(min = 1))]
    pub list_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailConsentRequest {
    #[validate(length(min = 1))]
    pub list_id: String,
    pub email_consent: EmailConsent,
}

/// Reads only `listId` from a body that has not been validated yet
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIdProbe {
    #[serde(default)]
    pub list_id: Option<serde_json::Value>,
}

impl ListIdProbe {
    /// `None` for a missing, empty or non-string `listId`, or an unreadable body
    pub fn list_id(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .and_then(|probe| probe.list_id)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_id_probe() {
        assert_eq!(
            ListIdProbe::list_id(br#"{"listId":"list-1","emailConsent":"subscribed"}"#),
            Some("list-1".to_string())
        );
        assert_eq!(ListIdProbe::list_id(br#"{"listId":42}"#), None);
        assert_eq!(ListIdProbe::list_id(br#"{"listId":""}"#), None);
        assert_eq!(ListIdProbe::list_id(br#"{}"#), None);
        assert_eq!(ListIdProbe::list_id(b"not json"), None);
    }

    #[test]
    fn test_update_subscriber_validation() {
        let request: UpdateSubscriberRequest =
            serde_json::from_str(r#"{"email":"not-an-email"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: UpdateSubscriberRequest =
            serde_json::from_str(r#"{"email":"ada@acme.test","firstName":"Ada"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_add_request_defaults_consent() {
        let request: AddSubscriberToListRequest =
            serde_json::from_str(r#"{"listId":"list-1"}"#).unwrap();
        assert_eq!(request.email_consent, EmailConsent::Subscribed);
    }

    #[test]
    fn test_response_is_camel_case() {
        let subscriber = Subscriber::new(crate::domain::AccountId::new("acme").unwrap(), "a@b.test")
            .with_name("Ada", "Lovelace");
        let json = serde_json::to_value(SubscriberResponse::from(subscriber)).unwrap();

        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["emailStatus"], "active");
        assert!(json.get("first_name").is_none());
    }
}
