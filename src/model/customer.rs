use serde::{Deserialize, Serialize};

use serde_json::Value;

use uuid::Uuid;

use crate::model::Metadata;

/// A customer record as stored by the commerce platform.
///
/// The id is assigned by the platform on creation and is opaque to this
/// service. Fields we do not model are captured in `extra` so the record can
/// be echoed back to the caller wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<CustomerEmail>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<CustomerPhone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_marketing_status: Option<EmailMarketingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Metadata>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Create/update request body for a customer record.
///
/// The same shape serves both writes: `emails` is only sent on create, and
/// optional sections are omitted entirely rather than sent as null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<CustomerEmail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<CustomerPhone>>,
    pub email_marketing_status: EmailMarketingStatus,
    pub tags: Vec<TagRef>,
    pub country_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Metadata>,
}

/// Reference to a platform-defined tag, identified only by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPhone {
    pub phone: String,
}

/// Marketing-subscription state on the platform side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailMarketingStatus {
    Subscribed,
    Unsubscribed,
    #[serde(other)]
    Unknown,
}
