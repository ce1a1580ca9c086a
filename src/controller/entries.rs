use actix_web::dev::HttpServiceFactory;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, Responder, ResponseError};

use chrono::Utc;

use serde::{Deserialize, Serialize};

use serde_json::json;

use thiserror::Error;

use uuid::Uuid;

use crate::app::Integrations;
use crate::client::CommerceError;
use crate::domain::PhoneNumber;
use crate::model::{provenance_metadata, ContestEntry, Customer};
use crate::settings::CommerceConfigFlags;
use crate::upsert::{CustomerUpsert, UpsertError};

const REQUIRED_FIELDS_MESSAGE: &str = "First name, last name, and email are required";
const ENTERED_MESSAGE: &str = "You're entered to win!";

/// JSON deserialization wrapper for parsing contest entries
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryForm {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl TryInto<ContestEntry> for EntryForm {
    type Error = String;

    fn try_into(self) -> Result<ContestEntry, Self::Error> {
        let first_name = self.first_name.unwrap_or_default();
        let last_name = self.last_name.unwrap_or_default();
        let email = self.email.unwrap_or_default();

        if first_name.trim().is_empty() || last_name.trim().is_empty() || email.trim().is_empty() {
            return Err(REQUIRED_FIELDS_MESSAGE.into());
        }

        let first_name = first_name.parse()?;
        let last_name = last_name.parse()?;
        let email = email.parse()?;
        let phone = self
            .phone
            .filter(|phone| !phone.trim().is_empty())
            .map(|phone| PhoneNumber::normalized(&phone));

        Ok(ContestEntry {
            first_name,
            last_name,
            email,
            phone,
        })
    }
}

/// Create endpoint for contest entries.
///
/// The customer upsert decides the overall outcome; the marketing mirror is
/// best-effort and only ever reflected in the integrations block.
#[tracing::instrument(name = "Enter the contest", skip(integrations, form))]
#[post("")]
async fn create(
    integrations: web::Data<Integrations>,
    form: web::Json<EntryForm>,
) -> Result<impl Responder, EntryError> {
    // Parse the entry form before touching either platform
    let entry: ContestEntry = form.into_inner().try_into().map_err(EntryError::Validation)?;

    let entered_at = Utc::now();
    let metadata = provenance_metadata(entered_at);

    let customer = match integrations.commerce.as_ref() {
        Some(commerce) => {
            let customer = CustomerUpsert::new(commerce)
                .run(&entry, &metadata)
                .await
                .map_err(|error| {
                    EntryError::for_upsert(error, integrations.commerce_flags.clone())
                })?;
            Some(customer)
        }
        None => {
            tracing::warn!("Commerce platform is not configured, skipping the customer upsert");
            None
        }
    };

    let mirrored = match integrations.marketing.as_ref() {
        Some(marketing) => match marketing.mirror_entry(&entry, entered_at).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    error.cause_chain = ?error,
                    "Failed to mirror the entry to the marketing platform"
                );
                false
            }
        },
        None => false,
    };

    let response = EntryResponse {
        success: true,
        message: ENTERED_MESSAGE,
        customer_id: customer.as_ref().map(|customer| customer.id),
        integrations: IntegrationOutcome {
            commerce7: customer.is_some(),
            klaviyo: mirrored,
        },
        customer,
    };

    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryResponse {
    success: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<Customer>,
    integrations: IntegrationOutcome,
}

/// Per-platform outcome flags echoed to the caller
#[derive(Debug, Serialize)]
struct IntegrationOutcome {
    commerce7: bool,
    klaviyo: bool,
}

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("{0}")]
    Validation(String),

    #[error("Commerce platform configuration is incomplete")]
    Misconfigured { debug: CommerceConfigFlags },

    #[error("Failed to create or update customer")]
    Upstream {
        source: CommerceError,
        debug: CommerceConfigFlags,
    },
}

impl EntryError {
    fn for_upsert(error: UpsertError, debug: CommerceConfigFlags) -> Self {
        match error {
            UpsertError::TagNotConfigured => Self::Misconfigured { debug },
            UpsertError::Commerce(source) => Self::Upstream { source, debug },
        }
    }
}

impl ResponseError for EntryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Misconfigured { .. } | Self::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation(_) => json!({ "error": self.to_string() }),
            Self::Misconfigured { debug } => json!({
                "error": self.to_string(),
                "debug": debug,
            }),
            Self::Upstream { source, debug } => {
                let mut body = json!({
                    "error": self.to_string(),
                    "details": source.details(),
                    "debug": debug,
                });
                if let Some(status) = source.upstream_status() {
                    body["status"] = json!(status.as_u16());
                }
                body
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Contest entry API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/contest").service(create)
}
