use std::time::Duration;

use anyhow::Context;

use reqwest::{header, Client, Response, StatusCode};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use secrecy::Secret;

use thiserror::Error;

use url::Url;

use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::model::{Customer, CustomerPayload};

const TENANT_HEADER: &str = "Tenant";

/// REST client for the commerce platform's customer API.
///
/// Constructed once per process; holds the pre-built Basic authorization
/// value so credentials are never re-encoded per request.
#[derive(Debug)]
pub struct CommerceClient {
    client: Client,
    api_customer_url: Url,

    authorization: Secret<String>,
    tenant_id: String,
    contest_tag_id: Option<Uuid>,
}

impl CommerceClient {
    pub fn new(
        api_base_url: Url,
        api_timeout: Duration,
        credentials: &CommerceCredentials,
        contest_tag_id: Option<Uuid>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_customer_url = api_base_url
            .join("customer")
            .context("Failed to create customer endpoint URL")?;

        let authorization = credentials.basic_authorization();
        let tenant_id = credentials.tenant_id.clone();

        Ok(Self {
            client,
            api_customer_url,
            authorization,
            tenant_id,
            contest_tag_id,
        })
    }

    /// The tag attached to every contest entrant, if configured
    pub fn contest_tag_id(&self) -> Option<Uuid> {
        self.contest_tag_id
    }

    /// Search the platform for a customer record matching an email address.
    /// Returns the first match; match semantics are platform-defined.
    #[tracing::instrument(name = "Search for a customer by email", skip(self))]
    pub async fn search_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Customer>, CommerceError> {
        let response = self
            .client
            .get(self.api_customer_url.clone())
            .query(&[("q", email.as_ref())])
            .header(header::AUTHORIZATION, self.expose_authorization())
            .header(TENANT_HEADER, &self.tenant_id)
            .send()
            .await?;

        let page: CustomerSearchPage = Self::into_api_result(response).await?;

        Ok(page.customers.into_iter().next())
    }

    /// Create a new customer record, returning it with its platform-assigned id
    #[tracing::instrument(name = "Create a customer", skip(self, payload))]
    pub async fn create(&self, payload: &CustomerPayload) -> Result<Customer, CommerceError> {
        let response = self
            .client
            .post(self.api_customer_url.clone())
            .header(header::AUTHORIZATION, self.expose_authorization())
            .header(TENANT_HEADER, &self.tenant_id)
            .json(payload)
            .send()
            .await?;

        Self::into_api_result(response).await
    }

    /// Update an existing customer record keyed by its id
    #[tracing::instrument(name = "Update a customer", skip(self, payload))]
    pub async fn update(
        &self,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, CommerceError> {
        let url = format!("{}/{}", self.api_customer_url, id);

        let response = self
            .client
            .put(url)
            .header(header::AUTHORIZATION, self.expose_authorization())
            .header(TENANT_HEADER, &self.tenant_id)
            .json(payload)
            .send()
            .await?;

        Self::into_api_result(response).await
    }

    fn expose_authorization(&self) -> &str {
        use secrecy::ExposeSecret;

        self.authorization.expose_secret()
    }

    async fn into_api_result<T: DeserializeOwned>(response: Response) -> Result<T, CommerceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            Err(CommerceError::Api {
                status,
                message: body.message,
                errors: body.errors,
            })
        }
    }
}

/// Credentials identifying this application and tenant to the platform
#[derive(Debug)]
pub struct CommerceCredentials {
    pub app_id: String,
    pub secret_key: Secret<String>,
    pub tenant_id: String,
}

impl CommerceCredentials {
    /// Build the 'Basic <base64 app_id:secret>' authorization value
    pub fn basic_authorization(&self) -> Secret<String> {
        use base64::Engine;
        use secrecy::ExposeSecret;

        let credentials = format!("{}:{}", self.app_id, self.secret_key.expose_secret());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);

        Secret::new(format!("Basic {}", encoded))
    }
}

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("Failed to reach the commerce platform: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Commerce platform returned {status}")]
    Api {
        status: StatusCode,
        message: Option<String>,
        errors: Vec<FieldError>,
    },
}

impl CommerceError {
    /// Upstream HTTP status, when the platform produced a response
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }

    /// Platform error messages flattened into a human-readable string
    pub fn details(&self) -> String {
        match self {
            Self::Transport(error) => error.to_string(),
            Self::Api {
                message, errors, ..
            } if errors.is_empty() => message
                .clone()
                .unwrap_or_else(|| "No further details provided".into()),
            Self::Api { errors, .. } => errors
                .iter()
                .map(FieldError::describe)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One field-level validation error from the platform
#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: Option<String>,
}

impl FieldError {
    fn describe(&self) -> String {
        format!(
            "{}: {}",
            self.field.as_deref().unwrap_or("unknown field"),
            self.message.as_deref().unwrap_or("Invalid value")
        )
    }
}

#[derive(Debug, Deserialize)]
struct CustomerSearchPage {
    #[serde(default)]
    customers: Vec<Customer>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}
