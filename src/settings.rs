use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use secrecy::Secret;

use serde::{Deserialize, Serialize};
use serde_aux::prelude::*;

use url::Url;

use uuid::Uuid;

use crate::client::{CommerceClient, CommerceCredentials, MarketingClient};

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub commerce: CommerceSettings,
    pub marketing: MarketingSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        let path = env::current_dir()?.join("settings");

        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }

    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            .add_source(File::from(base_path.join("base")).required(true))
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
}

impl ApplicationSettings {
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

/// Commerce platform connection settings.
/// Credentials are optional as a group: with none of them set the customer
/// upsert is skipped entirely rather than failing entries.
#[derive(Debug, Deserialize)]
pub struct CommerceSettings {
    api_base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,

    app_id: Option<String>,
    secret_key: Option<Secret<String>>,
    tenant_id: Option<String>,
    contest_tag_id: Option<String>,
}

impl CommerceSettings {
    pub fn api_base_url(&self) -> Url {
        Url::parse(&self.api_base_url).expect("Failed to parse commerce base URL")
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_milliseconds)
    }

    /// Presence flags safe to echo into logs and error payloads.
    /// The tenant id is the only non-secret identifier exposed verbatim.
    pub fn flags(&self) -> CommerceConfigFlags {
        CommerceConfigFlags {
            has_app_id: self.app_id.is_some(),
            has_secret_key: self.secret_key.is_some(),
            has_tenant_id: self.tenant_id.is_some(),
            has_tag_id: self.contest_tag_id.is_some(),
            tenant_id: self.tenant_id.clone(),
        }
    }

    pub fn credentials(&self) -> Option<CommerceCredentials> {
        match (&self.app_id, &self.secret_key, &self.tenant_id) {
            (Some(app_id), Some(secret_key), Some(tenant_id)) => Some(CommerceCredentials {
                app_id: app_id.clone(),
                secret_key: secret_key.clone(),
                tenant_id: tenant_id.clone(),
            }),
            _ => None,
        }
    }

    /// Build the commerce client, or `None` when the integration is not
    /// configured at all. Partially configured credentials are a startup
    /// error; a missing tag id is deferred to request handling.
    pub fn client(&self) -> anyhow::Result<Option<CommerceClient>> {
        let credentials = match self.credentials() {
            Some(credentials) => credentials,
            None => {
                if self.app_id.is_some() || self.secret_key.is_some() || self.tenant_id.is_some() {
                    anyhow::bail!("Commerce platform credentials are partially configured");
                }
                return Ok(None);
            }
        };

        let contest_tag_id = self
            .contest_tag_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .context("Failed to parse contest tag id")?;

        let client = CommerceClient::new(
            self.api_base_url(),
            self.api_timeout(),
            &credentials,
            contest_tag_id,
        )?;

        Ok(Some(client))
    }
}

/// Boolean presence view of the commerce configuration, never secret values
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceConfigFlags {
    pub has_app_id: bool,
    pub has_secret_key: bool,
    pub has_tenant_id: bool,
    pub has_tag_id: bool,
    pub tenant_id: Option<String>,
}

/// Marketing platform connection settings
#[derive(Debug, Deserialize)]
pub struct MarketingSettings {
    api_base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,

    api_key: Option<Secret<String>>,
    list_id: Option<String>,
}

impl MarketingSettings {
    pub fn api_base_url(&self) -> Url {
        Url::parse(&self.api_base_url).expect("Failed to parse marketing base URL")
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_milliseconds)
    }

    /// Build the marketing client, or `None` when the mirror is disabled.
    /// Both the API key and the list id must be configured for the mirror to
    /// run, even though profile creation alone does not consume the list id.
    pub fn client(&self) -> anyhow::Result<Option<MarketingClient>> {
        match (&self.api_key, &self.list_id) {
            (Some(api_key), Some(_list_id)) => {
                let client = MarketingClient::new(
                    self.api_base_url(),
                    self.api_timeout(),
                    api_key.clone(),
                )?;
                Ok(Some(client))
            }
            (None, None) => Ok(None),
            _ => anyhow::bail!("Marketing platform credentials are partially configured"),
        }
    }
}
