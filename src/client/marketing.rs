use std::time::Duration;

use anyhow::Context;

use chrono::{DateTime, SecondsFormat, Utc};

use reqwest::{header, Client};

use serde::Serialize;

use secrecy::Secret;

use url::Url;

use crate::model::{ContestEntry, CONTEST_PRIZE};

const API_KEY_SCHEME: &str = "Klaviyo-API-Key";
const REVISION_HEADER: &str = "revision";
const API_REVISION: &str = "2024-10-15";

/// REST client for the marketing-automation platform.
///
/// Creating the profile is the whole mirror; list subscription is
/// intentionally not performed, the profile properties carry the campaign.
#[derive(Debug)]
pub struct MarketingClient {
    client: Client,
    api_profiles_url: Url,
    api_key: Secret<String>,
}

impl MarketingClient {
    pub fn new(
        api_base_url: Url,
        api_timeout: Duration,
        api_key: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_profiles_url = api_base_url
            .join("profiles/")
            .context("Failed to create profiles endpoint URL")?;

        Ok(Self {
            client,
            api_profiles_url,
            api_key,
        })
    }

    /// Mirror a contest entry as a marketing profile with campaign properties
    #[tracing::instrument(name = "Mirror an entry to the marketing platform", skip(self))]
    pub async fn mirror_entry(
        &self,
        entry: &ContestEntry,
        entered_at: DateTime<Utc>,
    ) -> reqwest::Result<()> {
        use secrecy::ExposeSecret;

        let body = ProfileRequest::for_entry(entry, entered_at);

        self.client
            .post(self.api_profiles_url.clone())
            .header(
                header::AUTHORIZATION,
                format!("{} {}", API_KEY_SCHEME, self.api_key.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .header(REVISION_HEADER, API_REVISION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ProfileRequest {
    data: Vec<Profile>,
}

impl ProfileRequest {
    fn for_entry(entry: &ContestEntry, entered_at: DateTime<Utc>) -> Self {
        // The platform rejects profiles carrying a phone number it cannot
        // route SMS to, so short numbers are withheld entirely.
        let phone_number = entry
            .phone
            .as_ref()
            .filter(|phone| phone.is_sms_capable())
            .map(|phone| phone.as_ref().to_string());

        let attributes = ProfileAttributes {
            email: entry.email.as_ref().to_string(),
            first_name: entry.first_name.as_ref().to_string(),
            last_name: entry.last_name.as_ref().to_string(),
            phone_number,
            properties: ProfileProperties {
                campaign_member: true,
                contest_entry_date: entered_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                contest_prize: CONTEST_PRIZE,
            },
        };

        Self {
            data: vec![Profile {
                kind: "profile",
                attributes,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Profile {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: ProfileAttributes,
}

#[derive(Debug, Serialize)]
struct ProfileAttributes {
    email: String,
    first_name: String,
    last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    properties: ProfileProperties,
}

#[derive(Debug, Serialize)]
struct ProfileProperties {
    #[serde(rename = "2025_wine_and_food_fest")]
    campaign_member: bool,
    contest_entry_date: String,
    contest_prize: &'static str,
}
