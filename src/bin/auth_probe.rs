//! Ad-hoc probe for the commerce platform's accepted authentication shapes.
//!
//! Tries the documented Basic + Tenant header pair alongside the variants
//! support has suggested over time, printing pass/fail per shape. Secrets
//! are reported as presence and length only.

use anyhow::Context;

use reqwest::{header, Client};

use secrecy::ExposeSecret;

use contest_entry::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    let credentials = settings
        .commerce
        .credentials()
        .context("Commerce credentials are not configured")?;

    let probe_url = settings
        .commerce
        .api_base_url()
        .join("customer")
        .context("Failed to create customer endpoint URL")?;

    let client = Client::builder()
        .timeout(settings.commerce.api_timeout())
        .build()
        .context("Failed to build http client")?;

    println!("probing {}", probe_url);
    println!("app id: {}", credentials.app_id);
    println!(
        "secret key: set ({} chars)",
        credentials.secret_key.expose_secret().len()
    );
    println!("tenant id: {}", credentials.tenant_id);
    println!();

    let basic = credentials.basic_authorization();

    let shapes = vec![
        (
            "Basic + Tenant",
            client
                .get(probe_url.clone())
                .header(header::AUTHORIZATION, basic.expose_secret())
                .header("Tenant", &credentials.tenant_id),
        ),
        (
            "Basic + X-Tenant",
            client
                .get(probe_url.clone())
                .header(header::AUTHORIZATION, basic.expose_secret())
                .header("X-Tenant", &credentials.tenant_id),
        ),
        (
            "Bearer secret key",
            client
                .get(probe_url.clone())
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", credentials.secret_key.expose_secret()),
                )
                .header("Tenant", &credentials.tenant_id),
        ),
        (
            "X-API-Key",
            client
                .get(probe_url.clone())
                .header("X-API-Key", credentials.secret_key.expose_secret())
                .header("Tenant", &credentials.tenant_id),
        ),
    ];

    for (name, request) in shapes {
        match request.query(&[("limit", "1")]).send().await {
            Ok(response) if response.status().is_success() => println!("{name}: accepted"),
            Ok(response) => println!("{name}: rejected ({})", response.status()),
            Err(error) => println!("{name}: request failed ({error})"),
        }
    }

    Ok(())
}
