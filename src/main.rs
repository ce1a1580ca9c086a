use std::net::TcpListener;

use anyhow::Context;

use contest_entry::app::{self, Integrations};
use contest_entry::settings::Settings;
use contest_entry::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().expect("Failed to load settings");

    let integrations = Integrations::from_settings(&settings)?;

    let listener = TcpListener::bind(settings.app.addr())?;

    app::run(listener, integrations)?
        .await
        .context("Failed to run app")
}
