use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::client::{CommerceClient, MarketingClient};
use crate::controller::entries;
use crate::settings::{CommerceConfigFlags, Settings};

/// Outbound integrations shared by all request handlers.
/// Constructed once per process, immutable thereafter; either client is
/// `None` when the corresponding platform is not configured.
#[derive(Debug)]
pub struct Integrations {
    pub commerce: Option<CommerceClient>,
    pub marketing: Option<MarketingClient>,
    pub commerce_flags: CommerceConfigFlags,
}

impl Integrations {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            commerce: settings.commerce.client()?,
            marketing: settings.marketing.client()?,
            commerce_flags: settings.commerce.flags(),
        })
    }
}

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(listener: TcpListener, integrations: Integrations) -> anyhow::Result<Server> {
    // Wrap application data
    let integrations = web::Data::new(integrations);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(integrations.clone())
            .service(health_check)
            .service(entries::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
