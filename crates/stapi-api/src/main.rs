//! STAPI adapter server: Planet tasking behind /products, /orders and opportunity search.

use planet_client::{PlanetClient, Settings};
use stapi_api::server::{self, AppState};
use stapi_api::ApiSettings;
use stapi_convert::assured_tasking_product;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let api_settings = ApiSettings::from_env()?;
    let product = assured_tasking_product(settings.pl_number());
    let client = PlanetClient::new(&settings)?;
    tracing::info!(
        env = ?settings.env,
        api_base_url = %settings.api_base_url,
        product_id = %product.id,
        "planet backend configured"
    );

    let addr = api_settings.listen;
    let state = Arc::new(AppState::in_memory(client, api_settings, product));
    let shutdown = state.shutdown.clone();
    let app = server::router(state);

    tracing::info!("STAPI adapter listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutting down, cancelling in-flight searches");
        shutdown.cancel();
    })
    .await?;
    Ok(())
}
