use std::sync::Arc;

use color_eyre::eyre::Result;
use roost_adapters::{JwtTokenIssuer, RoostSettings};
use roost_auth_service::{
    AuthService,
    shutdown::shutdown_signal,
    helpers::{configure_postgresql, configure_redis, production_dependencies, service_options},
    telemetry::init_tracing,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let settings = RoostSettings::load()?;

    let pg_pool = configure_postgresql(&settings).await?;
    let redis_conn = configure_redis(&settings)?;
    let tokens = Arc::new(JwtTokenIssuer::new(
        settings.jwt.keys(),
        settings.jwt.time_to_live,
    ));

    let deps = production_dependencies(&settings, pg_pool, redis_conn, tokens)?;
    let auth_service = AuthService::new(deps, service_options(&settings));

    let report = auth_service.recover_incomplete().await?;
    tracing::info!(
        committed = report.committed.len(),
        compensated = report.compensated.len(),
        failed = report.failed.len(),
        "Recovered interrupted registrations"
    );
    for (saga_id, failures) in &report.failed {
        tracing::error!(%saga_id, failures = ?failures, "Registration still inconsistent after recovery");
    }

    let listener = TcpListener::bind(&settings.app.address).await?;
    auth_service
        .run_standalone(
            listener,
            Some(settings.app.allowed_origins.clone()),
            shutdown_signal(),
        )
        .await?;

    Ok(())
}
