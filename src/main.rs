//! School Journal
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use school_journal::{
    database::{create_pool, run_migrations, DatabaseService},
    handlers::{router, AppState},
    i18n::I18n,
    services::ServiceFactory,
    utils::logging,
    Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", school_journal::info());

    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await?;

    info!("Running database migrations...");
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);

    info!("Loading translations...");
    let i18n = I18n::load(&settings.i18n).await?;
    let stats = i18n.get_stats();
    info!(
        languages = stats.languages.len(),
        keys = stats.total_keys,
        "Translations loaded"
    );

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, database_service)?;

    let health = services.health_check().await;
    if !health.is_healthy() {
        for issue in health.get_issues() {
            warn!(issue = %issue, "Dependency not ready at startup");
        }
    }

    let bind_address = settings.server.bind_address.clone();
    let state = AppState::new(settings, services, i18n)?;
    let app = router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!(address = %bind_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
