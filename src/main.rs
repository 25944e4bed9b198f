use std::net::TcpListener;
use std::sync::Arc;

use fintrack::configuration::{get_configuration, RECOMMENDED_MIN_HASH_COST};
use fintrack::startup::{run, AppState};
use fintrack::store::{PgCredentialStore, PgFinanceStore};
use fintrack::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if let Err(e) = configuration.validate() {
        tracing::error!("Refusing to start: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }
    if configuration.password.hash_cost < RECOMMENDED_MIN_HASH_COST {
        tracing::warn!(
            hash_cost = configuration.password.hash_cost,
            "Password hash cost is below the recommended minimum of {}",
            RECOMMENDED_MIN_HASH_COST
        );
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to apply migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;
    tracing::info!("Database ready");

    let state = AppState::new(
        &configuration,
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgFinanceStore::new(pool)),
    )
    .map_err(|e| {
        tracing::error!("Failed to build application state: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, state, &configuration.application)?.await
}
