use nicolas_qui_paie::config::Config;
use nicolas_qui_paie::database::{create_pool, run_migrations};
use nicolas_qui_paie::{AppState, create_app};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nicolas_qui_paie=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool created");

    run_migrations(&db).await?;
    tracing::info!("Database migrations completed");

    let addr = format!("{}:{}", config.host, config.port);
    let app = create_app(AppState::new(db, config));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
