//! freeChat API server.

use database::Database;
use tracing::info;

use server::auth::AuthKeys;
use server::catalog::GameCatalog;
use server::config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting freeChat API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    database::bond::seed_questions(db.pool()).await?;

    // Load the game catalog
    let catalog = match &config.game_catalog_path {
        Some(path) => GameCatalog::from_file(path)?,
        None => GameCatalog::builtin(),
    };
    info!(games = catalog.len(), "Loaded game catalog");

    // Build application state
    let auth = AuthKeys::new(&config.jwt_secret, config.cookie_secure);
    let state = AppState::new(db, catalog, auth);

    // Build router
    let app = server::routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "freeChat API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
