use std::net::SocketAddr;

use api_portal::config::Config;
use api_portal::seed::SeedAction;
use api_portal::AppState;
use tower_sessions::session_store::ExpiredDeletion;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_portal=debug,tower_http=debug".into()),
        )
        .init();

    // Load config
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {e}"))?;

    // Connect to database
    let db = api_portal::db::pool::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    api_portal::db::migration::run(&db).await?;
    tracing::info!("Migrations applied");

    let state = AppState::new(db, config.clone())?;

    // Check for seed subcommand: cargo run -- seed <email> [name]
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "seed" {
        let email = args
            .get(2)
            .map(|s| s.as_str())
            .unwrap_or("admin@example.com");
        let name = args.get(3).map(|s| s.as_str());

        println!("=== API Portal Bootstrap ===\n");

        let result = api_portal::seed::bootstrap(&state.db, email, name).await?;

        match result.action {
            SeedAction::Created => println!("Created admin user: {email}"),
            SeedAction::Promoted => println!("Promoted {email} to admin role."),
            SeedAction::AlreadyAdmin => println!("User {email} is already an admin."),
        }

        let token = state.jwt.issue_access_token(&result.user_id)?;
        println!("\nBearer token (valid for {}s):", config.jwt_access_token_expiry_secs);
        println!("  {token}");
        println!("\n=== Bootstrap complete ===");

        return Ok(());
    }

    // Sessions share the database; expired ones are purged in the background
    let sessions = api_portal::routes::session_store(&state.db).await?;
    tokio::task::spawn(
        sessions
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    // Build router
    let app = api_portal::routes::create_router(state, sessions);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
