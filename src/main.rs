use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod cli;
mod config;
mod errors;
mod middleware;
mod session;
mod store;

use auth::secret::HashKey;
use session::SessionIssuer;
use store::postgres::PgStore;
use store::redis::RedisLoginStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub db: PgStore,
    pub logins: RedisLoginStore,
    pub hash_key: HashKey,
    pub sessions: SessionIssuer,
    pub config: config::Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Login { email }) => handle_login_command(cfg, &email).await,
        Some(cli::Commands::Account { command }) => handle_account_command(cfg, command).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    }
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    tracing::info!("Connecting to Redis...");
    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let logins = RedisLoginStore::new(redis_conn);

    let profiler = middleware::profile::Profiler::from_config(&cfg);
    if profiler.is_some() {
        tokio::fs::create_dir_all(&cfg.profile_dir).await?;
        tracing::info!(dir = %cfg.profile_dir.display(), "request profiler enabled");
    }

    let hash_key = HashKey::from_hex(&cfg.secret_key)?;
    let sessions = SessionIssuer::new(HashKey::from_hex(&cfg.secret_key)?, cfg.session_ttl());

    let state = Arc::new(AppState {
        db,
        logins,
        hash_key,
        sessions,
        config: cfg,
    });

    let app = api::router(state, profiler);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("gatehouse listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// `gatehouse login --email ...`: resolve the account, issue a one-time
/// secret, print the redemption parameters as JSON. The plaintext goes to
/// stdout exactly once; it is never stored anywhere.
async fn handle_login_command(cfg: config::Config, email: &str) -> anyhow::Result<()> {
    if !is_valid_email(email) {
        anyhow::bail!("'{}' is not a valid email address", email);
    }

    let db = PgStore::connect(&cfg.database_url).await?;
    let account = db
        .find_account_by_email(email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("could not find an account with email {}", email))?;

    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let logins = RedisLoginStore::new(redis_conn);

    let hash_key = HashKey::from_hex(&cfg.secret_key)?;
    let secret = auth::issuer::issue(&logins, &hash_key, account.id, chrono::Utc::now()).await?;

    println!(
        "{}",
        serde_json::json!({ "key": secret, "id": account.id })
    );
    Ok(())
}

async fn handle_account_command(
    cfg: config::Config,
    cmd: cli::AccountCommands,
) -> anyhow::Result<()> {
    let db = PgStore::connect(&cfg.database_url).await?;
    db.migrate().await?;

    match cmd {
        cli::AccountCommands::Add { email, name } => {
            if !is_valid_email(&email) {
                anyhow::bail!("'{}' is not a valid email address", email);
            }
            let id = db.insert_account(&email, name.as_deref()).await?;
            println!("Account created:\n  Email: {}\n  ID:    {}", email, id);
        }
        cli::AccountCommands::List => {
            let accounts = db.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<38} {:<30} CREATED", "ID", "EMAIL");
                for a in accounts {
                    println!(
                        "{:<38} {:<30} {}",
                        a.id,
                        a.email,
                        a.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
    }
    Ok(())
}

/// Enough validation to catch typos before a database round-trip; the
/// directory's unique index is the real arbiter.
fn is_valid_email(addr: &str) -> bool {
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
