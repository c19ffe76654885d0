mod config;
mod http;
mod telemetry;

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use review_api::{seed, service::users, AppState, ROUTES};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    telemetry::{init_tracing, TelemetryConfig},
};

#[derive(Parser, Debug)]
#[command(name = "review-server", version, about = "Review analytics REST backend")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the HTTP server
    Serve {
        /// Overrides BIND for this run
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Apply or roll back schema migrations
    Migrate {
        #[arg(long, value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    /// Load the demo catalog, users and reviews
    Seed,
    /// Print every HTTP route
    PrintRoutes,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MigrateAction {
    Up,
    Down,
    Reset,
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    init_tracing(TelemetryConfig {
        format: config.log_format,
        env_filter: None,
        otlp_endpoint: config.otlp_endpoint.clone(),
    })?;

    let result = run(cli.cmd, config).await;
    telemetry::shutdown();
    result
}

async fn run(cmd: Cmd, config: AppConfig) -> anyhow::Result<()> {
    if let Cmd::PrintRoutes = cmd {
        for (method, path) in ROUTES {
            println!("{:<7} {}", method, path);
        }
        return Ok(());
    }

    let db = connect(&config.database_url).await?;

    match cmd {
        Cmd::Migrate { action } => migrate(&db, action).await,
        Cmd::Seed => {
            Migrator::up(&db, None).await?;
            match seed::seed_demo(&db).await? {
                Some(records) => {
                    println!(
                        "seeded {} categories, {} criteria, {} products, {} reviews",
                        records.categories.len(),
                        records.criteria.len(),
                        records.products.len(),
                        records.reviews
                    );
                    println!(
                        "demo logins: {} / {} (password {})",
                        seed::DEMO_ADMIN_EMAIL,
                        seed::DEMO_ANALYST_EMAIL,
                        seed::DEMO_PASSWORD
                    );
                }
                None => println!("catalog already populated, nothing seeded"),
            }
            Ok(())
        }
        Cmd::Serve { bind } => {
            if config.run_migrations {
                Migrator::up(&db, None).await?;
            }
            users::ensure_roles(&db).await?;
            if let Some(admin) = &config.bootstrap_admin {
                users::ensure_admin(&db, &admin.name, &admin.email, &admin.password).await?;
            }
            if config.uses_default_secret() {
                warn!("AUTH_SECRET is not set, using the development secret");
            }

            let addr = bind.unwrap_or(config.bind);
            let state = AppState::new(db, config.auth.clone());
            let router = http::build_router(state, &config.cors_allowed_origins);
            http::serve(addr, router).await
        }
        Cmd::PrintRoutes => Ok(()),
    }
}

async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(16)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .with_context(|| "failed to connect to DATABASE_URL")?;
    info!(backend = ?db.get_database_backend(), "database connected");
    Ok(db)
}

async fn migrate(db: &DatabaseConnection, action: MigrateAction) -> anyhow::Result<()> {
    match action {
        MigrateAction::Up => Migrator::up(db, None).await?,
        MigrateAction::Down => Migrator::down(db, Some(1)).await?,
        MigrateAction::Reset => Migrator::reset(db).await?,
        MigrateAction::Status => {
            for migration in Migrator::get_applied_migrations(db).await? {
                println!("applied  {}", migration.name());
            }
            for migration in Migrator::get_pending_migrations(db).await? {
                println!("pending  {}", migration.name());
            }
            return Ok(());
        }
    }
    info!(?action, "migration finished");
    Ok(())
}
