use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use catalog_app::App;
use catalog_db::Database;
use catalog_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "catalog", version, about = "Book catalog and wishlist service")]
struct Cli {
    /// Directory holding `base.toml` and per-environment overlays.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (local, staging, production).
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server until Ctrl-C.
    Serve,
    /// Apply pending schema migrations and exit.
    Migrate,
    /// Verify configuration and store connectivity.
    Check,
    /// Print every documented HTTP route.
    Routes,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        if self.config_dir.is_none() && self.env.is_none() {
            return Settings::load();
        }

        let config_dir = self
            .config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("config"));
        let environment = self.env.as_deref().unwrap_or("local");
        Settings::load_from(&config_dir, environment)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli
        .settings()
        .with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => catalog_app::bootstrap::run(settings).await,
        Commands::Migrate => migrate(settings).await,
        Commands::Check => check(settings).await,
        Commands::Routes => {
            routes(settings);
            Ok(())
        }
    }
}

async fn migrate(settings: Settings) -> anyhow::Result<()> {
    let app = App::build(settings).await?;
    let migrated = app.migrate().await;
    app.shutdown().await?;

    println!("applied {} migrations", migrated?);
    Ok(())
}

async fn check(settings: Settings) -> anyhow::Result<()> {
    let endpoint = settings.database.endpoint.clone();
    let app = App::build(settings).await?;
    let modules = app.registry().modules().len();
    app.shutdown().await?;

    println!("ok: store {endpoint} reachable, {modules} modules registered");
    Ok(())
}

fn routes(settings: Settings) {
    let db = Database::in_memory(&settings.database.name);
    let app = App::with_database(settings, db);
    let spec = catalog_http::router::merged_openapi(app.registry());

    let Some(paths) = spec["paths"].as_object() else {
        return;
    };
    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for method in operations.keys() {
            println!("{:<7} {}", method.to_uppercase(), path);
        }
    }
}
