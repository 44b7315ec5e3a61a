use clap::Parser;
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paytrack_core::cli::{Cli, Commands};
use paytrack_core::config::Config;
use paytrack_core::extract::parse_extract;
use paytrack_core::{AppState, create_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Database pool + migrations
    let pool = db::create_pool(&config).await?;
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(pool.clone(), config.clone());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            // The reminder scan runs next to the API; both talk to the store
            // only through its guarded transitions.
            tokio::spawn(state.scheduler.clone().run_loop());

            let app = create_app(state);
            let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
            tracing::info!("listening on {}", addr);

            let listener = TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Commands::Reconcile { file } => {
            let body = std::fs::read_to_string(&file)?;
            let parsed = parse_extract(&body);
            let report = state.matcher.run(parsed).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Remind => {
            let summary = state.scheduler.scan_once().await?;
            println!(
                "due: {}, notified: {}, skipped (resolved): {}, lost race: {}",
                summary.due, summary.notified, summary.skipped_resolved, summary.lost_race
            );
        }
        Commands::Config => {
            println!("configuration OK");
            println!("  server port:          {}", config.server_port);
            println!("  staff channel:        {}", config.staff_channel);
            println!("  reminder delay:       {} min", config.reminder_delay_minutes);
            println!(
                "  reminder scan every:  {} min",
                config.reminder_scan_interval_minutes
            );
            println!(
                "  duplicate window:     {} min",
                config.duplicate_report_window_minutes
            );
            println!("  match epsilon:        {}", config.match_epsilon);
        }
    }

    Ok(())
}
