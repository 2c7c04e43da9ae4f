//! bookclub server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `BOOKCLUB_*` environment variables, opens the SQLite store, and serves the
//! JSON API. Two maintenance subcommands share the same configuration:
//!
//! ```text
//! bookclub repair-ratings            # recompute every book's rating aggregate
//! bookclub add-member --name Ada --admin
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use bookclub_core::{
  member::{NewMember, Role},
  rating::RatingAggregator,
  store::ClubStore,
};
use bookclub_server::ServerConfig;
use bookclub_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Book club API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Recompute every book's rating aggregate from its reviews and exit.
  RepairRatings,
  /// Add an approved member and print their id; use to bootstrap an admin.
  AddMember {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    admin: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.resolved_store_path();
  if let Some(dir) = store_path.parent() {
    tokio::fs::create_dir_all(dir)
      .await
      .with_context(|| format!("failed to create {dir:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::RepairRatings => {
      let report = RatingAggregator::new(store)
        .repair_all()
        .await
        .context("rating repair failed")?;
      tracing::info!(
        checked = report.checked,
        repaired = report.repaired,
        failed = report.failed,
        "rating repair finished"
      );
      Ok(())
    }
    Command::AddMember { name, admin } => {
      let member = store
        .add_member(NewMember {
          name,
          role: if admin { Role::Admin } else { Role::Member },
          approved: true,
        })
        .await
        .context("failed to add member")?;
      println!("{}", member.member_id);
      Ok(())
    }
  }
}

async fn serve(store: Arc<SqliteStore>, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = bookclub_server::app(store, cfg);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
