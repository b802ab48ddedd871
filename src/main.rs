// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing::warn;

use cantiere::commands::{self, Ctx};
use cantiere::config::Config;
use cantiere::store::{BlobStore, RemoteStore, SqliteStore, SyncedStore};
use cantiere::timerange::SystemClock;
use cantiere::{cli, db};

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;
    let config = Config::load(&conn)?;

    let remote: Option<Box<dyn BlobStore>> = match config.remote() {
        Some((url, key)) => match RemoteStore::new(url, key) {
            Ok(r) => Some(Box::new(r)),
            Err(err) => {
                warn!(error = %err, "remote store unavailable, working locally");
                None
            }
        },
        None => None,
    };
    let store = SyncedStore::new(SqliteStore::new(&conn), remote);
    let clock = SystemClock;
    let ctx = Ctx {
        store: &store,
        clock: &clock,
        config: config.clone(),
    };

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
            if store.is_remote() {
                println!("Remote sync enabled");
            }
        }
        Some(("tx", sub)) => commands::transactions::handle(&ctx, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&ctx, sub)?,
        Some(("report", sub)) => commands::reports::handle(&ctx, sub)?,
        Some(("import", sub)) => commands::importer::handle(&ctx, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&ctx, sub)?,
        Some(("advisor", sub)) => commands::chat::handle(&ctx, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        Some(("sync", sub)) => commands::sync::handle(&conn, &config, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
