// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::store::{load_book, save_book, RemoteStore, SqliteStore};
use anyhow::{anyhow, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, config: &Config, m: &clap::ArgMatches) -> Result<()> {
    let Some((url, key)) = config.remote() else {
        println!("Remote sync not configured; data is kept locally only.");
        return Ok(());
    };
    let remote = RemoteStore::new(url, key)?;
    match m.subcommand() {
        Some(("status", _)) => {
            if remote.check_connection() {
                println!("Connected to {}", url);
            } else {
                println!("Cannot reach {} (see logs with RUST_LOG=warn)", url);
            }
        }
        Some(("push", _)) => {
            if !remote.check_connection() {
                return Err(anyhow!("Remote {} is not reachable", url));
            }
            let book = load_book(&SqliteStore::new(conn))?;
            save_book(&remote, &book)?;
            println!(
                "Pushed {} transactions and {} budgets to {}",
                book.transactions.len(),
                book.budgets.len(),
                url
            );
        }
        _ => {}
    }
    Ok(())
}
