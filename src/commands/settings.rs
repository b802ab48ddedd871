// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{check_key, REMOTE_KEY, GEMINI_API_KEY};
use crate::db::{get_setting, list_settings, set_setting};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

fn masked(key: &str, value: &str) -> String {
    if key == REMOTE_KEY || key == GEMINI_API_KEY {
        let n = value.chars().count();
        let tail: String = value.chars().skip(n.saturating_sub(4)).collect();
        format!("****{}", tail)
    } else {
        value.to_string()
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap().trim();
            check_key(key)?;
            set_setting(conn, key, value)?;
            println!("{} = {}", key, masked(key, value));
        }
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            check_key(key)?;
            match get_setting(conn, key)? {
                Some(v) => println!("{}", masked(key, &v)),
                None => println!("{} is not set", key),
            }
        }
        Some(("list", _)) => {
            let data = list_settings(conn)?
                .into_iter()
                .map(|(k, v)| {
                    let shown = masked(&k, &v);
                    vec![k, shown]
                })
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}
