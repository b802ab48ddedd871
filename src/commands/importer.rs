// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::models::{Category, Transaction, TransactionType};
use crate::utils::{new_id, parse_amount, parse_date};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use tracing::{debug, info};

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(ctx, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,
}

/// Reads `date,description,amount,type,category,project` rows after a header.
/// Rows without a usable amount are dropped and counted, never fatal.
pub fn parse_transactions<R: Read>(rdr: R, today: NaiveDate) -> ImportOutcome {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(rdr);
    let mut out = ImportOutcome::default();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 1;
        let rec = match result {
            Ok(rec) => rec,
            Err(err) => {
                debug!(line, error = %err, "unreadable row");
                out.skipped += 1;
                continue;
            }
        };
        if rec.iter().all(|c| c.is_empty()) {
            continue;
        }
        if rec.len() < 3 {
            out.skipped += 1;
            continue;
        }
        let amount = match parse_amount(&rec[2]) {
            Ok(a) => a,
            Err(_) => {
                debug!(line, amount = &rec[2], "dropping row with bad amount");
                out.skipped += 1;
                continue;
            }
        };
        let date = match rec.get(0).filter(|s| !s.is_empty()) {
            None => today,
            Some(s) => match parse_date(s) {
                Ok(d) => d,
                Err(_) => {
                    debug!(line, date = s, "dropping row with bad date");
                    out.skipped += 1;
                    continue;
                }
            },
        };
        let description = rec.get(1).filter(|s| !s.is_empty()).unwrap_or("Imported");
        let r#type = match rec.get(3).and_then(TransactionType::parse_loose) {
            Some(TransactionType::Revenue) => TransactionType::Revenue,
            _ => TransactionType::Cost,
        };
        let category = rec
            .get(4)
            .and_then(Category::parse_loose)
            .unwrap_or(Category::Other);
        let project = rec.get(5).map(str::to_string);

        match Transaction::new(
            format!("csv-{}", new_id()),
            date,
            description,
            amount,
            r#type,
            category,
            project,
        ) {
            Ok(t) => out.transactions.push(t),
            Err(_) => out.skipped += 1,
        }
    }
    out
}

fn import_transactions(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let file = File::open(path).with_context(|| format!("Open CSV {}", path))?;
    let outcome = parse_transactions(file, ctx.clock.today());

    let mut book = ctx.load()?;
    let imported = outcome.transactions.len();
    book.extend(outcome.transactions);
    ctx.save(&book)?;
    info!(imported, skipped = outcome.skipped, path, "csv import finished");
    println!(
        "Imported {} transactions from {} ({} rows skipped)",
        imported, path, outcome.skipped
    );
    Ok(())
}
