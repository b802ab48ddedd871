// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ranged, Ctx};
use crate::models::{Category, Transaction, TransactionType};
use crate::utils::{fmt_money, maybe_print_json, new_id, parse_amount, parse_date, pretty_table};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(ctx, sub)?,
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("edit", sub)) => edit(ctx, sub)?,
        Some(("rm", sub)) => rm(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => ctx.clock.today(),
    };
    let description = sub.get_one::<String>("description").unwrap();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let r#type: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let category = match sub.get_one::<String>("category") {
        Some(c) => c.parse()?,
        None => Category::Other,
    };
    let project = sub.get_one::<String>("project").map(|s| s.trim().to_string());

    let t = Transaction::new(new_id(), date, description.as_str(), amount, r#type, category, project)?;
    let mut book = ctx.load()?;
    println!(
        "Recorded {} {} on {} '{}' (id: {})",
        t.r#type,
        fmt_money(&t.amount),
        t.date,
        t.description,
        t.id
    );
    book.add_transaction(t);
    ctx.save(&book)?;
    Ok(())
}

fn edit(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap().trim();
    let mut book = ctx.load()?;
    let current = book
        .transaction(id)
        .cloned()
        .with_context(|| format!("Transaction '{}' not found", id))?;

    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => current.date,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(s) => parse_amount(s)?,
        None => current.amount,
    };
    let r#type = match sub.get_one::<String>("type") {
        Some(s) => s.parse()?,
        None => current.r#type,
    };
    let category = match sub.get_one::<String>("category") {
        Some(s) => s.parse()?,
        None => current.category,
    };
    let description = sub
        .get_one::<String>("description")
        .cloned()
        .unwrap_or(current.description);
    // an empty --project clears the assignment
    let project = match sub.get_one::<String>("project") {
        Some(p) => Some(p.trim().to_string()),
        None => current.project,
    };

    let updated = Transaction::new(id, date, description, amount, r#type, category, project)?;
    book.update_transaction(updated)?;
    ctx.save(&book)?;
    info!(id, "transaction updated");
    println!("Updated transaction {}", id);
    Ok(())
}

fn rm(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap().trim();
    let mut book = ctx.load()?;
    let gone = book.delete_transaction(id)?;
    ctx.save(&book)?;
    println!("Removed '{}' ({})", gone.description, id);
    Ok(())
}

fn list(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(ctx, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.description.clone(),
                    r.r#type.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.project.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Description", "Type", "Category", "Amount", "Project", "ID"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub description: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub category: String,
    pub amount: String,
    pub project: String,
}

/// Newest first, after the range/project/search/type filters and the limit.
pub fn query_rows(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let (_, mut txs) = ranged(ctx, sub)?;
    if let Some(p) = sub.get_one::<String>("project") {
        txs.retain(|t| t.belongs_to(p));
    }
    if let Some(q) = sub
        .get_one::<String>("search")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        txs.retain(|t| t.matches_search(q));
    }
    if let Some(t) = sub.get_one::<String>("type") {
        let wanted: TransactionType = t.parse()?;
        txs.retain(|x| x.r#type == wanted);
    }
    // latest entry first within the same day
    txs.reverse();
    txs.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            date: t.date.to_string(),
            description: t.description,
            r#type: t.r#type.to_string(),
            category: t.category.code().to_string(),
            amount: format!("{:.2}", t.amount),
            project: t.project.unwrap_or_default(),
            id: t.id,
        })
        .collect())
}
