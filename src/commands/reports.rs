// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ranged, Ctx};
use crate::kpi::{calculate_kpis, costs_by_category};
use crate::utils::{fmt_money, fmt_pct, maybe_print_json, pretty_table};
use crate::models::Category;
use crate::variance::{project_stats, GENERAL_BUCKET};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("kpi", sub)) => kpi(ctx, sub)?,
        Some(("projects", sub)) => projects(ctx, sub)?,
        Some(("costs", sub)) => costs(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn kpi(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let (_, txs) = ranged(ctx, sub)?;
    let k = calculate_kpis(&txs);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &k)? {
        return Ok(());
    }
    let rows = [
        ("Fatturato Totale", k.revenue),
        ("Costi Cantiere (COGS)", k.cogs),
        ("Margine Lordo", k.gross_margin),
        ("Spese Operative (OPEX)", k.opex),
        ("EBITDA (MOL)", k.ebitda),
        ("EBIT (MON)", k.ebit),
        ("Imposte IRES + IRAP", k.taxes),
        ("Utile Netto", k.net_income),
        ("Ritenuta Dividendi", k.dividend_tax),
        ("Dividendi Prelevabili", k.dividends),
        ("Tasse Totali", k.total_tax_burden()),
    ]
    .into_iter()
    .map(|(label, v)| vec![label.to_string(), fmt_money(&v)])
    .collect();
    println!("{}", pretty_table(&["KPI", "Value"], rows));
    Ok(())
}

fn projects(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let (_, txs) = ranged(ctx, sub)?;
    let stats = project_stats(&txs);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    let rows = stats
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                fmt_money(&s.revenue),
                fmt_money(&s.costs),
                fmt_money(&s.margin),
                fmt_pct(&s.margin_percent),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Project", "Revenue", "Costs", "Margin", "Margin %"], rows)
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CostRow {
    pub category: Category,
    pub label: &'static str,
    pub amount: Decimal,
    pub share: Decimal,
}

/// Cost breakdown for the range, optionally narrowed to one project.
pub fn cost_rows(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<Vec<CostRow>> {
    let (_, mut txs) = ranged(ctx, sub)?;
    if let Some(p) = sub.get_one::<String>("project").map(|s| s.trim()) {
        if p == GENERAL_BUCKET {
            txs.retain(|t| t.project.is_none());
        } else {
            txs.retain(|t| t.belongs_to(p));
        }
    }
    let items = costs_by_category(&txs);
    let total: Decimal = items.iter().map(|(_, v)| *v).sum();
    Ok(items
        .into_iter()
        .map(|(category, amount)| CostRow {
            category,
            label: category.label(),
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                amount / total * Decimal::ONE_HUNDRED
            },
            amount,
        })
        .collect())
}

fn costs(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let data = cost_rows(ctx, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|r| vec![r.label.to_string(), fmt_money(&r.amount), fmt_pct(&r.share)])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    Ok(())
}
