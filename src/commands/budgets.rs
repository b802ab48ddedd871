// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{ranged, Ctx};
use crate::models::ProjectBudget;
use crate::utils::{fmt_money, fmt_pct, maybe_print_json, parse_amount, pretty_table};
use crate::variance::{compute_project_variance, Performance, ProjectVariance};
use anyhow::Result;
use serde::Serialize;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(ctx, sub)?,
        Some(("list", sub)) => list(ctx, sub)?,
        Some(("report", sub)) => report(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let project = sub.get_one::<String>("project").unwrap().trim().to_string();
    let budget_revenue = parse_amount(sub.get_one::<String>("revenue").unwrap())?;
    let budget_cost = parse_amount(sub.get_one::<String>("cost").unwrap())?;

    let mut book = ctx.load()?;
    let verb = if book.budget_for(&project).is_some() { "updated" } else { "set" };
    if !book.transactions.iter().any(|t| t.belongs_to(&project)) {
        eprintln!("Note: no transactions are tagged with project '{}' yet", project);
    }
    book.set_budget(ProjectBudget {
        project_name: project.clone(),
        budget_revenue,
        budget_cost,
    });
    ctx.save(&book)?;
    println!(
        "Budget {} for {}: revenue {}, cost {}",
        verb,
        project,
        fmt_money(&budget_revenue),
        fmt_money(&budget_cost)
    );
    Ok(())
}

fn list(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let book = ctx.load()?;
    let mut budgets = book.budgets;
    budgets.sort_by(|a, b| a.project_name.cmp(&b.project_name));
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        let data = budgets
            .iter()
            .map(|b| {
                vec![
                    b.project_name.clone(),
                    fmt_money(&b.budget_revenue),
                    fmt_money(&b.budget_cost),
                    fmt_money(&(b.budget_revenue - b.budget_cost)),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Project", "Budget Revenue", "Budget Cost", "Projected Margin"], data)
        );
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceRow {
    #[serde(flatten)]
    pub variance: ProjectVariance,
    pub cost_status: &'static str,
    pub margin_delta: rust_decimal::Decimal,
    pub performance: Performance,
}

pub fn report_rows(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<Vec<VarianceRow>> {
    let (book, txs) = ranged(ctx, sub)?;
    Ok(compute_project_variance(&txs, &book.budgets)
        .into_iter()
        .map(|v| VarianceRow {
            cost_status: v.cost_status().label(),
            margin_delta: v.margin_delta(),
            performance: v.performance(),
            variance: v,
        })
        .collect())
}

fn report(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let rows = report_rows(ctx, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .iter()
            .map(|r| {
                let v = &r.variance;
                vec![
                    v.name.clone(),
                    format!("{} / {}", fmt_money(&v.actual_revenue), fmt_money(&v.budget_revenue)),
                    fmt_pct(&v.revenue_progress),
                    format!("{} / {}", fmt_money(&v.actual_cost), fmt_money(&v.budget_cost)),
                    fmt_pct(&v.cost_progress),
                    r.cost_status.to_string(),
                    fmt_money(&v.actual_margin),
                    fmt_money(&v.projected_margin),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Project",
                    "Revenue (act/bud)",
                    "Rev %",
                    "Cost (act/bud)",
                    "Cost %",
                    "Status",
                    "Margin",
                    "Projected",
                ],
                data,
            )
        );
    }
    Ok(())
}
