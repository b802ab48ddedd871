// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-project rollups and budget-vs-actual variance.

use crate::models::{ProjectBudget, ProjectStats, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Bucket for transactions that carry no project.
pub const GENERAL_BUCKET: &str = "Spese Generali / Altro";

const WARNING_THRESHOLD: Decimal = Decimal::from_parts(85, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    Over,
    Warning,
    OnTrack,
}

impl CostStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Over => "over budget",
            Self::Warning => "warning",
            Self::OnTrack => "on track",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Above,
    Below,
    OnPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariance {
    pub name: String,
    pub budget_revenue: Decimal,
    pub budget_cost: Decimal,
    pub actual_revenue: Decimal,
    pub actual_cost: Decimal,
    pub cost_progress: Decimal,
    pub revenue_progress: Decimal,
    pub projected_margin: Decimal,
    pub actual_margin: Decimal,
}

impl ProjectVariance {
    pub fn cost_status(&self) -> CostStatus {
        if self.cost_progress > Decimal::ONE_HUNDRED {
            CostStatus::Over
        } else if self.cost_progress > WARNING_THRESHOLD {
            CostStatus::Warning
        } else {
            CostStatus::OnTrack
        }
    }

    pub fn margin_delta(&self) -> Decimal {
        self.actual_margin - self.projected_margin
    }

    pub fn performance(&self) -> Performance {
        let delta = self.margin_delta();
        if delta.is_zero() {
            Performance::OnPlan
        } else if delta.is_sign_positive() {
            Performance::Above
        } else {
            Performance::Below
        }
    }
}

/// `part / whole * 100`, or zero when nothing was budgeted.
fn progress(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::ZERO {
        part / whole * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Distinct, non-empty project labels, sorted.
pub fn project_names(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .filter_map(|t| t.project.as_deref())
        .filter(|p| !p.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Budgeted projects with no entries yet are reported too, at zero progress.
pub fn compute_project_variance(
    transactions: &[Transaction],
    budgets: &[ProjectBudget],
) -> Vec<ProjectVariance> {
    let mut names: BTreeSet<String> = project_names(transactions).into_iter().collect();
    names.extend(budgets.iter().map(|b| b.project_name.clone()));

    let mut out: Vec<ProjectVariance> = names
        .into_iter()
        .filter_map(|name| {
            let (mut actual_revenue, mut actual_cost) = (Decimal::ZERO, Decimal::ZERO);
            for t in transactions.iter().filter(|t| t.belongs_to(&name)) {
                if t.is_revenue() {
                    actual_revenue += t.amount;
                } else {
                    actual_cost += t.amount;
                }
            }
            let budget = budgets.iter().find(|b| b.project_name == name);
            let budget_revenue = budget.map(|b| b.budget_revenue).unwrap_or_default();
            let budget_cost = budget.map(|b| b.budget_cost).unwrap_or_default();

            if budget_revenue.is_zero()
                && budget_cost.is_zero()
                && actual_revenue.is_zero()
                && actual_cost.is_zero()
            {
                return None;
            }

            Some(ProjectVariance {
                cost_progress: progress(actual_cost, budget_cost),
                revenue_progress: progress(actual_revenue, budget_revenue),
                projected_margin: budget_revenue - budget_cost,
                actual_margin: actual_revenue - actual_cost,
                name,
                budget_revenue,
                budget_cost,
                actual_revenue,
                actual_cost,
            })
        })
        .collect();

    // names arrive sorted, so the stable sort keeps ties alphabetical
    out.sort_by(|a, b| b.actual_revenue.cmp(&a.actual_revenue));
    out
}

pub fn project_stats(transactions: &[Transaction]) -> Vec<ProjectStats> {
    let mut map: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for t in transactions {
        let name = t
            .project
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(GENERAL_BUCKET);
        let entry = map.entry(name).or_insert((Decimal::ZERO, Decimal::ZERO));
        if t.is_revenue() {
            entry.0 += t.amount;
        } else {
            entry.1 += t.amount;
        }
    }

    let mut stats: Vec<ProjectStats> = map
        .into_iter()
        .map(|(name, (revenue, costs))| {
            let margin = revenue - costs;
            ProjectStats {
                name: name.to_string(),
                revenue,
                costs,
                margin,
                margin_percent: progress(margin, revenue),
            }
        })
        .collect();
    stats.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TransactionType};
    use chrono::NaiveDate;

    fn tx(project: Option<&str>, t: TransactionType, amount: i64) -> Transaction {
        Transaction::new(
            "t",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            "x",
            Decimal::from(amount),
            t,
            Category::Construction,
            project.map(str::to_string),
        )
        .unwrap()
    }

    fn budget(name: &str, rev: i64, cost: i64) -> ProjectBudget {
        ProjectBudget {
            project_name: name.into(),
            budget_revenue: Decimal::from(rev),
            budget_cost: Decimal::from(cost),
        }
    }

    #[test]
    fn over_budget_site() {
        let txs = vec![
            tx(Some("Campana"), TransactionType::Revenue, 26650),
            tx(Some("Campana"), TransactionType::Cost, 21150),
        ];
        let v = compute_project_variance(&txs, &[budget("Campana", 30000, 20000)]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].cost_progress, "105.75".parse::<Decimal>().unwrap());
        assert_eq!(v[0].cost_status(), CostStatus::Over);
        assert_eq!(v[0].projected_margin, Decimal::from(10000));
        assert_eq!(v[0].actual_margin, Decimal::from(5500));
        assert_eq!(v[0].performance(), Performance::Below);
    }

    #[test]
    fn zero_budget_means_zero_progress() {
        let txs = vec![tx(Some("Silvia"), TransactionType::Cost, 14895)];
        let v = compute_project_variance(&txs, &[]);
        assert_eq!(v[0].cost_progress, Decimal::ZERO);
        assert_eq!(v[0].revenue_progress, Decimal::ZERO);
        assert_eq!(v[0].cost_status(), CostStatus::OnTrack);
    }

    #[test]
    fn warning_band() {
        let txs = vec![tx(Some("Luogo"), TransactionType::Cost, 900)];
        let v = compute_project_variance(&txs, &[budget("Luogo", 0, 1000)]);
        assert_eq!(v[0].cost_status(), CostStatus::Warning);
    }

    #[test]
    fn empty_projects_are_dropped_and_order_is_by_revenue() {
        let txs = vec![
            tx(Some("A"), TransactionType::Revenue, 100),
            tx(Some("B"), TransactionType::Revenue, 500),
            tx(None, TransactionType::Revenue, 9999),
        ];
        let budgets = vec![budget("Ghost", 0, 0), budget("Planned", 1000, 800)];
        let v = compute_project_variance(&txs, &budgets);
        let names: Vec<_> = v.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "Planned"]);
        assert_eq!(v[2].performance(), Performance::Below);
    }

    #[test]
    fn performance_follows_margin_delta_sign() {
        let txs = vec![
            tx(Some("Silvia"), TransactionType::Revenue, 30500),
            tx(Some("Silvia"), TransactionType::Cost, 14895),
            tx(Some("Luogo"), TransactionType::Revenue, 12000),
            tx(Some("Luogo"), TransactionType::Cost, 9000),
        ];
        let budgets = vec![budget("Silvia", 32000, 20000), budget("Luogo", 12000, 9000)];
        let v = compute_project_variance(&txs, &budgets);

        let silvia = v.iter().find(|r| r.name == "Silvia").unwrap();
        assert_eq!(silvia.margin_delta(), Decimal::from(3605));
        assert_eq!(silvia.performance(), Performance::Above);

        let luogo = v.iter().find(|r| r.name == "Luogo").unwrap();
        assert!(luogo.margin_delta().is_zero());
        assert_eq!(luogo.performance(), Performance::OnPlan);
        // spending exactly the budget is not over it
        assert_eq!(luogo.cost_status(), CostStatus::Warning);
    }

    #[test]
    fn stats_include_general_bucket() {
        let txs = vec![
            tx(Some("A"), TransactionType::Revenue, 1000),
            tx(Some("A"), TransactionType::Cost, 750),
            tx(None, TransactionType::Cost, 200),
        ];
        let stats = project_stats(&txs);
        assert_eq!(stats[0].name, "A");
        assert_eq!(stats[0].margin_percent, Decimal::from(25));
        assert_eq!(stats[1].name, GENERAL_BUCKET);
        assert_eq!(stats[1].margin, Decimal::from(-200));
        assert_eq!(stats[1].margin_percent, Decimal::ZERO);
        assert_eq!(project_names(&txs), vec!["A".to_string()]);
    }
}
