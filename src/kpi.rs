// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reduction of a transaction list into the income-statement KPIs.

use crate::models::{Category, FinancialKpis, Transaction};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// IRES, 24%.
pub const RATE_IRES: Decimal = Decimal::from_parts(24, 0, 0, false, 2);
/// IRAP, 3.9%.
pub const RATE_IRAP: Decimal = Decimal::from_parts(39, 0, 0, false, 3);
/// Withholding on distributed profit, 26%.
pub const RATE_DIVIDEND: Decimal = Decimal::from_parts(26, 0, 0, false, 2);

/// No depreciation schedule is modeled, so EBIT equals EBITDA.
pub const AMORTIZATION: Decimal = Decimal::ZERO;

pub fn calculate_kpis(transactions: &[Transaction]) -> FinancialKpis {
    let mut revenue = Decimal::ZERO;
    let mut cogs = Decimal::ZERO;
    let mut opex = Decimal::ZERO;

    for t in transactions {
        if t.is_revenue() {
            revenue += t.amount;
        } else if t.category.is_direct() {
            cogs += t.amount;
        } else {
            opex += t.amount;
        }
    }

    let gross_margin = revenue - cogs;
    let ebitda = gross_margin - opex;
    let ebit = ebitda - AMORTIZATION;

    // Losses are never taxed.
    let taxable_base = ebit.max(Decimal::ZERO);
    let taxes = taxable_base * RATE_IRES + taxable_base * RATE_IRAP;
    let net_income = ebit - taxes;

    let distributable = net_income.max(Decimal::ZERO);
    let dividend_tax = distributable * RATE_DIVIDEND;
    let dividends = distributable - dividend_tax;

    FinancialKpis {
        revenue,
        cogs,
        gross_margin,
        opex,
        ebitda,
        ebit,
        taxes,
        net_income,
        dividends,
        dividend_tax,
    }
}

/// COST totals per category, largest first.
pub fn costs_by_category(transactions: &[Transaction]) -> Vec<(Category, Decimal)> {
    let mut agg: BTreeMap<Category, Decimal> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.is_cost()) {
        *agg.entry(t.category).or_insert(Decimal::ZERO) += t.amount;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    items
}

pub fn top_costs(transactions: &[Transaction], n: usize) -> Vec<(Category, Decimal)> {
    let mut items = costs_by_category(transactions);
    items.truncate(n);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::NaiveDate;

    fn tx(t: TransactionType, cat: Category, amount: i64) -> Transaction {
        Transaction::new(
            "t",
            NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
            "x",
            Decimal::from(amount),
            t,
            cat,
            None,
        )
        .unwrap()
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(calculate_kpis(&[]), FinancialKpis::default());
    }

    #[test]
    fn single_site_scenario() {
        let txs = vec![
            tx(TransactionType::Revenue, Category::Other, 26650),
            tx(TransactionType::Cost, Category::Construction, 21150),
        ];
        let k = calculate_kpis(&txs);
        assert_eq!(k.revenue, Decimal::from(26650));
        assert_eq!(k.cogs, Decimal::from(21150));
        assert_eq!(k.gross_margin, Decimal::from(5500));
        assert_eq!(k.opex, Decimal::ZERO);
        assert_eq!(k.ebitda, Decimal::from(5500));
        assert_eq!(k.ebit, Decimal::from(5500));
        assert_eq!(k.taxes, "1534.5".parse::<Decimal>().unwrap());
        assert_eq!(k.net_income, "3965.5".parse::<Decimal>().unwrap());
        assert_eq!(k.dividends.round_dp(2), "2934.47".parse::<Decimal>().unwrap());
        assert_eq!(k.dividend_tax.round_dp(2), "1031.03".parse::<Decimal>().unwrap());
    }

    #[test]
    fn loss_produces_no_tax() {
        let txs = vec![
            tx(TransactionType::Revenue, Category::Other, 1000),
            tx(TransactionType::Cost, Category::Marketing, 4000),
        ];
        let k = calculate_kpis(&txs);
        assert_eq!(k.ebit, Decimal::from(-3000));
        assert_eq!(k.taxes, Decimal::ZERO);
        assert_eq!(k.net_income, k.ebit);
        assert_eq!(k.dividends, Decimal::ZERO);
        assert_eq!(k.dividend_tax, Decimal::ZERO);
    }

    #[test]
    fn identities_hold_for_mixed_categories() {
        let txs = vec![
            tx(TransactionType::Revenue, Category::Other, 30500),
            tx(TransactionType::Revenue, Category::Other, 8000),
            tx(TransactionType::Cost, Category::Construction, 14895),
            tx(TransactionType::Cost, Category::Hr, 2000),
            tx(TransactionType::Cost, Category::Fixed, 750),
            tx(TransactionType::Cost, Category::Other, 120),
        ];
        let k = calculate_kpis(&txs);
        assert_eq!(k.opex, Decimal::from(2870));
        assert_eq!(k.revenue - k.cogs - k.opex, k.ebitda);
        assert_eq!(k.ebit, k.ebitda);
        assert!(k.taxes >= Decimal::ZERO);
        assert_eq!(k.net_income, k.ebit - k.taxes);
        assert_eq!(k.dividends + k.dividend_tax, k.net_income.max(Decimal::ZERO));
    }

    #[test]
    fn cost_breakdown_sorted_descending() {
        let txs = vec![
            tx(TransactionType::Cost, Category::Hr, 2000),
            tx(TransactionType::Cost, Category::Construction, 1100),
            tx(TransactionType::Cost, Category::Construction, 14895),
            tx(TransactionType::Cost, Category::Marketing, 300),
            tx(TransactionType::Revenue, Category::Other, 99999),
        ];
        let all = costs_by_category(&txs);
        assert_eq!(all[0], (Category::Construction, Decimal::from(15995)));
        assert_eq!(all.len(), 3);
        let top = top_costs(&txs, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[1].0, Category::Hr);
    }
}
