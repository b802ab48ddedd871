// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Revenue,
    Cost,
}

impl TransactionType {
    /// Accepts the english and italian spellings used by imports.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "REVENUE" | "RICAVO" => Some(Self::Revenue),
            "COST" | "COSTO" => Some(Self::Cost),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revenue => write!(f, "REVENUE"),
            Self::Cost => write!(f, "COST"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s)
            .ok_or_else(|| anyhow::anyhow!("Invalid type '{}', expected revenue|cost", s))
    }
}

/// Cost classification. Stored codes follow the persisted blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "CANTIERI")]
    Construction,
    #[serde(rename = "MARKETING")]
    Marketing,
    #[serde(rename = "PERSONALE")]
    Hr,
    #[serde(rename = "FISSI")]
    Fixed,
    #[serde(rename = "ALTRO")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Construction,
        Category::Marketing,
        Category::Hr,
        Category::Fixed,
        Category::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Construction => "CANTIERI",
            Self::Marketing => "MARKETING",
            Self::Hr => "PERSONALE",
            Self::Fixed => "FISSI",
            Self::Other => "ALTRO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Construction => "Costi Cantiere (Diretti)",
            Self::Marketing => "Marketing & Ads",
            Self::Hr => "Dipendenti & Collaboratori",
            Self::Fixed => "Costi Fissi/Struttura",
            Self::Other => "Altro",
        }
    }

    /// Direct site costs make up COGS; everything else is opex.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Construction)
    }

    /// Matches either the stored code or the english variant name.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CANTIERI" | "CONSTRUCTION" => Some(Self::Construction),
            "MARKETING" => Some(Self::Marketing),
            "PERSONALE" | "HR" => Some(Self::Hr),
            "FISSI" | "FIXED" => Some(Self::Fixed),
            "ALTRO" | "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| {
            let codes: Vec<&str> = Self::ALL.iter().map(|c| c.code()).collect();
            anyhow::anyhow!("Unknown category '{}', expected one of {}", s, codes.join("|"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal, // always >= 0, direction is carried by `type`
    #[serde(rename = "type")]
    pub r#type: TransactionType,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        r#type: TransactionType,
        category: Category,
        project: Option<String>,
    ) -> Result<Self, crate::book::BookError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(crate::book::BookError::NegativeAmount(amount));
        }
        Ok(Self {
            id: id.into(),
            date,
            description: description.into(),
            amount,
            r#type,
            category,
            project: project.filter(|p| !p.trim().is_empty()),
        })
    }

    pub fn is_revenue(&self) -> bool {
        self.r#type == TransactionType::Revenue
    }

    pub fn is_cost(&self) -> bool {
        self.r#type == TransactionType::Cost
    }

    pub fn belongs_to(&self, project: &str) -> bool {
        self.project.as_deref() == Some(project)
    }

    /// Case-insensitive substring match on description, project or category label.
    pub fn matches_search(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.description.to_lowercase().contains(&q)
            || self
                .project
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains(&q))
            || self.category.label().to_lowercase().contains(&q)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBudget {
    pub project_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_revenue: Decimal, // preventivo al cliente
    #[serde(with = "rust_decimal::serde::float")]
    pub budget_cost: Decimal, // stima costi totali
}

/// Derived metrics, recomputed from the transaction set on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialKpis {
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub gross_margin: Decimal,
    pub opex: Decimal,
    pub ebitda: Decimal,
    pub ebit: Decimal,
    pub taxes: Decimal,
    pub net_income: Decimal,
    pub dividends: Decimal,
    pub dividend_tax: Decimal,
}

impl FinancialKpis {
    /// IRES + IRAP + withholding on a full distribution.
    pub fn total_tax_burden(&self) -> Decimal {
        self.taxes + self.dividend_tax
    }

    pub fn total_costs(&self) -> Decimal {
        self.cogs + self.opex
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub name: String,
    pub revenue: Decimal,
    pub costs: Decimal,
    pub margin: Decimal,
    pub margin_percent: Decimal,
}
