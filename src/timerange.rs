// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Transaction;
use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeRange {
    #[default]
    All,
    ThisYear,
    LastYear,
    ThisMonth,
    LastMonth,
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "all" => Ok(Self::All),
            "this-year" => Ok(Self::ThisYear),
            "last-year" => Ok(Self::LastYear),
            "this-month" => Ok(Self::ThisMonth),
            "last-month" => Ok(Self::LastMonth),
            _ => Err(anyhow!(
                "Invalid range '{}', expected all|this-year|last-year|this-month|last-month",
                s
            )),
        }
    }
}

/// Source of "today" for anything that filters by date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

fn previous_month(now: NaiveDate) -> (i32, u32) {
    if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    }
}

impl TimeRange {
    pub fn matches(&self, date: NaiveDate, now: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::ThisYear => date.year() == now.year(),
            Self::LastYear => date.year() == now.year() - 1,
            Self::ThisMonth => date.year() == now.year() && date.month() == now.month(),
            Self::LastMonth => (date.year(), date.month()) == previous_month(now),
        }
    }
}

pub fn filter_by_time_range(
    transactions: &[Transaction],
    range: TimeRange,
    now: NaiveDate,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| range.matches(t.date, now))
        .cloned()
        .collect()
}
