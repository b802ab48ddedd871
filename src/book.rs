// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{ProjectBudget, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Transaction '{0}' not found")]
    UnknownTransaction(String),
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),
}

/// The transaction and budget collections the engines read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<ProjectBudget>,
}

impl Book {
    pub fn add_transaction(&mut self, t: Transaction) {
        self.transactions.push(t);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(items);
    }

    /// Replaces the whole record with the same id.
    pub fn update_transaction(&mut self, t: Transaction) -> Result<(), BookError> {
        match self.transactions.iter_mut().find(|x| x.id == t.id) {
            Some(slot) => {
                *slot = t;
                Ok(())
            }
            None => Err(BookError::UnknownTransaction(t.id)),
        }
    }

    pub fn delete_transaction(&mut self, id: &str) -> Result<Transaction, BookError> {
        let pos = self
            .transactions
            .iter()
            .position(|x| x.id == id)
            .ok_or_else(|| BookError::UnknownTransaction(id.to_string()))?;
        Ok(self.transactions.remove(pos))
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|x| x.id == id)
    }

    /// Overwrites an existing budget in place, appends otherwise.
    pub fn set_budget(&mut self, budget: ProjectBudget) {
        match self
            .budgets
            .iter_mut()
            .find(|b| b.project_name == budget.project_name)
        {
            Some(slot) => *slot = budget,
            None => self.budgets.push(budget),
        }
    }

    pub fn budget_for(&self, project: &str) -> Option<&ProjectBudget> {
        self.budgets.iter().find(|b| b.project_name == project)
    }
}
