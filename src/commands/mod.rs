// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::store::BlobStore;
use crate::timerange::{filter_by_time_range, Clock, TimeRange};
use anyhow::Result;

pub mod budgets;
pub mod chat;
pub mod exporter;
pub mod importer;
pub mod reports;
pub mod settings;
pub mod sync;
pub mod transactions;

/// What every data command needs: where the book lives and what day it is.
pub struct Ctx<'a> {
    pub store: &'a dyn BlobStore,
    pub clock: &'a dyn Clock,
    pub config: Config,
}

impl Ctx<'_> {
    pub fn load(&self) -> Result<crate::book::Book> {
        Ok(crate::store::load_book(self.store)?)
    }

    pub fn save(&self, book: &crate::book::Book) -> Result<()> {
        Ok(crate::store::save_book(self.store, book)?)
    }
}

pub(crate) fn range_of(sub: &clap::ArgMatches) -> Result<TimeRange> {
    match sub.get_one::<String>("range") {
        Some(r) => r.parse(),
        None => Ok(TimeRange::All),
    }
}

/// Transactions of the book restricted to the `--range` argument.
pub(crate) fn ranged(
    ctx: &Ctx,
    sub: &clap::ArgMatches,
) -> Result<(crate::book::Book, Vec<crate::models::Transaction>)> {
    let book = ctx.load()?;
    let txs = filter_by_time_range(&book.transactions, range_of(sub)?, ctx.clock.today());
    Ok((book, txs))
}
