// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod advisor;
pub mod book;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod kpi;
pub mod models;
pub mod store;
pub mod timerange;
pub mod utils;
pub mod variance;

pub use kpi::calculate_kpis;
pub use timerange::filter_by_time_range;
pub use variance::compute_project_variance;
