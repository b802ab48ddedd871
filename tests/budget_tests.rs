// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cantiere::commands::{budgets, Ctx};
use cantiere::config::Config;
use cantiere::store::{load_book, SqliteStore};
use cantiere::timerange::FixedClock;
use cantiere::variance::Performance;
use cantiere::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute(
        "INSERT INTO app_data(key, value) VALUES ('transactions', ?1)",
        [r#"[
            {"id":"1","date":"2023-10-15","description":"Ricavi Commessa Campana","amount":26650,"type":"REVENUE","category":"ALTRO","project":"Campana"},
            {"id":"2","date":"2023-10-18","description":"Costi Cantiere Campana","amount":21150,"type":"COST","category":"CANTIERI","project":"Campana"},
            {"id":"3","date":"2023-11-25","description":"Costi Materiali Angelo & Chiara","amount":1100,"type":"COST","category":"CANTIERI","project":"Angelo & Chiara"}
        ]"#],
    )
    .unwrap();
    conn
}

fn with_ctx<T>(conn: &Connection, f: impl FnOnce(&Ctx) -> T) -> T {
    let store = SqliteStore::new(conn);
    let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    let ctx = Ctx { store: &store, clock: &clock, config: Config::default() };
    f(&ctx)
}

fn budget_cmd(conn: &Connection, args: &[&str]) {
    let mut argv = vec!["cantiere", "budget"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("budget", m)) = matches.subcommand() else { panic!("no budget subcommand") };
    with_ctx(conn, |ctx| budgets::handle(ctx, m).unwrap());
}

#[test]
fn set_is_an_upsert() {
    let conn = setup();
    budget_cmd(&conn, &["set", "--project", "Campana", "--revenue", "25000", "--cost", "18000"]);
    budget_cmd(&conn, &["set", "--project", "Campana", "--revenue", "30000", "--cost", "20000"]);
    budget_cmd(&conn, &["set", "--project", "Nuovo", "--revenue", "5000", "--cost", "4000"]);
    let book = load_book(&SqliteStore::new(&conn)).unwrap();
    assert_eq!(book.budgets.len(), 2);
    assert_eq!(book.budgets[0].project_name, "Campana");
    assert_eq!(book.budgets[0].budget_cost, Decimal::from(20000));
}

#[test]
fn report_flags_over_budget_site() {
    let conn = setup();
    budget_cmd(&conn, &["set", "--project", "Campana", "--revenue", "30000", "--cost", "20000"]);

    let matches = cli::build_cli().get_matches_from(["cantiere", "budget", "report"]);
    let Some(("budget", m)) = matches.subcommand() else { panic!("no budget subcommand") };
    let Some(("report", report_m)) = m.subcommand() else { panic!("no report subcommand") };
    let rows = with_ctx(&conn, |ctx| budgets::report_rows(ctx, report_m).unwrap());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].variance.name, "Campana");
    assert_eq!(rows[0].variance.cost_progress, "105.75".parse::<Decimal>().unwrap());
    assert_eq!(rows[0].cost_status, "over budget");
    assert_eq!(rows[0].margin_delta, Decimal::from(-4500));
    assert_eq!(rows[0].performance, Performance::Below);
    // no budget: progress stays at zero
    assert_eq!(rows[1].variance.name, "Angelo & Chiara");
    assert_eq!(rows[1].variance.cost_progress, Decimal::ZERO);
}

#[test]
fn report_honours_time_range() {
    let conn = setup();
    let matches =
        cli::build_cli().get_matches_from(["cantiere", "budget", "report", "--range", "this-year"]);
    let Some(("budget", m)) = matches.subcommand() else { panic!("no budget subcommand") };
    let Some(("report", report_m)) = m.subcommand() else { panic!("no report subcommand") };
    let rows = with_ctx(&conn, |ctx| budgets::report_rows(ctx, report_m).unwrap());
    assert!(rows.is_empty());
}
