// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cantiere::commands::{reports, transactions, Ctx};
use cantiere::config::Config;
use cantiere::models::Category;
use cantiere::store::{load_book, SqliteStore};
use cantiere::timerange::FixedClock;
use cantiere::variance::GENERAL_BUCKET;
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
            {"id":"1","date":"2024-02-10","description":"Ricavi Commessa Campana","amount":"26650","type":"REVENUE","category":"ALTRO","project":"Campana"},
            {"id":"2","date":"2024-03-01","description":"Costi Cantiere Campana","amount":"21150","type":"COST","category":"CANTIERI","project":"Campana"},
            {"id":"3","date":"2024-03-01","description":"Architetti Esterni","amount":"2000","type":"COST","category":"PERSONALE"}
        ]"#],
    )
    .unwrap();
    conn
}

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
}

fn run(conn: &Connection, args: &[&str]) {
    let store = SqliteStore::new(conn);
    let clock = clock();
    let ctx = Ctx { store: &store, clock: &clock, config: Config::default() };
    let mut argv = vec!["cantiere", "tx"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        transactions::handle(&ctx, tx_m).unwrap();
    } else {
        panic!("no tx subcommand");
    }
}

fn list(conn: &Connection, args: &[&str]) -> Vec<transactions::TransactionRow> {
    let store = SqliteStore::new(conn);
    let clock = clock();
    let ctx = Ctx { store: &store, clock: &clock, config: Config::default() };
    let mut argv = vec!["cantiere", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("tx", tx_m)) = matches.subcommand() else { panic!("no tx subcommand") };
    let Some(("list", list_m)) = tx_m.subcommand() else { panic!("no list subcommand") };
    transactions::query_rows(&ctx, list_m).unwrap()
}

#[test]
fn list_newest_first_with_limit() {
    let conn = setup();
    let rows = list(&conn, &["--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "3");
    assert_eq!(rows[1].id, "2");
}

#[test]
fn list_filters_by_range_and_project() {
    let conn = setup();
    let rows = list(&conn, &["--range", "last-month"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2024-02-10");

    let rows = list(&conn, &["--range", "this-month", "--project", "Campana"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, "21150.00");
}

#[test]
fn add_defaults_to_today_and_other() {
    let conn = setup();
    run(&conn, &["add", "-d", "Saldo Silvia", "--amount", "30500", "--type", "ricavo", "--project", "Silvia"]);
    let book = load_book(&SqliteStore::new(&conn)).unwrap();
    let t = book.transactions.last().unwrap();
    assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(t.category.code(), "ALTRO");
    assert!(t.is_revenue());
    assert_eq!(t.project.as_deref(), Some("Silvia"));
}

#[test]
fn edit_replaces_fields_and_rm_deletes() {
    let conn = setup();
    run(&conn, &["edit", "2", "--amount", "20000", "--project", ""]);
    let book = load_book(&SqliteStore::new(&conn)).unwrap();
    let t = book.transaction("2").unwrap();
    assert_eq!(t.amount.to_string(), "20000");
    assert_eq!(t.description, "Costi Cantiere Campana");
    assert!(t.project.is_none());

    run(&conn, &["rm", "3"]);
    let book = load_book(&SqliteStore::new(&conn)).unwrap();
    assert_eq!(book.transactions.len(), 2);
}

#[test]
fn list_search_matches_description_project_and_category_label() {
    let conn = setup();
    let ids = |args: &[&str]| -> Vec<String> { list(&conn, args).into_iter().map(|r| r.id).collect() };

    assert_eq!(ids(&["--search", "campana"]), vec!["2", "1"]);
    assert_eq!(ids(&["--search", "ARCHITETTI"]), vec!["3"]);
    // "Dipendenti & Collaboratori" is the PERSONALE label
    assert_eq!(ids(&["-s", "dipendenti"]), vec!["3"]);
    assert!(ids(&["--search", "fornitore"]).is_empty());
}

fn costs(conn: &Connection, args: &[&str]) -> Vec<reports::CostRow> {
    let store = SqliteStore::new(conn);
    let clock = clock();
    let ctx = Ctx { store: &store, clock: &clock, config: Config::default() };
    let mut argv = vec!["cantiere", "report", "costs"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let Some(("report", report_m)) = matches.subcommand() else { panic!("no report subcommand") };
    let Some(("costs", costs_m)) = report_m.subcommand() else { panic!("no costs subcommand") };
    reports::cost_rows(&ctx, costs_m).unwrap()
}

#[test]
fn cost_breakdown_per_project() {
    let conn = setup();

    let all = costs(&conn, &[]);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].category, Category::Construction);
    assert_eq!(all[1].amount, Decimal::from(2000));

    let site = costs(&conn, &["--project", "Campana"]);
    assert_eq!(site.len(), 1);
    assert_eq!(site[0].amount, Decimal::from(21150));
    assert_eq!(site[0].share, Decimal::ONE_HUNDRED);

    let general = costs(&conn, &["--project", GENERAL_BUCKET]);
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].category, Category::Hr);
    assert_eq!(general[0].label, "Dipendenti & Collaboratori");

    assert!(costs(&conn, &["--project", "Silvia"]).is_empty());
}
