// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn range_arg() -> Arg {
    Arg::new("range")
        .long("range")
        .default_value("all")
        .help("all|this-year|last-year|this-month|last-month")
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("date").long("date").help("YYYY-MM-DD (default: today)"))
        .arg(
            Arg::new("description")
                .long("description")
                .short('d')
                .required(required),
        )
        .arg(Arg::new("amount").long("amount").required(required))
        .arg(
            Arg::new("type")
                .long("type")
                .required(required)
                .help("revenue|cost"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .help("CANTIERI|MARKETING|PERSONALE|FISSI|ALTRO"),
        )
        .arg(Arg::new("project").long("project").help("Construction site / project"))
}

pub fn build_cli() -> Command {
    Command::new("cantiere")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Project-tagged revenue/cost tracking with KPIs, budgets and an advisory chat")
        .subcommand(Command::new("init").about("Create the local database"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(tx_fields(Command::new("add"), true))
                .subcommand(json_args(
                    Command::new("list")
                        .arg(range_arg())
                        .arg(Arg::new("project").long("project"))
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .short('s')
                                .help("Match description, project or category label"),
                        )
                        .arg(Arg::new("type").long("type"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(tx_fields(
                    Command::new("edit").arg(Arg::new("id").required(true)),
                    false,
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true))),
        )
        .subcommand(
            Command::new("budget")
                .about("Per-project budgets")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("project").long("project").required(true))
                        .arg(Arg::new("revenue").long("revenue").required(true))
                        .arg(Arg::new("cost").long("cost").required(true)),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(json_args(Command::new("report").arg(range_arg()))),
        )
        .subcommand(
            Command::new("report")
                .about("Derived figures")
                .subcommand(json_args(Command::new("kpi").arg(range_arg())))
                .subcommand(json_args(Command::new("projects").arg(range_arg())))
                .subcommand(json_args(
                    Command::new("costs").arg(range_arg()).arg(
                        Arg::new("project")
                            .long("project")
                            .help("Only this project (or \"Spese Generali / Altro\" for untagged)"),
                    ),
                )),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("transactions")
                    .arg(Arg::new("path").long("path").required(true))
                    .about("CSV: date,description,amount,type,category,project"),
            ),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("advisor")
                .about("CFO-style commentary")
                .subcommand(Command::new("advice").arg(range_arg()))
                .subcommand(
                    Command::new("chat")
                        .arg(range_arg())
                        .arg(
                            Arg::new("message")
                                .long("message")
                                .short('m')
                                .help("Ask a single question instead of an interactive session"),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Stored settings")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("sync")
                .about("Remote backend")
                .subcommand(Command::new("status"))
                .subcommand(Command::new("push").about("Upload the local copy")),
        )
}
