// Copyright (c) AlphaVelocity.
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
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn month_arg(required: bool) -> Arg {
    Arg::new("month")
        .long("month")
        .required(required)
        .help("Month as YYYY-MM")
}

fn today_arg() -> Arg {
    Arg::new("today")
        .long("today")
        .help("Reference date (YYYY-MM-DD) for past/future placement; defaults to today")
}

pub fn build_cli() -> Command {
    Command::new("budgetpulse")
        .version(clap::crate_version!())
        .about("Monthly and yearly budgets with recurring definitions, installments and variance reports")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("category")
                .about("Manage expense groups and subgroups")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("parent")
                                .long("parent")
                                .help("Group this subgroup belongs to"),
                        ),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("source")
                .about("Manage income sources")
                .subcommand(Command::new("add").arg(Arg::new("name").long("name").required(true)))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("earning|expense"),
                        )
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("value")
                                .long("value")
                                .required(true)
                                .help("Positive value, per installment"),
                        )
                        .arg(Arg::new("source").long("source"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .help("Group or subgroup name"),
                        )
                        .arg(Arg::new("method").long("method"))
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .help("Number of monthly installments (2 or more)"),
                        )
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(json_args(
                    Command::new("list").arg(month_arg(false)).arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Plan income and expenses per month")
                .subcommand(
                    Command::new("set")
                        .arg(month_arg(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("income|expense"),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("source").long("source"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("mode")
                                .long("mode")
                                .help("unique|recurring|installment; editing keeps the current mode, new budgets default to unique"),
                        )
                        .arg(Arg::new("installments").long("installments"))
                        .arg(
                            Arg::new("fixed")
                                .long("fixed")
                                .action(ArgAction::SetTrue)
                                .help("Mark as a fixed cost"),
                        ),
                )
                .subcommand(json_args(Command::new("list").arg(month_arg(false))))
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(
                            Arg::new("suppress")
                                .long("suppress")
                                .action(ArgAction::SetTrue)
                                .help("Keep propagation from re-creating it this month"),
                        ),
                )
                .subcommand(json_args(
                    Command::new("propagate")
                        .about("Carry recurring budgets forward")
                        .arg(month_arg(true))
                        .arg(
                            Arg::new("from")
                                .long("from")
                                .help("Last month already covered; every month after it is propagated in order"),
                        ),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Summaries, variance and trends")
                .subcommand(json_args(Command::new("month").arg(month_arg(true))))
                .subcommand(json_args(
                    Command::new("groups").arg(month_arg(true)).arg(
                        Arg::new("subcategories")
                            .long("subcategories")
                            .action(ArgAction::SetTrue),
                    ),
                ))
                .subcommand(json_args(Command::new("sources").arg(month_arg(true))))
                .subcommand(json_args(
                    Command::new("year")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(today_arg()),
                ))
                .subcommand(json_args(
                    Command::new("trend")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(
                            Arg::new("metric")
                                .long("metric")
                                .default_value("expense")
                                .help("income|expense|balance"),
                        )
                        .arg(
                            Arg::new("min-points")
                                .long("min-points")
                                .value_parser(value_parser!(usize)),
                        )
                        .arg(today_arg()),
                )),
        )
        .subcommand(Command::new("doctor").about("Report data integrity problems"))
        .subcommand(
            Command::new("config")
                .about("Classification thresholds")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
