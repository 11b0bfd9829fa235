// Copyright (c) 2026  ForkPurge contributors
//
// This file is part of ForkPurge.
//
// ForkPurge is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ForkPurge is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ForkPurge. If not, see <https://www.gnu.org/licenses/>.


use anyhow::Context;
use getopts::Options;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forkpurge::{config, github, purge};

use std::env;
use std::process;


#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forkpurge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(_) => (),
        Err(e) => {
            eprintln!("error: {:#}", e);

            process::exit(exit_code(&e));
        },
    };
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut opts = Options::new();

    opts.optopt(
        "",
        "older-than",
        "delete forks not updated in more than DAYS days (default 60)",
        "DAYS",
    );
    opts.optopt(
        "",
        "timeout",
        "abandon deletions still running after SECONDS seconds",
        "SECONDS",
    );
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("V", "version", "show the program version");

    let opt_matches = opts.parse(&args[1..])?;

    if opt_matches.opt_present("h") {
        print_usage(&opts);
        return Ok(());
    }

    if opt_matches.opt_present("V") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = config::Config::from_env()
        .context("unable to read configuration")?;

    if let Some(days) = opt_matches.opt_str("older-than") {
        config.older_than_days = config::parse_older_than("--older-than", &days)?;
    }

    if let Some(seconds) = opt_matches.opt_str("timeout") {
        config.timeout = Some(config::parse_timeout("--timeout", &seconds)?);
    }

    tracing::debug!(?config, "starting");

    let client = github::Client::new(&config)
        .context("unable to build GitHub client")?;

    purge::run(&client, &config).await?;

    Ok(())
}

fn print_usage(opts: &Options) {
    let brief = format!(
        "usage: {} [options]\n\n\
        Delete forked repositories of $GITHUB_USERNAME that have not been\n\
        updated recently. Requires $GITHUB_API_TOKEN.",
        env!("CARGO_PKG_NAME"),
    );

    print!("{}", opts.usage(&brief));
}

fn exit_code(error: &anyhow::Error) -> exitcode::ExitCode {
    if error.downcast_ref::<getopts::Fail>().is_some() {
        return exitcode::USAGE;
    }

    if error.downcast_ref::<config::Error>().is_some() {
        return exitcode::CONFIG;
    }

    match error.downcast_ref::<purge::Error>() {
        Some(purge::Error::Listing(_)) => exitcode::UNAVAILABLE,
        Some(purge::Error::DeadlineExceeded { .. }) => exitcode::TEMPFAIL,
        Some(purge::Error::Deletions { .. }) => exitcode::SOFTWARE,
        None => exitcode::SOFTWARE,
    }
}
