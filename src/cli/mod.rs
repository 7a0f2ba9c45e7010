pub mod output;
pub mod shell;

use std::{io::IsTerminal, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use shell::Shell;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::{
    process_api::{ProcessMatcher, SysinfoSource},
    tracker::{
        storage::usage_store::CsvUsageStore, track_until_shutdown, Tracker, TrackerConfig,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, SHELL_PREFIX, STATS_PREFIX, TRACK_PREFIX},
    },
};

pub const DEFAULT_STORE: &str = "vscode_usage_log.csv";

#[derive(Parser, Debug)]
#[command(name = "codetime", version, long_about = None)]
#[command(about = "Tracks how long your editor is open each day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_STORE,
        help = "File with daily totals. Relative paths start from the current directory"
    )]
    store: PathBuf,
    #[arg(
        long,
        global = true,
        default_value = "code",
        help = "Counts time while any process name contains this text, ignoring case"
    )]
    process: String,
    #[arg(
        long,
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between process list checks"
    )]
    interval: u64,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Log level. Defaults to RUST_LOG or debug")]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Interactive shell with start, stop and stats commands. This is the default")]
    Shell,
    #[command(about = "Track in the foreground until Ctrl-C")]
    Track,
    #[command(about = "Print today's total and the last 7 tracked days")]
    Stats {
        #[arg(long, help = "Print the report as json")]
        json: bool,
    },
}

impl Args {
    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(self.interval),
            matcher: ProcessMatcher::new(&self.process),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let command = args.commands.unwrap_or(Commands::Shell);

    let prefix = match command {
        Commands::Shell => SHELL_PREFIX,
        Commands::Track => TRACK_PREFIX,
        Commands::Stats { .. } => STATS_PREFIX,
    };
    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    enable_logging(
        prefix,
        &create_application_default_path()?,
        logging_level,
        args.log,
    )?;

    let config = args.tracker_config();
    let store = CsvUsageStore::new(args.store);

    match command {
        Commands::Shell => {
            let colors = std::io::stdout().is_terminal();
            let shell = Shell::new(Tracker::new(store, config), std::io::stdout(), colors);
            shell.run(BufReader::new(tokio::io::stdin())).await
        }
        Commands::Track => {
            track_until_shutdown(
                store,
                Box::new(SysinfoSource::new()),
                &config,
                CancellationToken::new(),
                Arc::new(DefaultClock),
            )
            .await
        }
        Commands::Stats { json } => {
            let tracker = Tracker::new(store, config);
            output::print_report(&mut std::io::stdout(), tracker.generate_report().await?, json)
        }
    }
}
