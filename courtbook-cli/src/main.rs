//! The `courtbook` binary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use courtbook_browser::ChromeSessionFactory;
use courtbook_core::{BookingError, FailureReport, RunCoordinator, plan_run, weekday_name};

mod clock;
mod config;
mod logging;

const BUILD_SHA: &str = env!("COURTBOOK_BUILD_SHA");

/// Used when the trigger comes from the clock: a cron job firing a few
/// minutes late still maps onto its rule.
const CLOCK_TOLERANCE_MINUTES: i64 = 60;

#[derive(Parser, Debug)]
#[command(name = "courtbook", version, about = "Book recurring tennis court slots ahead of time")]
struct Cli {
    /// Config file (default: ~/.courtbook/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Book the slot for a trigger, e.g. `courtbook book Monday 19:00`.
    /// Without a trigger the current local time is used.
    Book {
        trigger: Vec<String>,

        #[command(flatten)]
        timing: Timing,
    },

    /// Show which slot a trigger would book, without opening a browser
    Resolve {
        trigger: Vec<String>,

        #[command(flatten)]
        timing: Timing,
    },

    /// List the configured booking rules
    Rules,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct Timing {
    /// Pretend the local time is this ("YYYY-MM-DD HH:MM")
    #[arg(long)]
    now: Option<String>,

    /// Snap an off-schedule trigger to a rule within this many minutes
    #[arg(long)]
    tolerance_minutes: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective config (file + environment)
    Show,
    /// Print the config file location
    Path,
}

#[derive(Serialize)]
struct Resolution<'a> {
    trigger: String,
    rule: String,
    target_date: String,
    target_weekday: &'a str,
    target_time: String,
    contact: &'a str,
    now: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Book { trigger, timing } => book(config_path, trigger, timing).await,

        Command::Resolve { trigger, timing } => {
            let cfg = config::load_config(config_path)?;
            let (key, now, tolerance) = trigger_and_clock(&cfg, &trigger, &timing)?;
            let booking = cfg.to_booking_config(tolerance)?;
            let plan = plan_run(&booking, &key, now)?;

            let resolution = Resolution {
                trigger: plan.key.to_string(),
                rule: plan.rule.describe(),
                target_date: plan.target.date_string(),
                target_weekday: weekday_name(plan.target.weekday),
                target_time: plan.target.time_string(),
                contact: &plan.rule.contact,
                now: now.format("%Y-%m-%d %H:%M").to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Rules => {
            let cfg = config::load_config(config_path)?;
            let booking = cfg.to_booking_config(None)?;
            for rule in booking.schedule.rules() {
                println!("{}", rule.describe());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Config { command } => {
            match command {
                ConfigCommand::Init => {
                    config::init_config(config_path)?;
                }
                ConfigCommand::Show => {
                    let cfg = config::load_config(config_path)?;
                    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                }
                ConfigCommand::Path => {
                    println!("{}", config::config_path(config_path)?.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Key, local "now", and tolerance for a run. An empty trigger means "now".
fn trigger_and_clock(
    cfg: &config::Config,
    trigger: &[String],
    timing: &Timing,
) -> Result<(String, chrono::NaiveDateTime, Option<i64>)> {
    let now = match &timing.now {
        Some(s) => clock::parse_local(s)?,
        None => clock::local_now(cfg.tz()?),
    };
    if trigger.is_empty() {
        let tolerance = timing.tolerance_minutes.or(Some(CLOCK_TOLERANCE_MINUTES));
        Ok((clock::trigger_key_at(now), now, tolerance))
    } else {
        Ok((trigger.join(" "), now, timing.tolerance_minutes))
    }
}

async fn book(config_path: Option<&std::path::Path>, trigger: Vec<String>, timing: Timing) -> Result<ExitCode> {
    info!(build = BUILD_SHA, "courtbook starting");

    let prepared = config::load_config(config_path).and_then(|cfg| {
        let (key, now, tolerance) = trigger_and_clock(&cfg, &trigger, &timing)?;
        let booking = cfg.to_booking_config(tolerance)?;
        booking.validate()?;
        Ok((cfg, booking, key, now))
    });
    let (cfg, booking, key, now) = match prepared {
        Ok(p) => p,
        Err(err) => {
            let report = match err.downcast_ref::<BookingError>() {
                Some(e) => FailureReport::from(e),
                None => FailureReport::from(&BookingError::Configuration(format!("{err:#}"))),
            };
            return report_failure(&report);
        }
    };

    let factory = ChromeSessionFactory::new(cfg.browser.clone(), booking.layout.clone());
    let coordinator = RunCoordinator::new(booking, factory);

    match coordinator.run(&key, now).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure(&FailureReport::from(&err)),
    }
}

fn report_failure(report: &FailureReport) -> Result<ExitCode> {
    eprintln!("{}", serde_json::to_string(report)?);
    Ok(ExitCode::FAILURE)
}
