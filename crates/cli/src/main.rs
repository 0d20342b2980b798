//! Command Line Interface for the CLMM vault.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod runner;

use config::{AppConfig, CONFIG_ENV};
use runner::SimulationReport;

#[derive(Parser)]
#[command(name = "clmm-vault")]
#[command(about = "Managed concentrated-liquidity vault simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a vault lifecycle against a simulated market
    Simulate {
        /// JSON config file (falls back to $CLMM_VAULT_CONFIG, then defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the number of steps
        #[arg(long)]
        steps: Option<usize>,

        /// Override the price path seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full event log
        #[arg(long, default_value_t = false)]
        events: bool,

        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the default config as JSON
    DefaultConfig,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            steps,
            seed,
            events,
            json,
        } => {
            let mut app_config = match config.or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from)) {
                Some(path) => AppConfig::load(&path)?,
                None => AppConfig::default(),
            };
            if let Some(steps) = steps {
                app_config.simulation = app_config.simulation.with_steps(steps);
            }
            if let Some(seed) = seed {
                app_config.simulation = app_config.simulation.with_seed(seed);
            }

            if !json {
                println!(
                    "🚀 Simulating vault over {} steps (seed {})...",
                    app_config.simulation.steps, app_config.simulation.seed
                );
            }
            let (report, log) = runner::run(&app_config)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("serializing report")?
                );
            } else {
                print_report(&report);
            }
            if events {
                println!(
                    "{}",
                    serde_json::to_string_pretty(log.events()).context("serializing events")?
                );
            }
        }
        Commands::DefaultConfig => {
            println!("{}", AppConfig::default().to_json()?);
        }
    }

    Ok(())
}

fn print_report(report: &SimulationReport) {
    let vault = &report.vault;
    let activity = &report.activity;

    println!("\n📊 Vault Simulation Results");
    println!("════════════════════════════════════");
    if let (Some(start), Some(end)) = (report.started_at, report.ended_at) {
        println!("Period:           {} → {}", start, end);
    }
    println!("Price:            {} → {}", report.initial_price.round_dp(6), report.final_price.round_dp(6));
    println!("Range:            [{}, {}] (tick {})", vault.lower_tick, vault.upper_tick, vault.tick);
    println!("Liquidity:        {}", vault.liquidity);
    println!("Total Supply:     {}", vault.total_supply);
    println!("Underlying:       {} / {}", vault.underlying0, vault.underlying1);
    println!("Idle:             {} / {}", vault.idle0, vault.idle1);
    println!("════════════════════════════════════");
    println!("Keeper Rebalances:    {}", activity.keeper_rebalances);
    println!("Executive Rebalances: {}", activity.executive_rebalances);
    println!("Skipped (heartbeat):  {}", activity.skipped_rebalances);
    println!("Failed Operations:    {}", activity.failed_operations);
    println!("Wash Rounds:          {}", activity.wash_rounds);
    println!("Volume:               {} / {}", activity.volume0, activity.volume1);
    println!("════════════════════════════════════");
    println!(
        "Fees Harvested:   {} / {} ({} harvests)",
        report.events.fees_harvested0, report.events.fees_harvested1, report.events.harvests
    );
    println!("Keeper Paid:      {} / {}", report.payouts.keeper0, report.payouts.keeper1);
    println!("Treasury Paid:    {} / {}", report.payouts.treasury0, report.payouts.treasury1);
    println!("════════════════════════════════════");

    println!("\n👥 Depositors");
    println!(
        "{:<44} | {:>16} | {:>16} | {:>16} | {:>16}",
        "Address", "In 0", "In 1", "Out 0", "Out 1"
    );
    println!("{}", "-".repeat(122));
    for outcome in &report.depositors {
        println!(
            "{:<44} | {:>16} | {:>16} | {:>16} | {:>16}",
            format!("{:?}", outcome.depositor),
            outcome.deposited0,
            outcome.deposited1,
            outcome.withdrawn0,
            outcome.withdrawn1
        );
    }
    if activity.failed_operations > 0 {
        println!("\n⚠️  {} operations failed, see the log", activity.failed_operations);
    } else {
        println!("\n✅ Done");
    }
}
