use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ledger_sim::engine::SimEngine;
use ledger_sim::export::{build_export, export_json, write_to_file};
use ledger_sim::generator::{GeneratorConfig, ScenarioGenerator};
use ledger_sim::metrics::SimMetrics;
use ledger_sim::replay::validate_replay;
use ledger_sim::scenario::Scenario;
use vault_ledger::config::LedgerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledger-sim", version = ledger_sim::VERSION, about = "Vault ledger simulation and replay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scenario file and print (or write) the export
    Run {
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a seeded random scenario
    Generate {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1000)]
        steps: usize,
        #[arg(long, default_value_t = 8)]
        wallets: usize,
        #[arg(long, default_value_t = 1)]
        rejecting: usize,
        /// Per-call extraction ceiling; read from the environment when omitted
        #[arg(long, requires = "bank_cap")]
        max_extract: Option<u128>,
        /// Deposit ceiling; read from the environment when omitted
        #[arg(long, requires = "max_extract")]
        bank_cap: Option<u128>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a scenario twice and compare the final state hashes
    Replay {
        #[arg(long)]
        scenario: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Run { scenario, out } => run(scenario, out),
        Command::Generate {
            seed,
            steps,
            wallets,
            rejecting,
            max_extract,
            bank_cap,
            out,
        } => {
            let ledger_config = match (max_extract, bank_cap) {
                (Some(max_extract), Some(bank_cap)) => LedgerConfig::new(max_extract, bank_cap),
                _ => LedgerConfig::from_env().context("Ledger limits not given and not set in environment")?,
            };
            let config = GeneratorConfig {
                wallets,
                rejecting_wallets: rejecting,
                ..GeneratorConfig::default()
            };
            let scenario = ScenarioGenerator::new(config, ledger_config, seed).generate(steps);
            tracing::info!(seed, steps, "Generated scenario");
            match out {
                Some(path) => scenario
                    .write_to_file(&path)
                    .with_context(|| format!("Failed to write scenario to {}", path.display()))?,
                None => println!("{}", scenario.to_json()?),
            }
            Ok(())
        }
        Command::Replay { scenario } => replay(scenario),
    }
}

fn run(path: PathBuf, out: Option<PathBuf>) -> anyhow::Result<()> {
    let scenario = Scenario::load(&path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;

    let started = Instant::now();
    let mut engine = SimEngine::for_scenario(&scenario);
    engine.run(&scenario.steps);
    let mut metrics = SimMetrics::from_outcomes(&engine.outcomes);
    metrics.set_elapsed(started.elapsed());

    let export = build_export(&engine, &metrics);
    match out {
        Some(path) => {
            let target = path.to_string_lossy();
            write_to_file(&export, &target)
                .with_context(|| format!("Failed to write export to {target}"))?;
            tracing::info!(path = %target, hash = %export.state_hash, "Export written");
        }
        None => println!("{}", export_json(&export)?),
    }

    if export.invariant_violations > 0 {
        bail!("{} invariant violations during run", export.invariant_violations);
    }
    Ok(())
}

fn replay(path: PathBuf) -> anyhow::Result<()> {
    let scenario = Scenario::load(&path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;

    let mut engine = SimEngine::for_scenario(&scenario);
    engine.run(&scenario.steps);
    let validation = validate_replay(&scenario, &engine.ledger().snapshot());

    println!("{}", serde_json::to_string_pretty(&validation)?);
    if !validation.matches {
        bail!("Replay diverged: {} != {}", validation.original_hash, validation.replayed_hash);
    }
    Ok(())
}
