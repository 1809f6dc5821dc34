use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use lfg_core::{FinalReport, PartialConfig, SimConfig};
use lfg_scheduler::RunController;
use tokio::sync::oneshot;
use tracing::info;

mod commands;

use commands::{queue, setup};

#[derive(Parser)]
#[command(
    name = "lfg",
    about = "LFG dungeon queue simulator",
    version,
)]
struct Cli {
    /// TOML file with startup parameters (flags take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Maximum number of concurrent dungeon instances
    #[arg(short = 'n', long)]
    instances: Option<u32>,
    /// Tanks initially in queue
    #[arg(long)]
    tanks: Option<u64>,
    /// Healers initially in queue
    #[arg(long)]
    healers: Option<u64>,
    /// DPS initially in queue
    #[arg(long)]
    dps: Option<u64>,
    /// Minimum dungeon run time in seconds
    #[arg(long)]
    min_time: Option<u64>,
    /// Maximum dungeon run time in seconds
    #[arg(long)]
    max_time: Option<u64>,
    /// Seed for run durations, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Keep the simulation open until interactive input is closed
    /// (`quit`, `exit` or end of input), even if the queue runs dry.
    #[arg(long)]
    hold: bool,
    /// Final report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl Cli {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            instances: self.instances,
            tanks: self.tanks,
            healers: self.healers,
            dps: self.dps,
            min_time: self.min_time,
            max_time: self.max_time,
            seed: self.seed,
        }
    }
}

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info,lfg=info";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => PartialConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PartialConfig::default(),
    };
    let partial = cli.overrides().merge(file);

    let config = setup::resolve(partial, &mut std::io::stdin().lock(), &mut std::io::stdout())
        .context("collecting startup parameters")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(simulate(config, cli.hold))?;

    match cli.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => {
            println!("\n----------------------------------------");
            println!("Simulation finished. No more parties can be formed.\n");
            print!("{}", report.render_text());
        }
    }

    Ok(())
}

async fn simulate(config: SimConfig, hold: bool) -> anyhow::Result<FinalReport> {
    let controller = RunController::new(config);
    let coordinator = controller.coordinator();

    println!("\n----------------------------------------");
    println!("Initial Queue: {}", controller.config().initial_queue());
    println!("Initial Instance Status:");
    for (id, state) in coordinator.status().await.instances {
        println!("Instance {id}: {state}");
    }
    println!("----------------------------------------");
    println!("{}", queue::HELP);

    let (closed_tx, closed_rx) = oneshot::channel();
    tokio::spawn(queue::serve(
        queue::spawn_stdin_reader(),
        coordinator,
        closed_tx,
    ));

    let report = if hold {
        info!("holding simulation open until input is closed");
        controller
            .run_until(async move {
                let _ = closed_rx.await;
            })
            .await?
    } else {
        controller.run().await?
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_filter_parses() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert!(filter.to_string().contains("lfg=info"));
    }
}
