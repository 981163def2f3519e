// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — neuro CLI
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use clap::{Parser, Subcommand, ValueHint};
use neuro_cli::{default_sine_config, describe_network, eval_text, fit_sine, summary_json};
use neuro_core::serialize::{load_network, save_network};
use neuro_types::config::TrainingConfig;
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Train and inspect scaled-tanh networks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit sin(5x) on [-1, 1] and report the final errors as JSON
    FitSine {
        /// Training configuration (JSON); overrides --hidden
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Hidden-layer width of the default 1-N-1 network
        #[arg(long, default_value_t = 5)]
        hidden: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Write the trained network here
        #[arg(long, value_hint = ValueHint::FilePath)]
        save: Option<PathBuf>,
    },
    /// Evaluate a saved network on one input vector
    Eval {
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Comma-separated input values
        #[arg(long, allow_hyphen_values = true)]
        input: String,
    },
    /// Print the shape of a saved network
    Inspect {
        #[arg(long, value_hint = ValueHint::FilePath)]
        network: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::FitSine {
            config,
            hidden,
            seed,
            save,
        } => {
            let config = match config {
                Some(path) => TrainingConfig::from_file(&path.to_string_lossy())?,
                None => default_sine_config(hidden),
            };
            let cancel = AtomicBool::new(false);
            let (net, summary) = fit_sine(&config, seed, &cancel)?;
            if let Some(path) = save {
                save_network(&net, &path)?;
                info!(path = %path.display(), "network saved");
            }
            println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
        }
        Command::Eval { network, input } => {
            let net = load_network(&network)?;
            let output = eval_text(&net, &input)?;
            let values: Vec<String> = output.iter().map(|v| v.to_string()).collect();
            println!("{}", values.join(","));
        }
        Command::Inspect { network } => {
            let net = load_network(&network)?;
            println!("{}", serde_json::to_string_pretty(&describe_network(&net))?);
        }
    }
    Ok(())
}
