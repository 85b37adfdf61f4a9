use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use water_village::{
    replay::ReplayScript,
    rules::{RuleSet, RuleSetLoader},
    web::{self, WebServerConfig},
    Session,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Water-drop village game server")]
struct Cli {
    /// Built-in rule set name (classic, frontier) or path to a rule set YAML file
    #[arg(long, default_value = "classic", global = true)]
    rules: String,

    /// Seed for randomized building placement
    #[arg(long, default_value_t = 7, global = true)]
    seed: u64,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Serve the game API for a browser front end
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Milliseconds between income/feedback updates
        #[arg(long, default_value_t = 250)]
        tick_ms: u64,
    },
    /// Apply a YAML command script and print the final village as JSON
    Replay { script: PathBuf },
    /// Print the resolved rule set as YAML
    Rules,
}

fn init_tracing(rules: &RuleSet) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&rules.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let rules = RuleSetLoader::new(".").resolve(&cli.rules)?;
    init_tracing(&rules);

    match cli.command {
        Mode::Serve {
            host,
            port,
            tick_ms,
        } => {
            web::run(WebServerConfig {
                rules,
                seed: cli.seed,
                host,
                port,
                tick: Duration::from_millis(tick_ms.max(1)),
            })
            .await?;
        }
        Mode::Replay { script } => {
            let script = ReplayScript::load(&script)?;
            let mut session = Session::new(rules, cli.seed);
            let start = Utc::now();
            let reports = script.run(&mut session, start)?;
            for line in reports.iter().flat_map(|report| report.feedback()) {
                eprintln!("{line}");
            }
            let end = reports.last().map_or(start, |report| report.at);
            println!("{}", serde_json::to_string_pretty(&session.snapshot(end))?);
        }
        Mode::Rules => {
            print!("{}", serde_yaml::to_string(&rules)?);
        }
    }
    Ok(())
}
