use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

mod config;
use config::TaskhookConfig;

mod error;
mod habitica;
mod sync;
mod webhooks;

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Configuration file for taskhook
    #[arg(short, long)]
    config: PathBuf,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: TaskhookConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;

    if config.github_secret.is_none() {
        warn!("no github_secret configured, every delivery will be rejected");
    }

    let rocket = webhooks::server(&config).context("failed to build webhook server")?;
    rocket.launch().await.map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}
