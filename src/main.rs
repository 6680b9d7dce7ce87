// src/main.rs — Storymill entry point

use clap::Parser;

use storymill::cli::{collections, doctor, serve, Cli, Commands};
use storymill::infra::config::Config;
use storymill::infra::logger;

#[tokio::main]
async fn main() {
    logger::init_logging();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        let mut c = Config::load_from(std::path::Path::new(path))?;
        c.apply_env_overrides();
        c
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Serve { port } => serve::run_serve(&config, port).await,
        Commands::Collections => {
            collections::run_collections(&config);
            Ok(())
        }
        Commands::Doctor => doctor::run_doctor(&config),
    }
}
