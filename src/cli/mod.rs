// src/cli/mod.rs — CLI definition (clap derive)

pub mod collections;
pub mod doctor;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "storymill", about = "Story app backend", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print which environment-scoped database collections will be used
    Collections,
    /// Check the configuration: environment, provider key, analytics sink
    Doctor,
}
