mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod media;
mod page_selection;
mod paths;
mod pdf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // Logs go to stderr; stdout carries command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(config).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::RemovePages {
            inputs,
            pages,
            output_dir,
            password,
        } => {
            commands::remove::run(&config, &inputs, pages, output_dir, password)?;
        }
        Commands::Unlock {
            path,
            password,
            output,
        } => {
            commands::unlock::run(&config, &path, &password, output)?;
        }
        Commands::CompressPdf {
            path,
            output,
            password,
        } => {
            commands::compress::pdf(&config, &path, output, password.as_deref())?;
        }
        Commands::CompressImage {
            path,
            output,
            quality,
        } => {
            commands::compress::image(&config, &path, output, quality)?;
        }
        Commands::CompressVideo {
            path,
            output,
            bitrate,
            ffmpeg,
        } => {
            commands::compress::video(&config, &path, output, bitrate, ffmpeg)?;
        }
    }

    Ok(())
}
