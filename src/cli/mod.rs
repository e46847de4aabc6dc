//! CLI module for the subscriber gateway
//!
//! Subcommands:
//! - `serve`: run the guarded subscriber API (default)
//! - `generate-key`: mint an API key and print its stored form

pub mod keygen;
pub mod serve;

use clap::{Parser, Subcommand};

/// Subscriber Gateway - API keys, scopes and throttling in front of the subscriber API
#[derive(Parser)]
#[command(name = "subscriber-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (default)
    Serve,

    /// Generate an API key, its lookup prefix and hash
    GenerateKey(keygen::KeygenArgs),
}
