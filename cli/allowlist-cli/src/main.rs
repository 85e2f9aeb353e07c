#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};

mod build_tree;
mod claim;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "allowlist")]
#[command(about = "Merkle allowlist tools: build the tree, extract claims, verify proofs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the Merkle tree from an address list and write every proof
    BuildTree(build_tree::Cli),
    /// Extract and check one address's proof for submission to the contract
    Claim(claim::Cli),
    /// Check an address and proof against a root
    Verify(verify::Cli),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args)?,
        Commands::Claim(args) => claim::run(args)?,
        Commands::Verify(args) => verify::run(&args)?,
    }

    Ok(())
}
