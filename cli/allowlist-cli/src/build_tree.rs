use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use allowlist_cli::{
    emit_artifacts, hex_encode, parse_chain_id, read_allowlist, Allowlist, ArtifactPaths, ChainId,
};

const LOG_TARGET: &str = "allowlist::build_tree";

#[derive(Parser, Debug)]
#[command(name = "build-tree")]
#[command(about = "Build Merkle tree from allowlisted addresses", long_about = None)]
pub struct Cli {
    /// Input file containing Ethereum addresses (one per line)
    #[arg(short, long, env = "INPUT", default_value = "addrs.txt")]
    input: PathBuf,

    /// Chain id bound into every leaf (decimal or 0x-prefixed hex)
    #[arg(short, long, env = "CHAIN_ID", default_value = "4", value_parser = parse_chain_id)]
    chain_id: ChainId,

    /// Output file for the address -> proof map
    #[arg(short, long, default_value = "proofs.json")]
    output: PathBuf,

    /// Output file for Merkle root
    #[arg(short, long)]
    root_output: Option<PathBuf>,

    /// Output file for every tree node (level:index:hash)
    #[arg(short, long)]
    tree_output: Option<PathBuf>,

    /// Print the tree before writing artifacts
    #[arg(long)]
    show_tree: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Reading addresses from {:?}...", cli.input);
    let addresses = read_allowlist(&cli.input)
        .with_context(|| format!("Failed to read allowlist from {:?}", cli.input))?;

    println!("Total addresses: {}", addresses.len());
    println!("Building Merkle tree for chain {}...", cli.chain_id);
    let allowlist =
        Allowlist::new(addresses, cli.chain_id).context("Failed to build Merkle tree")?;
    info!(
        target: LOG_TARGET,
        "Tree depth {} over {} leaves",
        allowlist.tree().depth(),
        allowlist.len()
    );

    if cli.show_tree {
        println!("---------");
        println!("Merkle Tree");
        println!("---------");
        print!("{}", allowlist.tree());
        println!("---------");
    }

    println!("Merkle root: {}", hex_encode(allowlist.root()));

    emit_artifacts(
        &allowlist,
        &ArtifactPaths {
            proofs: &cli.output,
            root: cli.root_output.as_deref(),
            tree: cli.tree_output.as_deref(),
        },
    )
    .context("Failed to write artifacts")?;

    println!("Saved proofs to {:?}", cli.output);
    if let Some(root_path) = &cli.root_output {
        println!("Saved root to {:?}", root_path);
    }
    if let Some(tree_path) = &cli.tree_output {
        println!("Saved tree to {:?}", tree_path);
    }

    println!("Done!");
    Ok(())
}
