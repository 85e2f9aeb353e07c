use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use allowlist_cli::{
    encode_leaf, hex_encode, load_proof_artifact, parse_address, parse_chain_id, parse_hash,
    verify_proof, AllowlistError, ChainId, Hash,
};

#[derive(Parser, Debug)]
#[command(name = "verify")]
#[command(about = "Verify an allowlist proof against a Merkle root", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["proof", "proofs"])))]
pub struct Cli {
    /// Address to check (hex format, with or without 0x prefix)
    #[arg(short, long)]
    address: String,

    /// Trusted Merkle root (hex format)
    #[arg(short, long)]
    root: String,

    /// Chain id the leaf is scoped to
    #[arg(short, long, env = "CHAIN_ID", default_value = "4", value_parser = parse_chain_id)]
    chain_id: ChainId,

    /// Sibling hashes, comma separated, leaf to root
    #[arg(long, value_delimiter = ',')]
    proof: Vec<String>,

    /// Look the proof up in a file written by build-tree instead
    #[arg(short, long)]
    proofs: Option<PathBuf>,
}

fn resolve_proof(cli: &Cli, key: &str) -> Result<Vec<Hash>> {
    match &cli.proofs {
        Some(path) => {
            let proofs = load_proof_artifact(path).context("Failed to load proofs")?;
            let proof = proofs
                .get(key)
                .cloned()
                .ok_or_else(|| AllowlistError::EntryNotFound(key.to_string()))?;
            Ok(proof)
        },
        None => cli
            .proof
            .iter()
            .map(|sibling| parse_hash(sibling).context("Invalid proof element"))
            .collect(),
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let root = parse_hash(&cli.root).context("Invalid Merkle root")?;
    let address = parse_address(&cli.address).context("Invalid address")?;
    let key = hex_encode(address);
    let proof = resolve_proof(cli, &key)?;

    let leaf = encode_leaf(&address, &cli.chain_id);
    println!("Address: {}", key);
    println!("Chain id: {}", cli.chain_id);
    println!("Leaf: {}", hex_encode(leaf));
    println!("Proof length: {} nodes", proof.len());

    if !verify_proof(&leaf, &proof, &root) {
        anyhow::bail!("Proof is invalid for {} against root {}", key, hex_encode(root));
    }

    println!("Proof is valid against root {}", hex_encode(root));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowlist_cli::Allowlist;

    const ADDR_A: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_B: &str = "0x2222222222222222222222222222222222222222";
    const ROOT_AB: &str = "0xf4710f624daabb38cdacb7d1a8da75487eb54c51471728896012b5ef41f632c9";
    const LEAF_A: &str = "0xb7343549a9536f391671c3050c66deb1af0f3ede9688eb847b30447e55d6285a";
    const LEAF_B: &str = "0xce53ef3e8d9aa7e18fc44d8378145f2cb4b18a8dcd1dde867638f7071daae985";

    fn inline_cli(address: &str, proof: &[&str], chain_id: u64) -> Cli {
        Cli {
            address: address.to_string(),
            root: ROOT_AB.to_string(),
            chain_id: ChainId::from(chain_id),
            proof: proof.iter().map(|p| p.to_string()).collect(),
            proofs: None,
        }
    }

    #[test]
    fn test_verify_inline_proof() {
        assert!(run(&inline_cli(ADDR_A, &[LEAF_B], 4)).is_ok());
        assert!(run(&inline_cli(ADDR_B, &[LEAF_A], 4)).is_ok());
    }

    #[test]
    fn test_verify_swapped_proof_fails() {
        assert!(run(&inline_cli(ADDR_A, &[LEAF_A], 4)).is_err());
    }

    #[test]
    fn test_verify_replayed_on_other_chain_fails() {
        assert!(run(&inline_cli(ADDR_A, &[LEAF_B], 1337)).is_err());
    }

    #[test]
    fn test_verify_bad_proof_element() {
        let err = run(&inline_cli(ADDR_A, &["0x1234"], 4)).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid proof element"));
    }

    #[test]
    fn test_verify_from_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofs.json");
        let addresses = vec![parse_address(ADDR_A).unwrap(), parse_address(ADDR_B).unwrap()];
        let allowlist = Allowlist::new(addresses, ChainId::from(4)).unwrap();
        allowlist_cli::emit_artifacts(
            &allowlist,
            &allowlist_cli::ArtifactPaths {
                proofs: &path,
                root: None,
                tree: None,
            },
        )
        .unwrap();

        let mut cli = inline_cli(ADDR_B, &[], 4);
        cli.proofs = Some(path.clone());
        assert!(run(&cli).is_ok());

        let mut cli = inline_cli("0x3333333333333333333333333333333333333333", &[], 4);
        cli.proofs = Some(path);
        assert!(run(&cli).is_err());
    }
}
