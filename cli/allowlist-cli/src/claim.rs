use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use allowlist_cli::{
    encode_leaf, hex_encode, load_proof_artifact, parse_address, parse_chain_id, parse_hash,
    verify_proof, write_file_atomic, AllowlistError, ChainId, Hash, LoadedProofs,
};

#[derive(Parser, Debug)]
#[command(name = "claim")]
#[command(about = "Generate allowlist mint claim", long_about = None)]
pub struct Cli {
    /// Proofs file written by build-tree
    #[arg(short, long, default_value = "proofs.json")]
    proofs: PathBuf,

    /// Allowlisted address (hex format, with or without 0x prefix)
    #[arg(short, long)]
    address: String,

    /// Merkle root currently set on the contract (hex format)
    #[arg(short, long)]
    root: String,

    /// Chain id the tree was built for
    #[arg(short, long, env = "CHAIN_ID", default_value = "4", value_parser = parse_chain_id)]
    chain_id: ChainId,

    /// Output JSON file
    #[arg(short, long)]
    output: PathBuf,
}

/// Arguments for `whitelistMint(bytes32[] proof, uint256 quantity)`, plus what they were derived from.
#[derive(Debug, Serialize)]
struct ClaimOutput {
    merkle_root: String,
    address: String,
    chain_id: String,
    leaf: String,
    merkle_proof: Vec<String>,
}

fn build_claim(
    proofs: &LoadedProofs,
    address: &str,
    chain_id: ChainId,
    root: &Hash,
) -> Result<ClaimOutput> {
    let address = parse_address(address).context("Invalid address")?;
    let key = hex_encode(address);
    let proof = proofs
        .get(&key)
        .ok_or_else(|| AllowlistError::EntryNotFound(key.clone()))?;

    let leaf = encode_leaf(&address, &chain_id);
    if !verify_proof(&leaf, proof, root) {
        anyhow::bail!(
            "Proof for {} does not verify against root {} on chain {}; the allowlist may have been \
             rotated, rebuild the proofs",
            key,
            hex_encode(root),
            chain_id
        );
    }

    Ok(ClaimOutput {
        merkle_root: hex_encode(root),
        address: key,
        chain_id: chain_id.to_string(),
        leaf: hex_encode(leaf),
        merkle_proof: proof.iter().map(hex_encode).collect(),
    })
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Validating Merkle root...");
    let root = parse_hash(&cli.root).context("Invalid Merkle root")?;

    println!("Loading proofs from {:?}...", cli.proofs);
    let proofs = load_proof_artifact(&cli.proofs).context("Failed to load proofs")?;

    println!("Looking up {}...", cli.address);
    let claim = build_claim(&proofs, &cli.address, cli.chain_id, &root)?;

    println!("Writing claim JSON to {:?}...", cli.output);
    let json_output = serde_json::to_string_pretty(&claim).context("Failed to serialize JSON")?;
    write_file_atomic(&cli.output, &json_output).context("Failed to write claim file")?;

    println!("\nClaim generated successfully!");
    println!("Address: {}", claim.address);
    println!("Leaf: {}", claim.leaf);
    println!("Proof length: {} nodes", claim.merkle_proof.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowlist_cli::Allowlist;

    const ADDR_A: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_B: &str = "0x2222222222222222222222222222222222222222";
    const ADDR_C: &str = "0x3333333333333333333333333333333333333333";

    fn loaded(allowlist: &Allowlist) -> LoadedProofs {
        allowlist
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.address_hex(),
                    allowlist.proof_for(&entry.address).unwrap(),
                )
            })
            .collect()
    }

    fn allowlist(chain_id: u64) -> Allowlist {
        let addresses = [ADDR_A, ADDR_B, ADDR_C]
            .iter()
            .map(|a| parse_address(a).unwrap())
            .collect();
        Allowlist::new(addresses, ChainId::from(chain_id)).unwrap()
    }

    #[test]
    fn test_build_claim() {
        let allowlist = allowlist(4);
        let proofs = loaded(&allowlist);
        let claim = build_claim(&proofs, ADDR_C, ChainId::from(4), &allowlist.root()).unwrap();
        assert_eq!(claim.address, ADDR_C);
        assert_eq!(claim.chain_id, "4");
        assert_eq!(claim.merkle_proof.len(), 1);
        assert_eq!(claim.merkle_root, hex_encode(allowlist.root()));
    }

    #[test]
    fn test_build_claim_accepts_uppercase_address() {
        let allowlist = allowlist(4);
        let proofs = loaded(&allowlist);
        let upper = ADDR_A.to_uppercase();
        let claim = build_claim(&proofs, &upper, ChainId::from(4), &allowlist.root()).unwrap();
        assert_eq!(claim.address, ADDR_A);
    }

    #[test]
    fn test_build_claim_wrong_chain() {
        let allowlist = allowlist(4);
        let proofs = loaded(&allowlist);
        let result = build_claim(&proofs, ADDR_A, ChainId::from(1337), &allowlist.root());
        assert!(result.is_err());
    }

    #[test]
    fn test_build_claim_rotated_root() {
        let old = allowlist(4);
        let proofs = loaded(&old);
        let rotated = Allowlist::new(
            vec![parse_address(ADDR_A).unwrap(), parse_address(ADDR_B).unwrap()],
            ChainId::from(4),
        )
        .unwrap();
        let result = build_claim(&proofs, ADDR_A, ChainId::from(4), &rotated.root());
        assert!(result.is_err());
    }

    #[test]
    fn test_build_claim_unknown_address() {
        let allowlist = allowlist(4);
        let proofs = loaded(&allowlist);
        let result = build_claim(
            &proofs,
            "0x4444444444444444444444444444444444444444",
            ChainId::from(4),
            &allowlist.root(),
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("is not in the allowlist"));
    }
}
