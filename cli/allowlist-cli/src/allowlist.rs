use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::common::{hex_encode, parse_address, Address, Hash};
use crate::error::{AllowlistError, Result};
use crate::leaf::{AllowlistEntry, ChainId};
use crate::tree::AllowlistTree;

const LOG_TARGET: &str = "allowlist::entries";

/// Parses an address list: one address per line, blank lines skipped.
///
/// Any malformed or repeated address fails the whole list, reporting its 1-based line.
pub fn parse_allowlist(contents: &str) -> Result<Vec<Address>> {
    let mut addresses = Vec::new();
    let mut seen: HashMap<Address, usize> = HashMap::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line_num = line_num + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let address = parse_address(trimmed).map_err(|e| AllowlistError::InvalidEntry {
            line: line_num,
            source: Box::new(e),
        })?;
        if address == [0u8; 20] {
            warn!(target: LOG_TARGET, "Line {} is the zero address", line_num);
        }
        if let Some(first_line) = seen.insert(address, line_num) {
            return Err(AllowlistError::DuplicateEntry {
                address: hex_encode(address),
                first_line,
                line: line_num,
            });
        }
        addresses.push(address);
    }

    debug!(target: LOG_TARGET, "Parsed {} addresses", addresses.len());
    Ok(addresses)
}

/// Reads the whole file before parsing anything.
pub fn read_allowlist(path: &Path) -> Result<Vec<Address>> {
    let contents = fs::read_to_string(path)?;
    parse_allowlist(&contents)
}

/// An allowlist version: its entries in input order and the tree committing to them.
#[derive(Debug, Clone)]
pub struct Allowlist {
    chain_id: ChainId,
    entries: Vec<AllowlistEntry>,
    tree: AllowlistTree,
}

impl Allowlist {
    pub fn new(addresses: Vec<Address>, chain_id: ChainId) -> Result<Self> {
        if addresses.is_empty() {
            return Err(AllowlistError::EmptyAllowlist);
        }

        // Positions are 1-based indexes into `addresses`, not file lines.
        let mut seen: HashMap<Address, usize> = HashMap::with_capacity(addresses.len());
        let mut entries = Vec::with_capacity(addresses.len());
        for (index, address) in addresses.into_iter().enumerate() {
            if let Some(first_position) = seen.insert(address, index + 1) {
                return Err(AllowlistError::DuplicateAddress {
                    address: hex_encode(address),
                    first_position,
                    position: index + 1,
                });
            }
            entries.push(AllowlistEntry::new(address, chain_id));
        }

        let leaves = entries.iter().map(AllowlistEntry::leaf).collect();
        let tree = AllowlistTree::build(leaves)?;
        debug!(
            target: LOG_TARGET,
            "Committed {} entries on chain {} to root {}",
            entries.len(),
            chain_id,
            hex_encode(tree.root())
        );

        Ok(Self {
            chain_id,
            entries,
            tree,
        })
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn entries(&self) -> &[AllowlistEntry] {
        &self.entries
    }

    pub fn tree(&self) -> &AllowlistTree {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn proof_for(&self, address: &Address) -> Result<Vec<Hash>> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.address == address)
            .ok_or_else(|| AllowlistError::EntryNotFound(hex_encode(address)))?;
        self.tree.proof(index)
    }

    /// Every entry's lowercase address with its hex proof, in input order.
    pub fn proofs(&self) -> Result<Vec<(String, Vec<String>)>> {
        let mut proofs: Vec<(String, Vec<String>)> = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let proof = self.tree.proof(index)?;
            proofs.push((entry.address_hex(), proof.iter().map(hex_encode).collect()));
        }
        Ok(proofs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::verify_proof;

    const ADDR_A: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_B: &str = "0x2222222222222222222222222222222222222222";
    const ADDR_C: &str = "0x3333333333333333333333333333333333333333";

    fn addresses(list: &[&str]) -> Vec<Address> {
        list.iter().map(|a| parse_address(a).unwrap()).collect()
    }

    #[test]
    fn test_parse_allowlist_skips_blank_lines() {
        let upper_b = ADDR_B.to_uppercase().replace("0X", "0x");
        let contents = format!("{}\n\n   \n{}\r\n{}\n", ADDR_A, upper_b, ADDR_C);
        let parsed = parse_allowlist(&contents).unwrap();
        assert_eq!(parsed, addresses(&[ADDR_A, ADDR_B, ADDR_C]));
    }

    #[test]
    fn test_parse_allowlist_reports_bad_line() {
        let contents = format!("{}\n\n0xnot-an-address\n", ADDR_A);
        let result = parse_allowlist(&contents);
        match result {
            Err(AllowlistError::InvalidEntry { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_allowlist_rejects_duplicates_ignoring_case() {
        let contents = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd\n\
                        0x2222222222222222222222222222222222222222\n\
                        0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD\n";
        let result = parse_allowlist(contents);
        assert!(matches!(
            result,
            Err(AllowlistError::DuplicateEntry { first_line: 1, line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_allowlist_mixed_case_entries() {
        let contents = format!("{}\n0xAbCdEfAbCdEfAbCdEfAbCdEfAbCdEfAbCdEfAbCd\n", ADDR_A);
        let parsed = parse_allowlist(&contents).unwrap();
        assert_eq!(
            hex_encode(parsed[1]),
            "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd"
        );
    }

    #[test]
    fn test_parse_allowlist_empty_input() {
        assert!(parse_allowlist("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_allowlist_rejects_empty() {
        let result = Allowlist::new(Vec::new(), ChainId::from(4));
        assert!(matches!(result, Err(AllowlistError::EmptyAllowlist)));
    }

    #[test]
    fn test_allowlist_rejects_duplicates() {
        let result = Allowlist::new(addresses(&[ADDR_B, ADDR_A, ADDR_A]), ChainId::from(4));
        assert!(matches!(
            result,
            Err(AllowlistError::DuplicateAddress { first_position: 2, position: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_after_blank_lines_reports_file_line() {
        let contents = format!("{}\n\n\n{}\n", ADDR_A, ADDR_A);
        let result = parse_allowlist(&contents);
        assert!(matches!(
            result,
            Err(AllowlistError::DuplicateEntry { first_line: 1, line: 4, .. })
        ));
    }

    #[test]
    fn test_parse_allowlist_accepts_zero_address() {
        let contents = format!("{}\n0x0000000000000000000000000000000000000000\n", ADDR_A);
        let parsed = parse_allowlist(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], [0u8; 20]);

        let allowlist = Allowlist::new(parsed, ChainId::from(4)).unwrap();
        let zero = allowlist.entries()[1];
        let proof = allowlist.proof_for(&zero.address).unwrap();
        assert!(verify_proof(&zero.leaf(), &proof, &allowlist.root()));
    }

    #[test]
    fn test_two_entry_scenario() {
        let allowlist = Allowlist::new(addresses(&[ADDR_A, ADDR_B]), ChainId::from(4)).unwrap();
        let leaf_a = allowlist.entries()[0].leaf();
        let leaf_b = allowlist.entries()[1].leaf();
        let root = allowlist.root();

        let proof_a = allowlist.proof_for(&parse_address(ADDR_A).unwrap()).unwrap();
        let proof_b = allowlist.proof_for(&parse_address(ADDR_B).unwrap()).unwrap();
        assert_eq!(proof_a, vec![leaf_b]);
        assert_eq!(proof_b, vec![leaf_a]);
        assert!(verify_proof(&leaf_a, &proof_a, &root));
        assert!(verify_proof(&leaf_b, &proof_b, &root));
        assert!(!verify_proof(&leaf_a, &proof_b, &root));
        assert_eq!(
            hex_encode(root),
            "0xf4710f624daabb38cdacb7d1a8da75487eb54c51471728896012b5ef41f632c9"
        );
    }

    #[test]
    fn test_proof_for_unknown_address() {
        let allowlist = Allowlist::new(addresses(&[ADDR_A, ADDR_B]), ChainId::from(4)).unwrap();
        let result = allowlist.proof_for(&parse_address(ADDR_C).unwrap());
        assert!(matches!(result, Err(AllowlistError::EntryNotFound(_))));
    }

    #[test]
    fn test_proofs_keep_input_order() {
        let allowlist =
            Allowlist::new(addresses(&[ADDR_C, ADDR_A, ADDR_B]), ChainId::from(1337)).unwrap();
        let proofs = allowlist.proofs().unwrap();
        let keys: Vec<&str> = proofs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec![ADDR_C, ADDR_A, ADDR_B]);
        assert_eq!(proofs[0].1.len(), 2);
        assert_eq!(proofs[2].1.len(), 1);
    }

    #[test]
    fn test_chain_id_changes_root() {
        let on_rinkeby = Allowlist::new(addresses(&[ADDR_A, ADDR_B]), ChainId::from(4)).unwrap();
        let on_local = Allowlist::new(addresses(&[ADDR_A, ADDR_B]), ChainId::from(1337)).unwrap();
        assert_ne!(on_rinkeby.root(), on_local.root());
        assert_eq!(
            hex_encode(on_local.root()),
            "0x129d860487773c8cb5e497701415864a2ec3e4cec0e51a769604f728f20c87de"
        );
    }
}
