//! Files handed to downstream consumers: the proofs map, the root and an optional tree dump.

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::allowlist::Allowlist;
use crate::common::{hex_encode, parse_address, parse_hash, write_files_atomic, Hash};
use crate::error::Result;
use crate::tree::AllowlistTree;

const LOG_TARGET: &str = "allowlist::artifact";

/// `{ "<address>": ["<sibling>", ...], ... }` in allowlist order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    proofs: Vec<(String, Vec<String>)>,
}

impl ProofArtifact {
    pub fn from_allowlist(allowlist: &Allowlist) -> Result<Self> {
        Ok(Self {
            proofs: allowlist.proofs()?,
        })
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Serialize for ProofArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.proofs.len()))?;
        for (address, proof) in &self.proofs {
            map.serialize_entry(address, proof)?;
        }
        map.end()
    }
}

/// Proofs read back from an artifact, keyed by lowercase `0x` address.
pub type LoadedProofs = BTreeMap<String, Vec<Hash>>;

/// Loads a proofs artifact, validating every address key and every digest.
pub fn load_proof_artifact(path: &Path) -> Result<LoadedProofs> {
    let contents = fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&contents)?;

    let mut proofs = BTreeMap::new();
    for (address, siblings) in raw {
        let address = hex_encode(parse_address(&address)?);
        let siblings = siblings
            .iter()
            .map(|sibling| parse_hash(sibling))
            .collect::<Result<Vec<_>>>()?;
        proofs.insert(address, siblings);
    }
    Ok(proofs)
}

/// One `level:index:0x<hash>` line per node, leaves first.
pub fn render_tree_dump(tree: &AllowlistTree) -> String {
    let mut dump = String::new();
    for (level_num, level) in tree.layers().iter().enumerate() {
        for (i, hash) in level.iter().enumerate() {
            let _ = writeln!(dump, "{}:{}:{}", level_num, i, hex_encode(hash));
        }
    }
    dump
}

/// Where a run writes its artifacts. Only the proofs file is mandatory.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactPaths<'a> {
    pub proofs: &'a Path,
    pub root: Option<&'a Path>,
    pub tree: Option<&'a Path>,
}

/// Renders and stages every artifact, then swaps them all into place. A failure at any
/// step leaves all previous artifacts untouched.
pub fn emit_artifacts(allowlist: &Allowlist, paths: &ArtifactPaths<'_>) -> Result<()> {
    let proofs_json = ProofArtifact::from_allowlist(allowlist)?.to_json()?;
    let root_line = format!("{}\n", hex_encode(allowlist.root()));
    let tree_dump = paths.tree.map(|_| render_tree_dump(allowlist.tree()));

    let mut files = vec![(paths.proofs, proofs_json.as_str())];
    if let Some(root_path) = paths.root {
        files.push((root_path, root_line.as_str()));
    }
    if let (Some(tree_path), Some(dump)) = (paths.tree, tree_dump.as_deref()) {
        files.push((tree_path, dump));
    }
    write_files_atomic(&files)?;

    debug!(
        target: LOG_TARGET,
        "Wrote {} proofs to {:?} ({} files)",
        allowlist.len(),
        paths.proofs,
        files.len()
    );
    Ok(())
}
