pub mod allowlist;
pub mod artifact;
pub mod common;
pub mod error;
pub mod leaf;
pub mod tree;

pub use allowlist::{parse_allowlist, read_allowlist, Allowlist};
pub use artifact::{
    emit_artifacts, load_proof_artifact, render_tree_dump, ArtifactPaths, LoadedProofs,
    ProofArtifact,
};
pub use common::{
    hex_encode, keccak256, keccak256_hash, parse_address, parse_hash, write_file_atomic,
    write_files_atomic, Address, Hash,
};
pub use error::{AllowlistError, Result};
pub use leaf::{address_to_word, encode_leaf, parse_chain_id, AllowlistEntry, ChainId};
pub use tree::{combine, verify_proof, AllowlistTree};
