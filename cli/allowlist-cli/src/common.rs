use sha3::{Digest, Keccak256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AllowlistError, Result};

/// 20-byte Ethereum account address.
pub type Address = [u8; 20];

/// 32-byte Keccak256 digest. Leaves, internal nodes and roots all share this type.
pub type Hash = [u8; 32];

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix, in any letter case
///
/// # Errors
/// Returns an error if the address is not 40 hex characters or contains invalid hex
pub fn parse_address(addr_str: &str) -> Result<Address> {
    let cleaned = strip_hex_prefix(addr_str.trim());
    if cleaned.len() != 40 {
        return Err(AllowlistError::InvalidAddress(format!(
            "expected 40 hex chars, got {}",
            cleaned.len()
        )));
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| AllowlistError::InvalidAddress(format!("invalid hex encoding: {}", e)))?;
    Ok(address)
}

/// Parses a 32-byte digest from a hex string, with or without "0x" prefix.
pub fn parse_hash(hash_str: &str) -> Result<Hash> {
    let cleaned = strip_hex_prefix(hash_str.trim());
    if cleaned.len() != 64 {
        return Err(AllowlistError::InvalidHash(format!(
            "expected 64 hex chars, got {}",
            cleaned.len()
        )));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| AllowlistError::InvalidHash(format!("invalid hex encoding: {}", e)))?;
    Ok(hash)
}

/// Encodes bytes as lowercase hex with a "0x" prefix.
pub fn hex_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Keccak256 of an arbitrary byte string.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Computes a Keccak256 hash of two 32-byte values concatenated in the given order.
pub fn keccak256_hash(left: &Hash, right: &Hash) -> Hash {
    let hash = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();
    hash.into()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes and syncs `contents` next to `path`, returning the temp file to rename later.
fn stage_file(path: &Path, contents: &str) -> Result<PathBuf> {
    let temp = temp_path(path);
    let written = File::create(&temp).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(temp)
}

fn remove_staged(staged: &[(PathBuf, &Path)]) {
    for (temp, _) in staged {
        let _ = fs::remove_file(temp);
    }
}

/// Writes `contents` to `path` through a temp file and a rename, so readers
/// never observe a partially written file and a failed write leaves the old one in place.
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    write_files_atomic(&[(path, contents)])
}

/// Stages every file before renaming any of them. If one write fails, no target is touched
/// and every temp file is removed.
pub fn write_files_atomic(files: &[(&Path, &str)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    for (path, contents) in files {
        match stage_file(path, contents) {
            Ok(temp) => staged.push((temp, *path)),
            Err(e) => {
                remove_staged(&staged);
                return Err(e);
            },
        }
    }

    for (committed, (temp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp, path) {
            remove_staged(&staged[committed..]);
            return Err(e.into());
        }
    }
    Ok(())
}
