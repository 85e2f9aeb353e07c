use primitive_types::U256;
use std::fmt;
use std::str::FromStr;

use crate::common::{hex_encode, keccak256, Address, Hash};
use crate::error::AllowlistError;

/// Network identifier bound into every leaf so a proof issued for one deployment
/// cannot be replayed against the same contract on another chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChainId(U256);

impl ChainId {
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// Big-endian 32-byte encoding, as `abi.encode(uint256)` lays it out.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        bytes
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts decimal (`1337`) or 0x-prefixed hex (`0x539`).
impl FromStr for ChainId {
    type Err = AllowlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AllowlistError::InvalidChainId("empty value".to_string()));
        }

        let hex_digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"));
        if let Some(digits) = hex_digits {
            let significant = digits.trim_start_matches('0');
            if digits.is_empty() || significant.len() > 64 {
                return Err(AllowlistError::InvalidChainId(format!(
                    "expected 1 to 64 significant hex digits, got {}",
                    significant.len()
                )));
            }
            let padded = format!("{:0>64}", significant);
            let mut bytes = [0u8; 32];
            hex::decode_to_slice(&padded, &mut bytes)
                .map_err(|e| AllowlistError::InvalidChainId(format!("{}: {}", trimmed, e)))?;
            return Ok(Self(U256::from_big_endian(&bytes)));
        }

        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AllowlistError::InvalidChainId(format!(
                "{} is not a non-negative integer",
                trimmed
            )));
        }
        U256::from_dec_str(trimmed)
            .map(Self)
            .map_err(|e| AllowlistError::InvalidChainId(format!("{}: {:?}", trimmed, e)))
    }
}

pub fn parse_chain_id(value: &str) -> Result<ChainId, AllowlistError> {
    value.parse()
}

/// Left-pads a 20-byte address to a 32-byte word (12 zero bytes + address),
/// i.e. the address interpreted as a uint256.
pub fn address_to_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(address);
    word
}

/// One allowlisted account scoped to a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllowlistEntry {
    pub address: Address,
    pub chain_id: ChainId,
}

impl AllowlistEntry {
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        Self { address, chain_id }
    }

    pub fn leaf(&self) -> Hash {
        encode_leaf(&self.address, &self.chain_id)
    }

    /// Lowercase `0x` address, the key used in proof artifacts.
    pub fn address_hex(&self) -> String {
        hex_encode(self.address)
    }
}

/// `keccak256(uint256(address) || uint256(chain_id))`.
pub fn encode_leaf(address: &Address, chain_id: &ChainId) -> Hash {
    let mut buffer = [0u8; 64];
    buffer[..32].copy_from_slice(&address_to_word(address));
    buffer[32..].copy_from_slice(&chain_id.to_be_bytes());
    keccak256(&buffer)
}
