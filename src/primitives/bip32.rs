//! BIP32 hierarchical deterministic key derivation, trimmed to what an
//! offline signer needs: master-from-seed, hardened/normal child derivation
//! and path parsing. Extended-key serialization is not implemented.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

use crate::{ColdkitError, Result};

const BIP32_MASTER_KEY: &[u8] = b"Bitcoin seed";
const BIP32_HARDENED_KEY_LIMIT: u32 = 0x8000_0000;

/// Network type for key derivation and address display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Bitcoin,
    Testnet,
}

impl Network {
    /// SLIP-44 coin type used in account derivation paths.
    pub fn coin_type(&self) -> u32 {
        match self {
            Network::Bitcoin => 0,
            Network::Testnet => 1,
        }
    }

    /// Version byte for P2PKH address encoding.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x00,
            Network::Testnet => 0x6f,
        }
    }
}

/// Derivation path for BIP32 key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    path: Vec<u32>,
}

impl DerivationPath {
    pub fn new(path: Vec<u32>) -> Self {
        DerivationPath { path }
    }

    /// Get the path components.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Check if a child number is hardened.
    pub fn is_hardened(child_number: u32) -> bool {
        child_number >= BIP32_HARDENED_KEY_LIMIT
    }

    /// Create a hardened child number.
    pub fn hardened(index: u32) -> u32 {
        index + BIP32_HARDENED_KEY_LIMIT
    }
}

impl FromStr for DerivationPath {
    type Err = ColdkitError;

    fn from_str(s: &str) -> Result<Self> {
        let mut components = s.split('/');
        if components.next() != Some("m") {
            return Err(ColdkitError::InvalidInput(
                "Derivation path must start with 'm'".to_string(),
            ));
        }

        let mut path = Vec::new();
        for component in components {
            // Accept both apostrophe and 'h' hardened markers; wallets that
            // emit signmessage requests use the latter.
            let (index_str, is_hardened) = if component.ends_with('\'') || component.ends_with('h') {
                (&component[..component.len() - 1], true)
            } else {
                (component, false)
            };

            let index: u32 = index_str.parse().map_err(|_| {
                ColdkitError::InvalidInput(format!("Invalid path component: {}", component))
            })?;
            if index >= BIP32_HARDENED_KEY_LIMIT {
                return Err(ColdkitError::InvalidInput(format!(
                    "Path component index too large: {}",
                    index
                )));
            }

            path.push(if is_hardened {
                DerivationPath::hardened(index)
            } else {
                index
            });
        }

        Ok(DerivationPath::new(path))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for &child_number in &self.path {
            if DerivationPath::is_hardened(child_number) {
                write!(f, "/{}'", child_number - BIP32_HARDENED_KEY_LIMIT)?;
            } else {
                write!(f, "/{}", child_number)?;
            }
        }
        Ok(())
    }
}

/// Extended private key: the secret scalar plus its chain code.
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    pub network: Network,
    pub depth: u8,
    pub child_number: u32,
    pub private_key: SecretKey,
    chain_code: [u8; 32],
}

impl ExtendedPrivateKey {
    /// Create a new master key from a seed.
    pub fn new_master_from_seed(seed: &[u8], network: Network) -> Result<Self> {
        let mut mac = Hmac::<sha2::Sha512>::new_from_slice(BIP32_MASTER_KEY)
            .map_err(|e| ColdkitError::Derivation(format!("HMAC init: {}", e)))?;
        mac.update(seed);
        let result = mac.finalize().into_bytes();
        let (key_bytes, chain_code_bytes) = result.split_at(32);

        let private_key = SecretKey::from_slice(key_bytes)
            .map_err(|e| ColdkitError::Derivation(format!("Invalid key from seed: {}", e)))?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(chain_code_bytes);

        Ok(ExtendedPrivateKey {
            network,
            depth: 0,
            child_number: 0,
            private_key,
            chain_code,
        })
    }

    /// Derive a single child private key.
    pub fn derive_child(&self, child_number: u32) -> Result<ExtendedPrivateKey> {
        let secp = Secp256k1::new();

        let mut mac = Hmac::<sha2::Sha512>::new_from_slice(&self.chain_code)
            .map_err(|e| ColdkitError::Derivation(format!("HMAC init: {}", e)))?;
        if DerivationPath::is_hardened(child_number) {
            // Hardened derivation commits to the private key.
            mac.update(&[0]);
            mac.update(&self.private_key.secret_bytes());
        } else {
            mac.update(&self.private_key.public_key(&secp).serialize());
        }
        mac.update(&child_number.to_be_bytes());
        let result = mac.finalize().into_bytes();
        let (key_bytes, chain_code_bytes) = result.split_at(32);

        // Scalar addition modulo the curve order, handled by secp256k1.
        let scalar = SecretKey::from_slice(key_bytes)
            .map_err(|e| ColdkitError::Derivation(format!("Invalid scalar: {}", e)))?;
        let child_private_key = self
            .private_key
            .add_tweak(&secp256k1::Scalar::from(scalar))
            .map_err(|e| ColdkitError::Derivation(format!("Invalid child key: {}", e)))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(chain_code_bytes);

        Ok(ExtendedPrivateKey {
            network: self.network,
            depth: self.depth + 1,
            child_number,
            private_key: child_private_key,
            chain_code,
        })
    }

    /// Derive a key along a full derivation path.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<ExtendedPrivateKey> {
        let mut current = self.clone();
        for &child_number in path.path() {
            current = current.derive_child(child_number)?;
        }
        Ok(current)
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        self.private_key.public_key(&secp)
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("network", &self.network)
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parsing() {
        let path = DerivationPath::from_str("m/84'/0'/0'/0/5").unwrap();
        assert_eq!(
            path.path(),
            &[
                DerivationPath::hardened(84),
                DerivationPath::hardened(0),
                DerivationPath::hardened(0),
                0,
                5
            ]
        );

        // 'h' marker, as emitted by signmessage requests
        let alt = DerivationPath::from_str("m/84h/0h/0h/0/5").unwrap();
        assert_eq!(alt, path);

        assert_eq!(DerivationPath::from_str("m").unwrap().path(), &[] as &[u32]);
        assert!(DerivationPath::from_str("84'/0'").is_err());
        assert!(DerivationPath::from_str("m/abc").is_err());
        assert!(DerivationPath::from_str("m/2147483648").is_err());
    }

    #[test]
    fn test_path_display() {
        let path = DerivationPath::from_str("m/48h/1h/0h/2h").unwrap();
        assert_eq!(path.to_string(), "m/48'/1'/0'/2'");
    }

    #[test]
    fn test_bip32_vector_1() {
        // BIP32 test vector 1, seed 000102030405060708090a0b0c0d0e0f
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let master = ExtendedPrivateKey::new_master_from_seed(&seed, Network::Bitcoin).unwrap();
        assert_eq!(
            hex::encode(master.public_key().serialize()),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );

        let child = master.derive_child(DerivationPath::hardened(0)).unwrap();
        assert_eq!(
            hex::encode(child.public_key().serialize()),
            "035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56"
        );
        assert_eq!(child.depth, 1);
    }

    #[test]
    fn test_derive_path_matches_chained_children() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let master = ExtendedPrivateKey::new_master_from_seed(&seed, Network::Bitcoin).unwrap();

        let path = DerivationPath::from_str("m/0'/1").unwrap();
        let by_path = master.derive_path(&path).unwrap();
        let by_steps = master
            .derive_child(DerivationPath::hardened(0))
            .unwrap()
            .derive_child(1)
            .unwrap();
        assert_eq!(by_path.public_key(), by_steps.public_key());
    }
}
