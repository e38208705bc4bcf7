//! Bitcoin display addresses.

use base58check::ToBase58Check;
use secp256k1::PublicKey;

use crate::primitives::bip32::Network;
use crate::primitives::hash::hash160;

/// A P2PKH address derived from a compressed public key, used when showing
/// the operator which address a message will be signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    network: Network,
    pubkey_hash: [u8; 20],
}

impl Address {
    pub fn p2pkh(pubkey: &PublicKey, network: Network) -> Self {
        Address {
            network,
            pubkey_hash: hash160(&pubkey.serialize()),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.pubkey_hash.to_base58check(self.network.p2pkh_version()))
    }
}
