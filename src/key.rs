//! Ephemeral key and wallet handles, and the interactive assembly flow that
//! turns captured words into one.
//!
//! Capture paths never see a live key, and the signing engine never sees
//! capture state; this module is the hand-off point between them.

use log::{error, info, warn};
use secp256k1::{Message, Secp256k1};
use zeroize::Zeroize;

use crate::bip39::Mnemonic;
use crate::codec::LETTERS;
use crate::device::{EntryEvent, Printer, UserInterface};
use crate::primitives::address::Address;
use crate::primitives::bip32::{DerivationPath, ExtendedPrivateKey, Network};
use crate::types::ColdkitConfig;
use crate::{ColdkitError, Result};

pub const UPPERCASE_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const NUM_SPECIAL_1: &str = "0123456789 !#$%&'()*";
pub const NUM_SPECIAL_2: &str = "+,-./:;<=>?@[\\]^_\"{|}~";

/// The four charsets cycled through during passphrase capture.
pub const PASSPHRASE_CHARSETS: [&str; 4] =
    [LETTERS, UPPERCASE_LETTERS, NUM_SPECIAL_1, NUM_SPECIAL_2];

/// Private key material derived from a mnemonic: the BIP32 root and the
/// network/script-dependent account key.
pub struct Key {
    mnemonic: Mnemonic,
    multisig: bool,
    network: Network,
    derivation: DerivationPath,
    root: ExtendedPrivateKey,
    account: ExtendedPrivateKey,
}

impl Key {
    pub fn new(
        mnemonic: Mnemonic,
        multisig: bool,
        network: Network,
        passphrase: Option<&str>,
    ) -> Result<Self> {
        let seed = mnemonic.to_seed(passphrase);
        let root = ExtendedPrivateKey::new_master_from_seed(seed.as_bytes(), network)?;
        let derivation = account_derivation(network, multisig);
        let account = root.derive_path(&derivation)?;
        Ok(Key {
            mnemonic,
            multisig,
            network,
            derivation,
            root,
            account,
        })
    }

    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn multisig(&self) -> bool {
        self.multisig
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The account derivation path.
    pub fn derivation(&self) -> &DerivationPath {
        &self.derivation
    }

    /// Sign a 32-byte digest with the account key, returning the
    /// DER-serialized signature.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>> {
        sign_with(&self.account, digest)
    }

    /// Sign a 32-byte digest with the child key at `path`, derived from the
    /// master key rather than the account.
    pub fn sign_at(&self, path: &DerivationPath, digest: &[u8; 32]) -> Result<Vec<u8>> {
        let child = self.root.derive_path(path)?;
        sign_with(&child, digest)
    }

    /// The compressed SEC encoding of the account public key.
    pub fn account_pubkey_sec(&self) -> Vec<u8> {
        self.account.public_key().serialize().to_vec()
    }

    /// Receive-branch (branch 0) address at `index` under the account.
    pub fn receive_address(&self, index: u32) -> Result<String> {
        let child = self.account.derive_child(0)?.derive_child(index)?;
        Ok(Address::p2pkh(&child.public_key(), self.network).to_string())
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("network", &self.network)
            .field("multisig", &self.multisig)
            .field("derivation", &self.derivation)
            .finish_non_exhaustive()
    }
}

fn sign_with(key: &ExtendedPrivateKey, digest: &[u8; 32]) -> Result<Vec<u8>> {
    let message = Message::from_digest_slice(digest)
        .map_err(|e| ColdkitError::Signing(format!("Invalid digest: {}", e)))?;
    let secp = Secp256k1::new();
    Ok(secp
        .sign_ecdsa(&message, &key.private_key)
        .serialize_der()
        .to_vec())
}

/// Account path: `m/84'/coin'/0'` single-sig, `m/48'/coin'/0'/2'` multisig.
fn account_derivation(network: Network, multisig: bool) -> DerivationPath {
    let coin = network.coin_type();
    let hardened = DerivationPath::hardened;
    if multisig {
        DerivationPath::new(vec![hardened(48), hardened(coin), hardened(0), hardened(2)])
    } else {
        DerivationPath::new(vec![hardened(84), hardened(coin), hardened(0)])
    }
}

/// The opaque wallet handle consumed by the signing engine.
pub struct Wallet {
    key: Key,
}

impl Wallet {
    pub fn new(key: Key) -> Self {
        Wallet { key }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn receive_address(&self, index: u32) -> Result<String> {
        self.key.receive_address(index)
    }
}

/// Interactive key assembly: confirm the candidate mnemonic, capture an
/// optional passphrase, choose single-key or multisig, and construct the
/// wallet handle. Any cancellation aborts with no key constructed.
pub fn assemble(
    ui: &mut dyn UserInterface,
    printer: Option<&mut dyn Printer>,
    words: Vec<String>,
    config: &ColdkitConfig,
) -> Option<Wallet> {
    let mnemonic = match Mnemonic::from_words(words) {
        Ok(mnemonic) => mnemonic,
        Err(e) => {
            info!("rejected candidate mnemonic: {}", e);
            ui.flash("Invalid mnemonic");
            return None;
        }
    };

    ui.show(&numbered_words(&mnemonic));
    if !ui.confirm("Continue?") {
        return None;
    }

    let mut passphrase: Option<String> = None;
    if ui.confirm("Add passphrase?") {
        loop {
            match ui.capture_entry("Passphrase", &PASSPHRASE_CHARSETS) {
                EntryEvent::Cancel => return None,
                EntryEvent::DeleteLast => continue,
                EntryEvent::Entry(entered) => {
                    passphrase = Some(entered);
                    break;
                }
            }
        }
    }

    let choice = ui.select("Wallet type", &["Single-key", "Multisig"])?;
    let multisig = choice == 1;

    ui.show("Loading..");
    let key = Key::new(mnemonic, multisig, config.network, passphrase.as_deref());
    if let Some(mut entered) = passphrase.take() {
        entered.zeroize();
    }
    let key = match key {
        Ok(key) => key,
        Err(e) => {
            error!("key construction failed: {}", e);
            ui.flash("Failed to load key");
            return None;
        }
    };
    let wallet = Wallet::new(key);

    // Best-effort peripheral attach; never blocks key creation.
    if let Some(printer) = printer {
        if let Err(e) = printer.connect() {
            warn!("could not connect printer: {}", e);
        }
    }

    Some(wallet)
}

/// Mnemonic rendered one numbered word per line for operator review.
fn numbered_words(mnemonic: &Mnemonic) -> String {
    mnemonic
        .words()
        .iter()
        .enumerate()
        .map(|(i, word)| format!("{}. {}", i + 1, word))
        .collect::<Vec<_>>()
        .join("\n")
}
