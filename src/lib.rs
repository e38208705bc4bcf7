//! # coldkit
//!
//! The secret-acquisition and signing core of a dedicated offline Bitcoin
//! signing device. It turns physical operator input (typed characters,
//! numeric word indices, dice rolls, scanned optical codes) into a validated
//! BIP-39 mnemonic and ephemeral key material, and later uses that key
//! material to produce legacy signed-message or generic hash signatures.
//!
//! ## Architecture overview
//!
//! - [`wordlist`]: the BIP-39 word list and its first-letter search index
//! - [`codec`]: numeric word-entry modes and optical payload decoding
//! - [`dice`]: dice-roll entropy collection
//! - [`keypad`]: the generic word-by-word capture loop
//! - [`key`]: ephemeral key/wallet assembly
//! - [`signer`]: the message signing engine
//! - [`bip39`]: mnemonic/entropy/seed conversions
//! - [`primitives`]: BIP-32 derivation, hashing, varint, display addresses
//! - [`device`]: collaborator traits for display/input, scanner, storage and
//!   printer peripherals
//!
//! ## Execution model
//!
//! Everything is single-threaded, cooperative and strictly synchronous: each
//! flow runs to completion or blocks on one peripheral call. Cancellation is
//! an in-band signal: flows return `None` (or `Ok(None)`) and discard all
//! in-flight secret material on the way out. Buffers holding entropy,
//! mnemonics, digests or plaintext messages are wiped (`zeroize`) at the end
//! of the owning scope; the target hardware has a few hundred kilobytes of
//! RAM and may later be physically inspected.
//!
//! ## Error handling
//!
//! Fallible operations return [`Result<T, ColdkitError>`](error::ColdkitError).
//! Operator cancellation is not an error, and invalid input (an unknown
//! word, a bad optical payload, too few dice rolls) is always recovered
//! locally with a transient message.

pub mod bip39;
pub mod codec;
pub mod device;
pub mod dice;
pub mod error;
pub mod key;
pub mod keypad;
pub mod primitives;
pub mod signer;
pub mod types;
pub mod wordlist;

pub use error::{ColdkitError, Result};
pub use types::ColdkitConfig;

/// Initializes the library. Should be called once per process.
///
/// Sets up the logging infrastructure via `env_logger`; subsequent calls
/// have no effect after the first successful initialization.
pub fn init(config: &ColdkitConfig) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = config.log_level {
        builder.filter_level(level.into());
    }
    // It's ok if this fails, it just means logging was already initialized.
    let _ = builder.try_init();

    log::info!("coldkit initialized for {:?}", config.network);
    Ok(())
}
