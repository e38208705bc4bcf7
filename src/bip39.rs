//! BIP39 mnemonic encoding: entropy to words, checksum validation, seed
//! derivation and checksum-final-word completion.
//!
//! Only the 12 and 24 word forms exist on this device; the 15/18/21 word
//! variants are rejected.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::wordlist::WORDLIST;
use crate::{ColdkitError, Result};

/// Number of PBKDF2 iterations for mnemonic-to-seed conversion.
const PBKDF2_ITERATIONS: u32 = 2048;

/// A validated BIP39 mnemonic. The word buffer is wiped when the value is
/// dropped; construction paths hand it to key assembly exactly once.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Create a mnemonic from 16 or 32 entropy bytes.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        if entropy.len() != 16 && entropy.len() != 32 {
            return Err(ColdkitError::Mnemonic(format!(
                "Invalid entropy length: {} bytes",
                entropy.len()
            )));
        }

        let entropy_bits = entropy.len() * 8;
        let checksum_bits = entropy_bits / 32;
        let checksum = Sha256::digest(entropy)[0];

        let mut bits = Vec::with_capacity(entropy_bits + checksum_bits);
        for byte in entropy {
            for i in 0..8 {
                bits.push((byte >> (7 - i)) & 1 == 1);
            }
        }
        for i in 0..checksum_bits {
            bits.push((checksum >> (7 - i)) & 1 == 1);
        }

        let words = bits
            .chunks(11)
            .map(|chunk| {
                let index = chunk
                    .iter()
                    .fold(0usize, |acc, &bit| (acc << 1) | usize::from(bit));
                WORDLIST[index].to_string()
            })
            .collect();
        bits.zeroize();

        Ok(Mnemonic { words })
    }

    /// Create a mnemonic from already-collected words, validating length,
    /// membership and checksum.
    pub fn from_words(words: Vec<String>) -> Result<Self> {
        if words.len() != 12 && words.len() != 24 {
            return Err(ColdkitError::Mnemonic(format!(
                "Invalid word count: {}",
                words.len()
            )));
        }
        validate_checksum(&words)?;
        Ok(Mnemonic { words })
    }

    /// The words of the mnemonic.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Derive the BIP39 seed with an optional passphrase
    /// (PBKDF2-HMAC-SHA512, 2048 iterations).
    pub fn to_seed(&self, passphrase: Option<&str>) -> Seed {
        let mut phrase = self.words.join(" ");
        let mut salt = format!("mnemonic{}", passphrase.unwrap_or(""));

        let mut seed = [0u8; 64];
        pbkdf2::<Hmac<Sha512>>(phrase.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut seed);

        phrase.zeroize();
        salt.zeroize();
        Seed(seed)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic({} words)", self.words.len())
    }
}

/// A BIP39 seed derived from a mnemonic, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed(pub [u8; 64]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Check the checksum of a 12 or 24 word sequence.
pub fn validate_checksum(words: &[String]) -> Result<()> {
    let mut bits = Vec::with_capacity(words.len() * 11);
    for word in words {
        let index = WORDLIST
            .binary_search(&word.as_str())
            .map_err(|_| ColdkitError::Mnemonic(format!("Invalid word: {}", word)))?;
        for i in 0..11 {
            bits.push((index >> (10 - i)) & 1 == 1);
        }
    }

    let checksum_bits = words.len() / 3;
    let entropy_bits = words.len() * 11 - checksum_bits;

    let mut entropy = vec![0u8; entropy_bits / 8];
    for (i, &bit) in bits[..entropy_bits].iter().enumerate() {
        if bit {
            entropy[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    let checksum = Sha256::digest(&entropy)[0];
    let ok = bits[entropy_bits..]
        .iter()
        .enumerate()
        .all(|(i, &bit)| bit == ((checksum >> (7 - i)) & 1 == 1));

    bits.zeroize();
    entropy.zeroize();
    if ok {
        Ok(())
    } else {
        Err(ColdkitError::Mnemonic("Invalid checksum".to_string()))
    }
}

/// Pick a final word that makes `partial` (11 or 23 words) a checksum-valid
/// mnemonic, chosen uniformly among the valid candidates.
pub fn complete_final_word(partial: &[String]) -> Result<String> {
    if partial.len() != 11 && partial.len() != 23 {
        return Err(ColdkitError::Mnemonic(format!(
            "Cannot complete a {}-word prefix",
            partial.len()
        )));
    }

    let mut candidate: Vec<String> = partial.to_vec();
    candidate.push(String::new());
    let mut valid = Vec::new();
    for &word in WORDLIST.iter() {
        candidate[partial.len()] = word.to_string();
        if validate_checksum(&candidate).is_ok() {
            valid.push(word);
        }
    }
    candidate.zeroize();

    // Every 11/23-word prefix of in-list words has 128/8 valid completions;
    // an empty set means a prefix word was not in the list.
    if valid.is_empty() {
        return Err(ColdkitError::Mnemonic("No valid final word".to_string()));
    }
    let pick = rand::thread_rng().gen_range(0..valid.len());
    Ok(valid[pick].to_string())
}
