//! Conversions between mnemonic words and their alternate representations:
//! decimal/hexadecimal/octal word indices typed on the keypad, and the
//! optical payload layouts a scanned code may carry.
//!
//! Numeric entry is gated per keystroke: `possible_keys` never offers a
//! character that could push the index out of the 1..=2048 range, and
//! `autocomplete` reports when a prefix is long enough that no further
//! keystroke is needed.

use log::debug;

use crate::bip39::Mnemonic;
use crate::device::{OpticalScanner, ScanData, UserInterface};
use crate::wordlist::{self, WORDLIST};

pub const DIGITS: &str = "0123456789";
pub const DIGITS_HEX: &str = "0123456789ABCDEF";
pub const DIGITS_OCT: &str = "01234567";
pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Typing this as the first entry of a digit capture loads the fixed test
/// mnemonic instead.
const SENTINEL_DIGITS: &str = "11111";

const MAX_WORD_INDEX: u32 = 2048;

/// Word-entry mode for the keypad capture engine. Each variant carries its
/// own resolve/autocomplete/legal-keys behavior, dispatched by match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Text,
    Decimal,
    Hexadecimal,
    Octal,
}

impl EntryMode {
    /// The input alphabet offered by the keypad.
    pub fn charset(&self) -> &'static str {
        match self {
            EntryMode::Text => LETTERS,
            EntryMode::Decimal => DIGITS,
            EntryMode::Hexadecimal => DIGITS_HEX,
            EntryMode::Octal => DIGITS_OCT,
        }
    }

    /// Prompt shown before the capture loop starts.
    pub fn intro(&self) -> &'static str {
        match self {
            EntryMode::Text => "Enter each word of your BIP-39 mnemonic.",
            EntryMode::Decimal => {
                "Enter each word of your BIP-39 mnemonic as a number from 1 to 2048."
            }
            EntryMode::Hexadecimal => {
                "Enter each word of your BIP-39 mnemonic as a number in hexadecimal from 1 to 800."
            }
            EntryMode::Octal => {
                "Enter each word of your BIP-39 mnemonic as a number in octal from 1 to 4000."
            }
        }
    }

    /// Fixed test sentinel, recognized only as the very first entry.
    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            EntryMode::Decimal => Some(SENTINEL_DIGITS),
            _ => None,
        }
    }

    fn radix(&self) -> Option<u32> {
        match self {
            EntryMode::Text => None,
            EntryMode::Decimal => Some(10),
            EntryMode::Hexadecimal => Some(16),
            EntryMode::Octal => Some(8),
        }
    }

    /// Resolve a completed entry buffer to a word list member. Malformed or
    /// out-of-range input yields `None` and the capture engine re-prompts.
    pub fn resolve(&self, buffer: &str) -> Option<&'static str> {
        match self.radix() {
            None => wordlist::words_with_prefix(buffer)
                .first()
                .copied()
                .filter(|w| *w == buffer),
            Some(radix) => u32::from_str_radix(buffer, radix)
                .ok()
                .filter(|n| (1..=MAX_WORD_INDEX).contains(n))
                .map(|n| WORDLIST[(n - 1) as usize]),
        }
    }

    /// Autocompletion for a partial buffer. Text mode completes to the
    /// unique matching word; numeric modes return the buffer itself once no
    /// further digit is needed to resolve it.
    pub fn autocomplete(&self, prefix: &str) -> Option<String> {
        if prefix.is_empty() {
            return None;
        }
        match self.radix() {
            None => {
                let matching = wordlist::words_with_prefix(prefix);
                if matching.len() == 1 {
                    Some(matching[0].to_string())
                } else {
                    None
                }
            }
            Some(radix) => {
                let value = u32::from_str_radix(prefix, radix).ok()?;
                let (full_len, early_bound) = match self {
                    EntryMode::Decimal => (4, 204),
                    EntryMode::Hexadecimal => (3, 0x80),
                    EntryMode::Octal => (4, 0o400),
                    EntryMode::Text => unreachable!(),
                };
                if prefix.len() == full_len || (prefix.len() == full_len - 1 && value > early_bound)
                {
                    Some(prefix.to_string())
                } else {
                    None
                }
            }
        }
    }

    /// Legal next characters for a partial buffer.
    pub fn possible_keys(&self, prefix: &str) -> String {
        match self {
            EntryMode::Text => {
                if prefix.is_empty() {
                    LETTERS.to_string()
                } else {
                    wordlist::next_letters(prefix)
                }
            }
            EntryMode::Decimal => match prefix {
                "" => DIGITS.replace('0', ""),
                "204" => DIGITS.replace('9', ""),
                _ => DIGITS.to_string(),
            },
            EntryMode::Hexadecimal => match prefix {
                "" => DIGITS_HEX.replace('0', ""),
                "80" => "0".to_string(),
                _ => DIGITS_HEX.to_string(),
            },
            EntryMode::Octal => match prefix {
                "" => DIGITS_OCT.replace('0', ""),
                "400" => "0".to_string(),
                _ => DIGITS_OCT.to_string(),
            },
        }
    }
}

/// Decode a scanned payload into mnemonic words, trying each layout in a
/// fixed order; the first strategy that matches wins and individual decode
/// failures are swallowed. Word count is not validated here.
pub fn decode_scan(data: &ScanData) -> Option<Vec<String>> {
    match data {
        // Structured tag form: words were extracted by the external parser.
        ScanData::Words(words) => Some(words.clone()),
        ScanData::Bytes(bytes) => decode_text(bytes)
            .or_else(|| decode_compact_entropy(bytes))
            .or_else(|| decode_digit_groups(bytes)),
    }
}

/// Plain text form: UTF-8, space-separated, exactly 12 or 24 tokens.
fn decode_text(bytes: &[u8]) -> Option<Vec<String>> {
    let text = std::str::from_utf8(bytes).ok()?;
    if !text.contains(' ') {
        return None;
    }
    let tokens: Vec<String> = text.split_whitespace().map(|t| t.to_string()).collect();
    if tokens.len() == 12 || tokens.len() == 24 {
        Some(tokens)
    } else {
        None
    }
}

/// Compact entropy form: 16 or 32 raw bytes of seed entropy.
fn decode_compact_entropy(bytes: &[u8]) -> Option<Vec<String>> {
    if bytes.len() != 16 && bytes.len() != 32 {
        return None;
    }
    let mnemonic = Mnemonic::from_entropy(bytes).ok()?;
    Some(mnemonic.words().to_vec())
}

/// Digit-group form: 48 or 96 bytes of 4-digit ASCII word indices (0-2047).
fn decode_digit_groups(bytes: &[u8]) -> Option<Vec<String>> {
    if bytes.len() != 48 && bytes.len() != 96 {
        return None;
    }
    bytes
        .chunks(4)
        .map(|group| {
            let index: usize = std::str::from_utf8(group).ok()?.parse().ok()?;
            WORDLIST.get(index).map(|w| w.to_string())
        })
        .collect()
}

/// Capture an optical code and decode it into candidate mnemonic words.
/// Scan failure and a bad decoded word count are both reported to the
/// operator as transient messages.
pub fn scan_mnemonic(
    ui: &mut dyn UserInterface,
    scanner: &mut dyn OpticalScanner,
) -> Option<Vec<String>> {
    let Some(scan) = scanner.capture() else {
        ui.flash("Failed to load mnemonic");
        return None;
    };
    match decode_scan(&scan.data) {
        Some(words) if words.len() == 12 || words.len() == 24 => Some(words),
        _ => {
            debug!("scan did not decode to a 12 or 24 word mnemonic");
            ui.flash("Invalid mnemonic length");
            None
        }
    }
}
