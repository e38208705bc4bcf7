//! Dice-roll entropy collection.
//!
//! The operator rolls a physical die; each face value is appended to a
//! [`RollSession`]. Finalizing joins the symbols, hashes them with SHA-256
//! and truncates the digest to the target entropy size. Both the joined roll
//! string and its digest are shown to the operator before the mnemonic is
//! derived, so the whole derivation can be reproduced off-device.

use log::info;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::bip39::Mnemonic;
use crate::device::{EntryEvent, UserInterface};
use crate::types::WordCount;
use crate::{ColdkitError, Result};

const D6_STATES: [&str; 6] = ["1", "2", "3", "4", "5", "6"];
const D20_STATES: [&str; 20] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20",
];

// Minimum rolls per (die, word count), chosen so the collected entropy
// comfortably exceeds 128 or 256 bits under the symbol-joining scheme.
const D6_12W_MIN_ROLLS: usize = 50;
const D6_24W_MIN_ROLLS: usize = 99;
const D20_12W_MIN_ROLLS: usize = 30;
const D20_24W_MIN_ROLLS: usize = 60;

/// Supported physical dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Die {
    D6,
    D20,
}

impl Die {
    /// The symbols a roll of this die can produce.
    pub fn states(&self) -> &'static [&'static str] {
        match self {
            Die::D6 => &D6_STATES,
            Die::D20 => &D20_STATES,
        }
    }

    pub fn faces(&self) -> usize {
        self.states().len()
    }
}

/// Transient state of one dice-entropy session. Rolls grow and shrink under
/// operator control; the collected symbols are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RollSession {
    #[zeroize(skip)]
    die: Die,
    #[zeroize(skip)]
    target: WordCount,
    rolls: Vec<String>,
}

impl RollSession {
    pub fn new(die: Die, target: WordCount) -> Self {
        RollSession {
            die,
            target,
            rolls: Vec::new(),
        }
    }

    /// Minimum number of rolls before finalization is permitted.
    pub fn min_rolls(&self) -> usize {
        match (self.die, self.target) {
            (Die::D6, WordCount::Twelve) => D6_12W_MIN_ROLLS,
            (Die::D6, WordCount::TwentyFour) => D6_24W_MIN_ROLLS,
            (Die::D20, WordCount::Twelve) => D20_12W_MIN_ROLLS,
            (Die::D20, WordCount::TwentyFour) => D20_24W_MIN_ROLLS,
        }
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    /// Append one roll, validated against the die's symbol set.
    pub fn push(&mut self, symbol: &str) -> Result<()> {
        if !self.die.states().contains(&symbol) {
            return Err(ColdkitError::InvalidInput(format!(
                "Not a face of this die: {}",
                symbol
            )));
        }
        self.rolls.push(symbol.to_string());
        Ok(())
    }

    /// Remove the most recent roll. Returns whether anything was removed.
    pub fn delete_last(&mut self) -> bool {
        self.rolls.pop().is_some()
    }

    pub fn is_sufficient(&self) -> bool {
        self.rolls.len() >= self.min_rolls()
    }

    /// Join the collected symbols into the audit string: plain concatenation
    /// for dice with fewer than 10 faces, hyphen-separated otherwise so
    /// multi-digit symbols stay unambiguous.
    pub fn roll_string(&self) -> String {
        let refs: Vec<&str> = self.rolls.iter().map(|r| r.as_str()).collect();
        if self.die.faces() < 10 {
            refs.concat()
        } else {
            refs.join("-")
        }
    }

    /// Derive entropy from the collected rolls. Rejected with
    /// [`ColdkitError::InsufficientRolls`] while below the minimum; the
    /// session stays open.
    pub fn finalize(&self) -> Result<RollOutcome> {
        if !self.is_sufficient() {
            return Err(ColdkitError::InsufficientRolls {
                have: self.rolls.len(),
                need: self.min_rolls(),
            });
        }
        let roll_string = self.roll_string();
        let digest: [u8; 32] = Sha256::digest(roll_string.as_bytes()).into();
        Ok(RollOutcome {
            roll_string,
            digest,
            entropy_len: self.target.entropy_bytes(),
        })
    }
}

/// The finalized derivation: the joined roll string shown to the operator,
/// its SHA-256, and the entropy truncation length.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RollOutcome {
    pub roll_string: String,
    pub digest: [u8; 32],
    entropy_len: usize,
}

impl RollOutcome {
    /// The entropy bytes backing the mnemonic.
    pub fn entropy(&self) -> &[u8] {
        &self.digest[..self.entropy_len]
    }
}

/// Interactive dice-entropy flow: collect rolls, show the audit trail and
/// derive the mnemonic. Returns `None` on cancellation.
pub fn roll_mnemonic(
    ui: &mut dyn UserInterface,
    die: Die,
    target: WordCount,
) -> Option<Mnemonic> {
    let mut session = RollSession::new(die, target);
    ui.show(&format!(
        "Roll die at least {} times to generate a mnemonic.",
        session.min_rolls()
    ));
    if !ui.confirm("Proceed?") {
        return None;
    }

    let outcome = loop {
        match ui.capture_roll(&roll_title(&session), die.states()) {
            EntryEvent::Cancel => return None,
            EntryEvent::DeleteLast => {
                session.delete_last();
            }
            EntryEvent::Entry(symbol) if symbol.is_empty() => match session.finalize() {
                Ok(outcome) => break outcome,
                Err(_) => ui.flash("Not enough rolls!"),
            },
            EntryEvent::Entry(symbol) => {
                if session.push(&symbol).is_err() {
                    ui.flash("Invalid roll");
                }
            }
        }
    };

    ui.show(&format!("Rolls:\n\n{}", outcome.roll_string));
    ui.wait_for_button();
    ui.show(&format!("SHA256 of rolls:\n\n{}", hex::encode(outcome.digest)));
    ui.wait_for_button();

    info!("derived {} bytes of entropy from {} rolls", outcome.entropy().len(), session.len());
    match Mnemonic::from_entropy(outcome.entropy()) {
        Ok(mnemonic) => Some(mnemonic),
        Err(_) => None,
    }
}

/// Progress title: the roll count and the tail of the joined symbols.
fn roll_title(session: &RollSession) -> String {
    let joined = session.roll_string();
    let tail = if joined.len() <= 10 {
        joined
    } else {
        format!("...{}", &joined[joined.len() - 10..])
    };
    format!("Rolls: {}\n{}", session.len(), tail)
}
