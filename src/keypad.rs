//! The generic word-by-word mnemonic capture loop shared by text, decimal,
//! hexadecimal and octal entry.
//!
//! The char-level keypad itself is a display/input collaborator; this module
//! consumes one committed buffer per word, resolves it through the active
//! [`EntryMode`], and runs the session rules: sentinel short-circuit,
//! checksum final-word completion, word deletion, the 12-word continuation
//! prompt, and whole-session cancellation.

use log::error;

use crate::bip39;
use crate::codec::EntryMode;
use crate::device::{EntryEvent, UserInterface};
use crate::wordlist::WORDLIST;

/// Index of the word paired with eleven `WORDLIST[0]` repetitions in the
/// canonical test mnemonic.
const SENTINEL_FINAL_WORD: usize = 1879;

/// Transient state of one capture invocation, threaded explicitly through
/// the loop. Never persisted; dropped on completion or cancellation.
struct CaptureSession {
    mode: EntryMode,
    words: Vec<String>,
}

/// The fixed canonical test mnemonic produced by the sentinel entry.
fn sentinel_words() -> Vec<String> {
    let mut words = vec![WORDLIST[0].to_string(); 11];
    words.push(WORDLIST[SENTINEL_FINAL_WORD].to_string());
    words
}

/// Capture up to 24 words from the keypad. Returns `None` on cancellation;
/// malformed entries are absorbed by re-prompting and never surface as
/// errors.
pub fn capture_words(ui: &mut dyn UserInterface, mode: EntryMode) -> Option<Vec<String>> {
    ui.show(mode.intro());
    if !ui.confirm("Proceed?") {
        return None;
    }

    let mut session = CaptureSession {
        mode,
        words: Vec::new(),
    };

    'words: while session.words.len() < 24 {
        if session.words.len() == 12 && ui.confirm("Done?") {
            break;
        }

        let slot = session.words.len();
        // None marks an empty final-slot entry: complete the checksum word.
        let resolved: Option<String> = loop {
            let prompt = format!("Word {}", slot + 1);
            match ui.capture_entry(&prompt, &[session.mode.charset()]) {
                EntryEvent::Cancel => return None,
                EntryEvent::DeleteLast => {
                    session.words.pop();
                    continue 'words;
                }
                EntryEvent::Entry(buffer) => {
                    if (slot == 11 || slot == 23) && buffer.is_empty() {
                        break None;
                    }
                    if slot == 0 && session.mode.sentinel() == Some(buffer.as_str()) {
                        return Some(sentinel_words());
                    }
                    if buffer.is_empty() {
                        continue;
                    }
                    if let Some(word) = session.mode.resolve(&buffer) {
                        break Some(word.to_string());
                    }
                    // Out-of-range or unknown entry: keep prompting.
                }
            }
        };

        let word = match resolved {
            Some(word) => word,
            None => match bip39::complete_final_word(&session.words) {
                Ok(word) => word,
                Err(e) => {
                    // All collected words came from the word list, so this
                    // is a programming error, not an input problem.
                    error!("final word completion failed: {}", e);
                    return None;
                }
            },
        };

        if ui.confirm(&word) {
            session.words.push(word);
        }
    }

    Some(session.words)
}
