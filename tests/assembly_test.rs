mod common;

use coldkit::device::EntryEvent;
use coldkit::dice::{roll_mnemonic, Die};
use coldkit::key::assemble;
use coldkit::types::{ColdkitConfig, WordCount};
use common::{MockPrinter, MockUi};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn valid_words() -> Vec<String> {
    PHRASE.split(' ').map(|w| w.to_string()).collect()
}

#[test]
fn assembling_a_single_key_wallet() {
    let mut ui = MockUi::new().denying("Add passphrase?");
    let wallet = assemble(&mut ui, None, valid_words(), &ColdkitConfig::default()).unwrap();

    assert!(!wallet.key().multisig());
    assert_eq!(wallet.key().derivation().to_string(), "m/84'/0'/0'");
    assert!(wallet.receive_address(0).unwrap().starts_with('1'));

    // The candidate mnemonic was shown numbered for review.
    assert!(ui.shown.iter().any(|s| s.contains("1. abandon") && s.contains("12. about")));
}

#[test]
fn a_passphrase_changes_the_assembled_account() {
    let mut plain_ui = MockUi::new().denying("Add passphrase?");
    let plain = assemble(&mut plain_ui, None, valid_words(), &ColdkitConfig::default()).unwrap();

    let mut pass_ui = MockUi::new().with_entries(&["hunter2"]);
    let with_pass = assemble(&mut pass_ui, None, valid_words(), &ColdkitConfig::default()).unwrap();

    assert_ne!(plain.key().account_pubkey_sec(), with_pass.key().account_pubkey_sec());
}

#[test]
fn selecting_multisig_switches_the_account_path() {
    let mut ui = MockUi::new().denying("Add passphrase?").selecting(Some(1));
    let wallet = assemble(&mut ui, None, valid_words(), &ColdkitConfig::default()).unwrap();
    assert!(wallet.key().multisig());
    assert_eq!(wallet.key().derivation().to_string(), "m/48'/0'/0'/2'");
}

#[test]
fn declining_the_mnemonic_review_aborts() {
    let mut ui = MockUi::new().denying("Continue?");
    assert!(assemble(&mut ui, None, valid_words(), &ColdkitConfig::default()).is_none());
}

#[test]
fn cancelling_passphrase_capture_aborts() {
    let mut ui = MockUi::new().with_event(EntryEvent::Cancel);
    assert!(assemble(&mut ui, None, valid_words(), &ColdkitConfig::default()).is_none());
}

#[test]
fn dismissing_the_wallet_type_menu_aborts() {
    let mut ui = MockUi::new().denying("Add passphrase?").selecting(None);
    assert!(assemble(&mut ui, None, valid_words(), &ColdkitConfig::default()).is_none());
}

#[test]
fn checksum_invalid_words_are_rejected_with_a_message() {
    let mut words = vec!["abandon".to_string(); 11];
    words.push("acid".to_string());
    let mut ui = MockUi::new();
    assert!(assemble(&mut ui, None, words, &ColdkitConfig::default()).is_none());
    assert!(ui.flashed.iter().any(|f| f.contains("Invalid mnemonic")));
}

#[test]
fn a_broken_printer_does_not_block_key_creation() {
    let mut ui = MockUi::new().denying("Add passphrase?");
    let mut printer = MockPrinter::broken();
    let wallet = assemble(&mut ui, Some(&mut printer), valid_words(), &ColdkitConfig::default());
    assert!(wallet.is_some());
    assert_eq!(printer.connect_attempts, 1);
}

#[test]
fn dice_entropy_feeds_straight_into_assembly() {
    // End to end: 50 all-ones D6 rolls, then key assembly over the derived
    // mnemonic, reproducible run to run.
    let mut ui = MockUi::new()
        .with_entries(&["1"; 50])
        .with_event(EntryEvent::Entry(String::new()))
        .denying("Add passphrase?");
    let mnemonic = roll_mnemonic(&mut ui, Die::D6, WordCount::Twelve).unwrap();
    let words = mnemonic.words().to_vec();
    drop(mnemonic);

    let wallet = assemble(&mut ui, None, words, &ColdkitConfig::default()).unwrap();
    let first = assemble_reference_address();
    assert_eq!(wallet.receive_address(0).unwrap(), first);
}

/// The address a second, independent run derives for the same rolls.
fn assemble_reference_address() -> String {
    let mut ui = MockUi::new()
        .with_entries(&["1"; 50])
        .with_event(EntryEvent::Entry(String::new()))
        .denying("Add passphrase?");
    let mnemonic = roll_mnemonic(&mut ui, Die::D6, WordCount::Twelve).unwrap();
    let words = mnemonic.words().to_vec();
    let wallet = assemble(&mut ui, None, words, &ColdkitConfig::default()).unwrap();
    wallet.receive_address(0).unwrap()
}
