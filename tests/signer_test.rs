mod common;

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, Secp256k1};

use coldkit::bip39::Mnemonic;
use coldkit::device::{QrFormat, Scan, ScanData};
use coldkit::key::{Key, Wallet};
use coldkit::primitives::bip32::{DerivationPath, ExtendedPrivateKey, Network};
use coldkit::primitives::hash::sha256;
use coldkit::signer::{sign_message_flow, signed_message_digest};
use common::{MemStorage, MockPrinter, MockScanner, MockUi};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn test_wallet() -> Wallet {
    let words = PHRASE.split(' ').map(|w| w.to_string()).collect();
    let mnemonic = Mnemonic::from_words(words).unwrap();
    Wallet::new(Key::new(mnemonic, false, Network::Bitcoin, None).unwrap())
}

fn verify(digest: &[u8; 32], der: &[u8], pubkey: &secp256k1::PublicKey) -> bool {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest).unwrap();
    let sig = Signature::from_der(der).unwrap();
    secp.verify_ecdsa(&message, &sig, pubkey).is_ok()
}

fn bytes_scan(data: &[u8], format: QrFormat) -> MockScanner {
    MockScanner::with(Scan {
        data: ScanData::Bytes(data.to_vec()),
        format,
    })
}

#[test]
fn address_bound_message_is_signed_with_the_child_key() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(b"signmessage m/84h/0h/0h/0/3 ascii:hello world", QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet)
        .unwrap()
        .unwrap();

    // The signature must verify against the child key at the parsed path,
    // over the legacy magic-prefixed double-SHA256 digest.
    let seed = Mnemonic::from_words(PHRASE.split(' ').map(|w| w.to_string()).collect())
        .unwrap()
        .to_seed(None);
    let master = ExtendedPrivateKey::new_master_from_seed(seed.as_bytes(), Network::Bitcoin).unwrap();
    let child = master
        .derive_path(&DerivationPath::from_str("m/84'/0'/0'/0/3").unwrap())
        .unwrap();
    let digest = signed_message_digest(b"hello world").unwrap();
    assert!(verify(&digest, &signed.signature, &child.public_key()));
    assert_eq!(signed.encoded, BASE64.encode(&signed.signature));

    // The confirmation screen displayed the derived receive address.
    let address = wallet.receive_address(3).unwrap();
    assert!(ui.shown.iter().any(|s| s.contains(&address)));
    assert!(ui.shown.iter().any(|s| s.contains("hello world")));
    assert_eq!(ui.qr_shown.len(), 1);
}

#[test]
fn declining_the_address_bound_confirmation_produces_no_signature() {
    let wallet = test_wallet();
    let mut ui = MockUi::new().denying("Sign?");
    let mut scanner = bytes_scan(b"signmessage m/84h/0h/0h/0/0 ascii:hi", QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet).unwrap();
    assert!(signed.is_none());
    assert!(ui.qr_shown.is_empty());
}

#[test]
fn a_32_byte_payload_is_signed_verbatim_with_the_account_key() {
    let wallet = test_wallet();
    let digest = [0x42u8; 32];
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(&digest, QrFormat::Text);
    let mut storage = MemStorage::available();

    let signed = sign_message_flow(&mut ui, &mut scanner, Some(&mut storage), None, &wallet)
        .unwrap()
        .unwrap();

    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&digest, &signed.signature, &account));

    // The digest was shown for confirmation, and both artifacts exported.
    assert!(ui.shown.iter().any(|s| s.contains(&hex::encode(digest))));
    let pubkey_hex = hex::encode(wallet.key().account_pubkey_sec());
    assert!(ui.qr_shown.iter().any(|(data, _)| data == &pubkey_hex));
    assert_eq!(storage.saved.len(), 2);
    assert_eq!(storage.saved[0].0, "message");
    assert_eq!(storage.saved[0].1, signed.signature);
    assert_eq!(storage.saved[1].0, "pubkey");
    assert_eq!(storage.saved[1].1, pubkey_hex.as_bytes());
}

#[test]
fn a_64_byte_hex_payload_is_decoded_before_signing() {
    let wallet = test_wallet();
    let digest = [0x5au8; 32];
    let payload = hex::encode(digest).into_bytes();
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(&payload, QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet)
        .unwrap()
        .unwrap();
    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&digest, &signed.signature, &account));
}

#[test]
fn short_payloads_are_hashed_before_signing() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(b"just a text", QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet)
        .unwrap()
        .unwrap();
    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&sha256(b"just a text"), &signed.signature, &account));
}

#[test]
fn incomplete_signmessage_payloads_fall_through_to_hash_signing() {
    let wallet = test_wallet();
    let payload = b"signmessage m/0/0";
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(payload, QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet)
        .unwrap()
        .unwrap();
    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&sha256(payload), &signed.signature, &account));
}

#[test]
fn malformed_signmessage_paths_are_reported_and_abort() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(b"signmessage m/84h/0h/0h ascii:hi", QrFormat::Text);

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet).unwrap();
    assert!(signed.is_none());
    assert!(ui.flashed.iter().any(|f| f.contains("Invalid message")));
}

#[test]
fn a_failed_scan_falls_back_to_storage() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = MockScanner::failing();
    let mut storage = MemStorage::available().with_file("note.txt", b"hello");

    let signed = sign_message_flow(&mut ui, &mut scanner, Some(&mut storage), None, &wallet)
        .unwrap()
        .unwrap();
    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&sha256(b"hello"), &signed.signature, &account));
}

#[test]
fn no_scan_and_no_storage_is_a_transient_failure() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = MockScanner::failing();

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet).unwrap();
    assert!(signed.is_none());
    assert!(ui.flashed.iter().any(|f| f.contains("Failed to load message")));
}

#[test]
fn declining_hash_signing_produces_no_signature() {
    let wallet = test_wallet();
    let mut ui = MockUi::new().denying("Sign?");
    let mut scanner = bytes_scan(&[0x42u8; 32], QrFormat::Text);
    let mut storage = MemStorage::available();

    let signed =
        sign_message_flow(&mut ui, &mut scanner, Some(&mut storage), None, &wallet).unwrap();
    assert!(signed.is_none());
    assert!(storage.saved.is_empty());
    assert!(ui.qr_shown.is_empty());
}

#[test]
fn printing_is_offered_when_a_printer_is_attached() {
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let mut scanner = bytes_scan(&[0x42u8; 32], QrFormat::Text);
    let mut printer = MockPrinter::working();

    sign_message_flow(&mut ui, &mut scanner, None, Some(&mut printer), &wallet)
        .unwrap()
        .unwrap();
    // Signature and public key were both offered and printed.
    assert_eq!(printer.printed.len(), 2);
}

#[test]
fn words_scans_are_joined_into_a_text_payload() {
    // A structured-tag scan of words reaches the signer as their joined text.
    let wallet = test_wallet();
    let mut ui = MockUi::new();
    let words: Vec<String> = ["not", "a", "signmessage"].iter().map(|w| w.to_string()).collect();
    let mut scanner = MockScanner::with(Scan {
        data: ScanData::Words(words),
        format: QrFormat::Tagged,
    });

    let signed = sign_message_flow(&mut ui, &mut scanner, None, None, &wallet)
        .unwrap()
        .unwrap();
    let account = secp256k1::PublicKey::from_slice(&wallet.key().account_pubkey_sec()).unwrap();
    assert!(verify(&sha256(b"not a signmessage"), &signed.signature, &account));
}
