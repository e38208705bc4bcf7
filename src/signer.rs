//! The message signing engine.
//!
//! A scanned or file-loaded payload is signed under one of two mutually
//! exclusive protocols: the address-bound legacy signed-message scheme
//! (payloads starting with `signmessage`, as emitted by desktop wallets),
//! or generic hash signing with the account key. Export of the results is
//! best-effort and never invalidates a produced signature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{info, warn};
use std::str::FromStr;
use zeroize::Zeroize;

use crate::device::{
    OpticalScanner, Printer, QrFormat, SaveParams, ScanData, Storage, UserInterface,
    PUBKEY_FILE_EXTENSION, SIGNATURE_FILE_EXTENSION, SIGNED_FILE_SUFFIX,
};
use crate::key::Wallet;
use crate::primitives::bip32::DerivationPath;
use crate::primitives::encode::write_varint;
use crate::primitives::hash::{sha256, sha256d};
use crate::{ColdkitError, Result};

const SIGN_MESSAGE_PREFIX: &[u8] = b"signmessage";
const ASCII_TAG: &[u8] = b"ascii";
const MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// A raw signing payload plus the optical format it arrived in.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub data: Vec<u8>,
    pub format: QrFormat,
}

/// A parsed address-bound request: sign `message` with the child key at
/// `path`, confirming against the receive address at `address_index`.
#[derive(Debug)]
pub struct AddressBoundRequest {
    pub path: DerivationPath,
    pub address_index: u32,
    pub message: Vec<u8>,
}

/// A produced signature and its base64 text encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signature: Vec<u8>,
    pub encoded: String,
}

/// Try to parse a payload as an address-bound signed-message request.
///
/// `Ok(None)` means the payload does not speak this protocol and generic
/// hash signing applies instead; `Err` means it does but is malformed
/// (surfaced to the operator as a transient message).
pub fn parse_address_bound(data: &[u8]) -> Result<Option<AddressBoundRequest>> {
    if !data.starts_with(SIGN_MESSAGE_PREFIX) {
        return Ok(None);
    }
    let blocks: Vec<&[u8]> = data.split(|&b| b == b' ').collect();
    if blocks.len() < 3 {
        return Ok(None);
    }

    let rest = blocks[2..].join(&b' ');
    let segments: Vec<&[u8]> = rest.split(|&b| b == b':').collect();
    if segments.len() < 2 || segments[0] != ASCII_TAG {
        return Ok(None);
    }
    // Colon segments re-joined with a single space; spacing around colons is
    // not round-trip-preserved. Kept bit-compatible with the wallets that
    // emit these payloads.
    let message = segments[1..].join(&b' ');

    let derivation = std::str::from_utf8(blocks[1])
        .map_err(|_| ColdkitError::InvalidInput("Derivation path is not UTF-8".to_string()))?;
    let path = DerivationPath::from_str(derivation)?;
    let &address_index = path.path().get(4).ok_or_else(|| {
        ColdkitError::InvalidInput(format!("Derivation path too short: {}", derivation))
    })?;
    if DerivationPath::is_hardened(address_index) {
        return Err(ColdkitError::InvalidInput(format!(
            "Hardened address index: {}",
            derivation
        )));
    }

    Ok(Some(AddressBoundRequest {
        path,
        address_index,
        message,
    }))
}

/// The legacy signed-message digest:
/// `SHA256d(0x18 || "Bitcoin Signed Message:\n" || varint(len) || message)`.
pub fn signed_message_digest(message: &[u8]) -> Result<[u8; 32]> {
    let mut preimage = Vec::with_capacity(MESSAGE_MAGIC.len() + 9 + message.len());
    preimage.extend_from_slice(MESSAGE_MAGIC);
    write_varint(&mut preimage, message.len() as u64)?;
    preimage.extend_from_slice(message);
    let digest = sha256d(&preimage);
    preimage.zeroize();
    Ok(digest)
}

/// Classify a generic payload into the 32-byte digest to sign: 32 bytes is
/// a digest already, 64 bytes may be one hex-encoded, anything else (or a
/// failed hex decode) is hashed.
pub fn classify_payload(data: &[u8]) -> [u8; 32] {
    if data.len() == 32 {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(data);
        return digest;
    }
    if data.len() == 64 {
        if let Ok(decoded) = hex::decode(data) {
            let mut digest = [0u8; 32];
            digest.copy_from_slice(&decoded);
            return digest;
        }
    }
    sha256(data)
}

/// Interactive signing flow. Acquires a payload from the scanner or from
/// removable storage, applies the matching protocol, and hands the result to
/// the export collaborators. Returns `Ok(None)` when cancelled or when no
/// payload could be loaded.
pub fn sign_message_flow(
    ui: &mut dyn UserInterface,
    scanner: &mut dyn OpticalScanner,
    mut storage: Option<&mut dyn Storage>,
    mut printer: Option<&mut dyn Printer>,
    wallet: &Wallet,
) -> Result<Option<SignedMessage>> {
    let Some((request, base_name)) = acquire_payload(ui, scanner, storage.as_deref_mut()) else {
        ui.flash("Failed to load message");
        return Ok(None);
    };
    let SignRequest { mut data, format } = request;

    match parse_address_bound(&data) {
        Ok(Some(mut bound)) => {
            data.zeroize();
            let signed = sign_at_address(ui, printer.as_deref_mut(), wallet, &bound, format)?;
            bound.message.zeroize();
            return Ok(signed);
        }
        Ok(None) => {}
        Err(e) => {
            info!("malformed signmessage payload: {}", e);
            data.zeroize();
            ui.flash("Invalid message");
            return Ok(None);
        }
    }

    // Generic hash signing with the account key.
    let mut digest = classify_payload(&data);
    data.zeroize();
    drop(data);

    ui.show(&format!("SHA256:\n{}", hex::encode(digest)));
    if !ui.confirm("Sign?") {
        digest.zeroize();
        return Ok(None);
    }

    let signature = wallet.key().sign(&digest)?;
    digest.zeroize();
    let encoded = BASE64.encode(&signature);

    ui.show(&format!("Signature:\n\n{}", encoded));
    ui.wait_for_button();
    ui.show_qr(&encoded, format, "Signed Message");
    print_best_effort(ui, printer.as_deref_mut(), &encoded, "Signed Message");

    let pubkey_hex = hex::encode(wallet.key().account_pubkey_sec());
    ui.show(&format!("Hex Public Key:\n\n{}", pubkey_hex));
    ui.wait_for_button();
    ui.show_qr(&pubkey_hex, format, "Hex Public Key");
    print_best_effort(ui, printer, &pubkey_hex, "Hex Public Key");

    if let Some(storage) = storage {
        save_exports(storage, &signature, &pubkey_hex, &base_name);
    }

    Ok(Some(SignedMessage { signature, encoded }))
}

/// Protocol A: confirm the message and its derived address, then sign the
/// legacy digest with the child key at the request's path.
fn sign_at_address(
    ui: &mut dyn UserInterface,
    printer: Option<&mut (dyn Printer + '_)>,
    wallet: &Wallet,
    request: &AddressBoundRequest,
    format: QrFormat,
) -> Result<Option<SignedMessage>> {
    let address = wallet.receive_address(request.address_index)?;
    ui.show(&format!(
        "Message:\n{}\n\nAddress:\n{}. {}",
        String::from_utf8_lossy(&request.message),
        request.address_index,
        address
    ));
    if !ui.confirm("Sign?") {
        return Ok(None);
    }

    let mut digest = signed_message_digest(&request.message)?;
    let signature = wallet.key().sign_at(&request.path, &digest)?;
    digest.zeroize();
    let encoded = BASE64.encode(&signature);

    ui.show(&format!("Signature:\n\n{}", encoded));
    ui.wait_for_button();
    ui.show_qr(&encoded, format, "Signed Message");
    print_best_effort(ui, printer, &encoded, "Signed Message");

    Ok(Some(SignedMessage { signature, encoded }))
}

/// Source a payload: camera first, then removable storage.
fn acquire_payload(
    ui: &mut dyn UserInterface,
    scanner: &mut dyn OpticalScanner,
    storage: Option<&mut (dyn Storage + '_)>,
) -> Option<(SignRequest, String)> {
    if let Some(scan) = scanner.capture() {
        let data = match scan.data {
            ScanData::Bytes(bytes) => bytes,
            ScanData::Words(words) => words.join(" ").into_bytes(),
        };
        return Some((
            SignRequest {
                data,
                format: scan.format,
            },
            String::new(),
        ));
    }

    let storage = storage?;
    if !storage.is_available() || !ui.confirm("Load from SD card?") {
        return None;
    }
    match storage.load_file("") {
        Ok((name, data)) => Some((
            SignRequest {
                data,
                format: QrFormat::None,
            },
            name,
        )),
        Err(e) => {
            warn!("could not load message file: {}", e);
            None
        }
    }
}

fn print_best_effort(
    ui: &mut dyn UserInterface,
    printer: Option<&mut (dyn Printer + '_)>,
    data: &str,
    title: &str,
) {
    if let Some(printer) = printer {
        if ui.confirm("Print as QR?") {
            if let Err(e) = printer.print_qr(data, title) {
                warn!("print failed: {}", e);
            }
        }
    }
}

/// Best-effort SD export of the signature and public key.
fn save_exports(storage: &mut dyn Storage, signature: &[u8], pubkey_hex: &str, base_name: &str) {
    if !storage.is_available() {
        return;
    }
    let saved = storage.save_file(&SaveParams {
        data: signature,
        kind: "message",
        base_name,
        extension: SIGNATURE_FILE_EXTENSION,
        suffix: SIGNED_FILE_SUFFIX,
    });
    if let Err(e) = saved {
        warn!("could not save signature: {}", e);
    }

    let saved = storage.save_file(&SaveParams {
        data: pubkey_hex.as_bytes(),
        kind: "pubkey",
        base_name: "",
        extension: PUBKEY_FILE_EXTENSION,
        suffix: "",
    });
    if let Err(e) = saved {
        warn!("could not save public key: {}", e);
    }
}
