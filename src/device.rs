//! Collaborator interfaces for the device peripherals the core drives:
//! display/input, optical scanner, removable storage and printer.
//!
//! Every call is blocking and synchronous; the device is single-threaded and
//! cooperative. Cancellation arrives in-band ([`EntryEvent::Cancel`], a
//! `false` confirmation or a `None` selection) and each flow unwinds to its
//! caller without completing the in-progress construction.

use crate::Result;

/// File extension for saved signatures.
pub const SIGNATURE_FILE_EXTENSION: &str = ".sig";
/// File extension for saved public keys.
pub const PUBKEY_FILE_EXTENSION: &str = ".pub";
/// Suffix appended to the base name of signed files.
pub const SIGNED_FILE_SUFFIX: &str = "-signed";

/// Outcome of one keypad capture: a finished buffer (possibly empty), a
/// request to delete the previously accepted item, or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryEvent {
    Entry(String),
    DeleteLast,
    Cancel,
}

/// Optical code format of a scanned or displayed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrFormat {
    /// No optical framing (e.g. a file loaded from storage).
    None,
    /// Plain text payload.
    Text,
    /// Self-describing structured tag container.
    Tagged,
}

/// Payload produced by one optical capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanData {
    /// Raw payload bytes.
    Bytes(Vec<u8>),
    /// Words already extracted by the structured-tag parser.
    Words(Vec<String>),
}

/// One successful optical capture.
#[derive(Debug, Clone)]
pub struct Scan {
    pub data: ScanData,
    pub format: QrFormat,
}

/// Blocking display and input primitives.
pub trait UserInterface {
    /// Run the char-level keypad over the given charsets and return the
    /// committed buffer, a delete request, or cancellation.
    fn capture_entry(&mut self, prompt: &str, charsets: &[&str]) -> EntryEvent;

    /// One-of-N symbol pick (dice rolls): returns as soon as a symbol is
    /// chosen. An empty entry is the go/finish key.
    fn capture_roll(&mut self, prompt: &str, symbols: &[&str]) -> EntryEvent;

    /// Yes/no prompt; `false` means declined.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Pick one of `options`; `None` means the menu was dismissed.
    fn select(&mut self, title: &str, options: &[&str]) -> Option<usize>;

    /// Draw a screen of text and return immediately.
    fn show(&mut self, text: &str);

    /// Transient warning message.
    fn flash(&mut self, text: &str);

    /// Block until the operator presses any button.
    fn wait_for_button(&mut self);

    /// Render data as an optical code.
    fn show_qr(&mut self, data: &str, format: QrFormat, title: &str);
}

/// Camera-side optical capture; `None` signals a failed scan.
pub trait OpticalScanner {
    fn capture(&mut self) -> Option<Scan>;
}

/// Parameters for saving an export artifact to removable storage.
#[derive(Debug, Clone)]
pub struct SaveParams<'a> {
    pub data: &'a [u8],
    pub kind: &'a str,
    pub base_name: &'a str,
    pub extension: &'a str,
    pub suffix: &'a str,
}

/// Removable storage. Absence is a normal, recoverable condition; callers
/// skip the affected step rather than failing the flow.
pub trait Storage {
    fn is_available(&self) -> bool;

    /// Let the operator pick a file with the given extension and load it.
    fn load_file(&mut self, extension: &str) -> Result<(String, Vec<u8>)>;

    fn save_file(&mut self, params: &SaveParams) -> Result<()>;
}

/// Thermal printer peripheral. Attachment and printing are both best-effort.
pub trait Printer {
    fn connect(&mut self) -> Result<()>;

    fn print_qr(&mut self, data: &str, title: &str) -> Result<()>;
}
