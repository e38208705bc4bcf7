//! Scripted mock peripherals for driving the interactive flows in tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use coldkit::device::{
    EntryEvent, OpticalScanner, Printer, QrFormat, SaveParams, Scan, Storage, UserInterface,
};
use coldkit::{ColdkitError, Result};

/// A display/input collaborator that replays a script. Keypad events are
/// consumed from `entries`; an exhausted queue answers `Cancel` so a broken
/// flow terminates instead of spinning. Confirmation prompts answer `true`
/// unless a substring of the prompt is listed in `deny`.
#[derive(Default)]
pub struct MockUi {
    pub entries: VecDeque<EntryEvent>,
    pub deny: Vec<String>,
    pub selections: VecDeque<Option<usize>>,
    pub confirm_prompts: Vec<String>,
    pub shown: Vec<String>,
    pub flashed: Vec<String>,
    pub qr_shown: Vec<(String, String)>,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue plain word entries.
    pub fn with_entries(mut self, entries: &[&str]) -> Self {
        for entry in entries {
            self.entries.push_back(EntryEvent::Entry(entry.to_string()));
        }
        self
    }

    pub fn with_event(mut self, event: EntryEvent) -> Self {
        self.entries.push_back(event);
        self
    }

    /// Answer `false` to every confirmation prompt containing `prompt`.
    pub fn denying(mut self, prompt: &str) -> Self {
        self.deny.push(prompt.to_string());
        self
    }

    pub fn selecting(mut self, choice: Option<usize>) -> Self {
        self.selections.push_back(choice);
        self
    }
}

impl UserInterface for MockUi {
    fn capture_entry(&mut self, _prompt: &str, _charsets: &[&str]) -> EntryEvent {
        self.entries.pop_front().unwrap_or(EntryEvent::Cancel)
    }

    fn capture_roll(&mut self, _prompt: &str, _symbols: &[&str]) -> EntryEvent {
        self.entries.pop_front().unwrap_or(EntryEvent::Cancel)
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.confirm_prompts.push(prompt.to_string());
        !self.deny.iter().any(|denied| prompt.contains(denied))
    }

    fn select(&mut self, _title: &str, _options: &[&str]) -> Option<usize> {
        self.selections.pop_front().unwrap_or(Some(0))
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn flash(&mut self, text: &str) {
        self.flashed.push(text.to_string());
    }

    fn wait_for_button(&mut self) {}

    fn show_qr(&mut self, data: &str, _format: QrFormat, title: &str) {
        self.qr_shown.push((data.to_string(), title.to_string()));
    }
}

/// An optical scanner that yields at most one scripted scan.
pub struct MockScanner {
    pub scan: Option<Scan>,
}

impl MockScanner {
    pub fn with(scan: Scan) -> Self {
        MockScanner { scan: Some(scan) }
    }

    pub fn failing() -> Self {
        MockScanner { scan: None }
    }
}

impl OpticalScanner for MockScanner {
    fn capture(&mut self) -> Option<Scan> {
        self.scan.take()
    }
}

/// In-memory removable storage.
#[derive(Default)]
pub struct MemStorage {
    pub available: bool,
    pub files: VecDeque<(String, Vec<u8>)>,
    pub saved: Vec<(String, Vec<u8>)>,
}

impl MemStorage {
    pub fn available() -> Self {
        MemStorage {
            available: true,
            ..Default::default()
        }
    }

    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.files.push_back((name.to_string(), data.to_vec()));
        self
    }
}

impl Storage for MemStorage {
    fn is_available(&self) -> bool {
        self.available
    }

    fn load_file(&mut self, _extension: &str) -> Result<(String, Vec<u8>)> {
        self.files
            .pop_front()
            .ok_or_else(|| ColdkitError::Storage("No file selected".to_string()))
    }

    fn save_file(&mut self, params: &SaveParams) -> Result<()> {
        self.saved
            .push((params.kind.to_string(), params.data.to_vec()));
        Ok(())
    }
}

/// A printer whose attachment can be made to fail.
pub struct MockPrinter {
    pub connect_ok: bool,
    pub connect_attempts: usize,
    pub printed: Vec<(String, String)>,
}

impl MockPrinter {
    pub fn working() -> Self {
        MockPrinter {
            connect_ok: true,
            connect_attempts: 0,
            printed: Vec::new(),
        }
    }

    pub fn broken() -> Self {
        MockPrinter {
            connect_ok: false,
            connect_attempts: 0,
            printed: Vec::new(),
        }
    }
}

impl Printer for MockPrinter {
    fn connect(&mut self) -> Result<()> {
        self.connect_attempts += 1;
        if self.connect_ok {
            Ok(())
        } else {
            Err(ColdkitError::Printer("No printer attached".to_string()))
        }
    }

    fn print_qr(&mut self, data: &str, title: &str) -> Result<()> {
        self.printed.push((data.to_string(), title.to_string()));
        Ok(())
    }
}
