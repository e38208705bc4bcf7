use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColdkitError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid mnemonic: {0}")]
    Mnemonic(String),

    #[error("Not enough rolls: have {have}, need {need}")]
    InsufficientRolls { have: usize, need: usize },

    #[error("Derivation failed: {0}")]
    Derivation(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Printer error: {0}")]
    Printer(String),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Elliptic curve error: {0}")]
    Secp(#[from] secp256k1::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ColdkitError>;
