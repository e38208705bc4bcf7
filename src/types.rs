use serde::{Deserialize, Serialize};

use crate::primitives::bip32::Network;

/// Log level configuration, selectable from [`ColdkitConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Main configuration for the signing core.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColdkitConfig {
    /// Network the assembled keys belong to.
    pub network: Network,
    /// Log level for the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for ColdkitConfig {
    fn default() -> Self {
        ColdkitConfig {
            network: Network::Bitcoin,
            log_level: None,
        }
    }
}

/// Target mnemonic length for capture and entropy collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordCount {
    Twelve,
    TwentyFour,
}

impl WordCount {
    /// Number of words in a mnemonic of this length.
    pub fn words(&self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    /// Number of entropy bytes backing a mnemonic of this length.
    pub fn entropy_bytes(&self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_sizes() {
        assert_eq!(WordCount::Twelve.words(), 12);
        assert_eq!(WordCount::Twelve.entropy_bytes(), 16);
        assert_eq!(WordCount::TwentyFour.words(), 24);
        assert_eq!(WordCount::TwentyFour.entropy_bytes(), 32);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = ColdkitConfig {
            network: Network::Testnet,
            log_level: Some(LogLevel::Debug),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ColdkitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.network, Network::Testnet);
        assert_eq!(back.log_level, Some(LogLevel::Debug));
    }
}
