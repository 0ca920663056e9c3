//! Configuration record mirroring the CLI surface of spec §6. Binding
//! actual command-line flags or TOML/env sources to this struct is left
//! to the embedding application; the core only consumes the struct.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Text encoder error policy (spec §7 `ENCODING_ERROR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingErrors {
    Strict,
    Replace,
    Ignore,
}

impl Default for EncodingErrors {
    fn default() -> Self {
        EncodingErrors::Strict
    }
}

/// Selects whether in-band data is treated as raw bytes or decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Encoding {
    Named(String),
    Raw(bool),
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Named("ascii".to_string())
    }
}

/// The configuration record a connection is built from (spec §6 "CLI
/// surface (core-visible)"). Every field here has a direct effect on
/// core behavior; none of it is used to drive CLI parsing, which stays
/// out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub encoding: Encoding,
    pub encoding_errors: EncodingErrors,
    pub force_binary: bool,
    pub connect_minwait: f64,
    pub connect_maxwait: f64,
    /// Reader buffer size limit `L` (spec §3 "Reader buffer").
    pub limit: usize,
    pub term: String,
    pub cols: u16,
    pub rows: u16,
    pub tspeed: (u32, u32),
    pub xdisploc: String,
    pub lang: String,
    pub send_environ: Vec<String>,
    pub always_do: HashSet<String>,
    pub always_will: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::new(),
            port: 23,
            encoding: Encoding::default(),
            encoding_errors: EncodingErrors::default(),
            force_binary: false,
            connect_minwait: 0.25,
            connect_maxwait: 4.0,
            limit: crate::constants::DEFAULT_READER_LIMIT,
            term: "unknown".to_string(),
            cols: 80,
            rows: 24,
            tspeed: (38400, 38400),
            xdisploc: String::new(),
            lang: "en-US".to_string(),
            send_environ: vec!["LANG".to_string(), "TERM".to_string()],
            always_do: HashSet::new(),
            always_will: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_rfc854_telnet_port() {
        assert_eq!(Config::default().port, 23);
    }

    #[test]
    fn encoding_defaults_to_named_ascii() {
        assert_eq!(Config::default().encoding, Encoding::Named("ascii".to_string()));
    }
}
