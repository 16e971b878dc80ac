use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregator::DEFAULT_TOP_N;
use crate::error::{DashError, Result};
use crate::intake::DEFAULT_SKIP_ROWS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_privacy_mode")]
    pub privacy_mode: bool,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    #[serde(default)]
    pub palette: Palette,
}

fn default_privacy_mode() -> bool {
    true
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_skip_rows() -> usize {
    DEFAULT_SKIP_ROWS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            privacy_mode: default_privacy_mode(),
            top_n: default_top_n(),
            skip_rows: default_skip_rows(),
            palette: Palette::default(),
        }
    }
}

/// Chart colors as `#rrggbb` strings, keyed per series and per type label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub deposit: String,
    pub withdrawal: String,
    pub hourly: String,
    pub types: BTreeMap<String, String>,
}

impl Default for Palette {
    fn default() -> Self {
        let types = [
            ("Deposit", "#0b5394"),
            ("Withdrawal", "#990000"),
            ("Check Card", "#FF6347"),
            ("ATM Deposit", "#3CB371"),
            ("KB Bank", "#66CDAA"),
            ("ATM Withdrawal", "#CD5C5C"),
            ("Open Banking", "#20B2AA"),
            ("Cashback", "#FFD700"),
            ("Interest Deposit", "#48D1CC"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            deposit: "#0b5394".to_string(),
            withdrawal: "#990000".to_string(),
            hourly: "#351c75".to_string(),
            types,
        }
    }
}

/// Parse `#rrggbb` into an RGB triple.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tossdash")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| DashError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("settings.json");
        let settings = Settings {
            privacy_mode: false,
            top_n: 5,
            ..Settings::default()
        };
        save_settings_to(&path, &settings).unwrap();
        assert!(path.exists());
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert!(s.privacy_mode);
        assert_eq!(s.top_n, 15);
        assert_eq!(s.skip_rows, 8);
        assert_eq!(s.palette.hourly, "#351c75");
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r##"{"top_n": 10, "palette": {"deposit": "#000000"}}"##;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.top_n, 10);
        assert!(s.privacy_mode);
        assert_eq!(s.palette.deposit, "#000000");
        assert_eq!(s.palette.withdrawal, "#990000");
        assert_eq!(s.palette.types.get("Cashback").map(String::as_str), Some("#FFD700"));
    }

    #[test]
    fn test_garbage_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#0b5394"), Some((0x0b, 0x53, 0x94)));
        assert_eq!(parse_hex("#FFD700"), Some((255, 215, 0)));
        assert_eq!(parse_hex("0b5394"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }
}
