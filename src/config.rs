//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub aspect_fill: bool,
    #[serde(default = "default_rate")]
    pub playback_rate: f32,
    #[serde(default = "default_skip")]
    pub skip_seconds: f64,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    // Subtitle search (free-text query against a JSON endpoint)
    #[serde(default)]
    pub subtitle_search_url: String,
    #[serde(default = "default_languages")]
    pub subtitle_languages: Vec<String>,
    // Recently opened media, most recent first
    #[serde(default)]
    pub recent_files: Vec<String>,
}

fn default_volume() -> f32 { 1.0 }
fn default_rate() -> f32 { 1.0 }
fn default_skip() -> f64 { 15.0 }
fn default_true() -> bool { true }
fn default_font_size() -> u32 { 12 }
fn default_languages() -> Vec<String> { vec!["en".to_string()] }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            aspect_fill: false,
            playback_rate: 1.0,
            skip_seconds: 15.0,
            dark_mode: true,
            font_size: 12,
            subtitle_search_url: String::new(),
            subtitle_languages: vec!["en".to_string()],
            recent_files: Vec::new(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("vireo");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    /// Load the saved config; missing or corrupt files fall back to defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(error = %e, "config file is corrupt, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!(error = %e, "failed to save config");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize config"),
        }
    }

    /// Record a newly opened file: moved to the front, deduped, capped.
    pub fn add_recent(&mut self, url: &str) {
        self.recent_files.retain(|existing| existing != url);
        self.recent_files.insert(0, url.to_string());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}
