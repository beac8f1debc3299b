//! Configuration file support
//!
//! The embed attributes a hosting page would set on the container element
//! become a toml file for the terminal host. Everything is read once at
//! startup and not revisited.

use palaver_engine::ChatLabels;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for the palaver terminal host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root, e.g. `https://example.com/api/v1`
    pub api_root: Option<String>,
    /// Per-deployment chatbot identifier
    pub chatbot_id: Option<String>,
    /// Per-session nonce; omit for unauthenticated requests
    pub session_nonce: Option<String>,
    /// Streaming-type flag (`direct` or `push`)
    pub streaming_type: Option<String>,
    /// Push-hub endpoint for trigger/listen delivery
    pub hub_host: Option<String>,
    /// Alternate execution host for streaming turns
    pub node_host: Option<String>,
    /// Whether history browsing is enabled (defaults to true)
    pub history: Option<bool>,
    /// Display strings
    pub labels: ChatLabels,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("palaver")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for PALAVER_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("PALAVER_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let dir = path.parent().unwrap();
        fs::create_dir_all(dir)?;
        fs::write(&path, example_config())?;
        Ok(path)
    }

    /// Whether history browsing is enabled
    pub fn history_enabled(&self) -> bool {
        self.history.unwrap_or(true)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# palaver configuration file
# Place at ~/.config/palaver/config.toml (Linux/Mac)
# or %APPDATA%\palaver\config.toml (Windows)

# API root of the chat backend (required)
# api_root = "https://example.com/api/v1"

# Per-deployment chatbot identifier (required)
# chatbot_id = "my-bot"

# Per-session nonce; omit for unauthenticated requests
# session_nonce = ""

# Reply delivery: "direct" streams the response body, "push" listens on
# the hub configured below
# streaming_type = "direct"

# Push-hub endpoint, required for push delivery
# hub_host = "https://example.com/.well-known/hub"

# Alternate execution host for streaming turns (optional)
# node_host = ""

# Whether --history and --show are available
history = true

[labels]
# welcome_message = "Hello! What can I help you with?"
# input_placeholder = "Type a message..."
# loading_message = "Generating a reply..."
# error_message = "Sorry, I can't reach the server right now. Please try again later."
# send_button = "Send"
"#
}
