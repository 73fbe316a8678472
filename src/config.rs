//! Arena configuration: JSON file, environment overrides, built-in key

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::llm::{
    GeminiClient, GeminiClientConfig, LlmClient, OpenRouterClient, OpenRouterClientConfig,
};
use crate::paths::{get_config_path, get_db_path};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    OpenRouter,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArenaConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub strict_daily_battle: bool,
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            gemini_api_key: None,
            openrouter_api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            database_path: None,
            strict_daily_battle: false,
        }
    }
}

// ============ Built-in API Key Support ============

/// XOR key for deobfuscation (must match build.rs)
const XOR_KEY: [u8; 16] = [
    0x4f, 0x72, 0x61, 0x6e, 0x67, 0x65, 0x50, 0x69, 0x6e, 0x65, 0x61, 0x70, 0x70, 0x6c, 0x65, 0x21,
];

const OBFUSCATED_GEMINI_KEY: &str = env!("OBFUSCATED_GEMINI_KEY");
const HAS_BUILTIN_KEY: &str = env!("HAS_BUILTIN_KEY");

fn deobfuscate_api_key(hex_encoded: &str) -> Option<String> {
    if hex_encoded.is_empty() || hex_encoded.len() % 2 != 0 {
        return None;
    }

    let obfuscated: Vec<u8> = (0..hex_encoded.len())
        .step_by(2)
        .filter_map(|i| u8::from_str_radix(&hex_encoded[i..i + 2], 16).ok())
        .collect();

    let plain: Vec<u8> = obfuscated
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect();

    String::from_utf8(plain).ok().filter(|key| !key.is_empty())
}

fn builtin_gemini_key() -> Option<String> {
    if HAS_BUILTIN_KEY == "1" {
        deobfuscate_api_key(OBFUSCATED_GEMINI_KEY)
    } else {
        None
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ArenaConfig {
    /// Reads the config file (defaults when it does not exist), then applies env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read config: {}", e))?;
            serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?
        } else {
            info!("[config] no config at {:?}, using defaults", path);
            ArenaConfig::default()
        };

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(key) = non_empty_env("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = non_empty_env("OPENROUTER_API_KEY") {
            self.openrouter_api_key = Some(key);
        }
        if let Some(model) = non_empty_env("DAILY_ARENA_MODEL") {
            self.model = model;
        }
        if let Some(db) = non_empty_env("DAILY_ARENA_DB") {
            self.database_path = Some(PathBuf::from(db));
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory: {}", e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to save config: {}", e))
    }

    pub fn database_path(&self) -> Result<PathBuf, String> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => get_db_path(),
        }
    }

    fn gemini_key(&self) -> Option<String> {
        self.gemini_api_key.clone().or_else(builtin_gemini_key)
    }

    pub fn build_llm_client(&self) -> Result<Arc<dyn LlmClient>, String> {
        match self.provider {
            Provider::Gemini => {
                let api_key = self
                    .gemini_key()
                    .ok_or_else(|| "Gemini API key not configured".to_string())?;
                let client = GeminiClient::new(GeminiClientConfig {
                    api_key,
                    model: self.model.clone(),
                    timeout_secs: self.timeout_secs,
                    ..Default::default()
                })
                .map_err(|e| e.to_string())?;
                Ok(Arc::new(client))
            }
            Provider::OpenRouter => {
                let api_key = self
                    .openrouter_api_key
                    .clone()
                    .ok_or_else(|| "OpenRouter API key not configured".to_string())?;
                let client = OpenRouterClient::new(OpenRouterClientConfig {
                    api_key,
                    model: self.model.clone(),
                    max_tokens: self.max_tokens,
                    timeout_secs: self.timeout_secs,
                })
                .map_err(|e| e.to_string())?;
                Ok(Arc::new(client))
            }
        }
    }
}
