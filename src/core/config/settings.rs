use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;

/// Typed application settings, read from `config.yml` when present and
/// falling back to defaults field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub retrieval: RetrievalSettings,
    pub fetcher: FetcherSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, must stay below `chunk_size`.
    pub chunk_overlap: usize,
    /// How many chunks a query returns.
    pub top_k: usize,
    pub embedding: EmbeddingSettings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            embedding: EmbeddingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Which backend produces vectors: "trigram" (offline) or "ollama".
    pub backend: String,
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: "trigram".to_string(),
            model: "nomic-embed-text".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimensions: 384,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub language: String,
    pub top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            top_k: 3,
        }
    }
}

impl Settings {
    /// Load settings from the resolved config path. Missing or malformed
    /// files fall back to defaults with a warning rather than failing
    /// startup.
    pub fn load(paths: &AppPaths) -> Self {
        let path = config_path(paths);
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!(
                        "Invalid config at {}: {}; using defaults",
                        path.display(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "Failed to read config at {}: {}; using defaults",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("WIKI_ASSISTANT_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let user_config = paths.user_data_dir.join("config.yml");
    if user_config.exists() {
        return user_config;
    }

    paths.project_root.join("config.yml")
}
