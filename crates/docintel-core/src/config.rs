//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Paths read from settings go through `expand_path`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::ChunkStrategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub strategy: ChunkStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 800, chunk_overlap: 100, strategy: ChunkStrategy::Recursive }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub use_reranking: bool,
    pub diversity_enabled: bool,
    pub semantic_weight: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 5, use_reranking: true, diversity_enabled: false, semantic_weight: 0.7 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub include_citations: bool,
    pub preview_chars: usize,
    pub fallback_context_chunks: usize,
    /// Optional TOML file overriding the built-in prompt templates.
    pub prompts_file: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { include_citations: true, preview_chars: 200, fallback_context_chunks: 3, prompts_file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_txt_dir: String,
    pub clean_text: bool,
    /// Where the keyword index lives; in memory when unset.
    pub keyword_index_dir: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { raw_txt_dir: "../dev_data/txt".to_string(), clean_text: true, keyword_index_dir: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let s = self.settings()?;
        if s.chunking.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if s.chunking.chunk_overlap >= s.chunking.chunk_size {
            return Err(Error::InvalidConfig("chunking.chunk_overlap must be smaller than chunk_size".into()));
        }
        if !(0.0..=1.0).contains(&s.retrieval.semantic_weight) {
            return Err(Error::InvalidConfig("retrieval.semantic_weight must lie in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Expand `~` and `$VAR`/`${VAR}` in a configured path. An unset variable
/// leaves the input untouched.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let raw = input.as_ref();
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}
