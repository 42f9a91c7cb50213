use anyhow::{Context, bail};
use serde::Deserialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::domain::genre::{GenreCategory, GenreMapping};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub dataset: DatasetConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub embed: EmbedConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    /// Replaces the built-in genre table when present
    #[serde(default)]
    pub genres: Option<Vec<GenreCategory>>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.to_string_lossy()))?;
        Ok(config)
    }

    /// Category names of a genre override must be non-empty and unique.
    ///
    /// An empty name would be indistinguishable from an uncategorized genre.
    pub fn validate(&self) -> anyhow::Result<()> {
        let Some(categories) = &self.genres else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for category in categories {
            if category.name.trim().is_empty() {
                bail!("genre category with empty name");
            }
            if !seen.insert(category.name.as_str()) {
                bail!("genre category '{}' is defined twice", category.name);
            }
        }
        Ok(())
    }

    pub fn genre_mapping(&self) -> GenreMapping {
        match &self.genres {
            Some(categories) => GenreMapping::from_categories(categories.clone()),
            None => GenreMapping::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

/// Where the tracks CSV lives and how to get it there
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub source: DatasetSource,
    /// Download again on every start even if the file exists
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetSource {
    /// File is expected to already be at `path`
    #[default]
    Local,
    GoogleDrive {
        file_id: String,
    },
    Url {
        url: String,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EmbedConfig {
    pub base_url: String,
    pub width: u32,
    pub height: u32,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.spotify.com/embed/track".to_string(),
            width: 700,
            height: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
        }
    }
}
