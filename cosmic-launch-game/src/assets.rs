//! Ready-made [`AssetLoader`](crate::AssetLoader) implementations.
use std::convert::Infallible;

use thiserror::Error;

use crate::AssetLoader;
use crate::catalog::{Catalog, CatalogError};
use crate::config::{ConfigError, GameConfig};

/// Stock catalog and default configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAssets;

impl AssetLoader for StaticAssets {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::standard())
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(GameConfig::default())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AssetError {
    #[error("catalog asset rejected: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config asset rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Loader over caller-supplied JSON documents. Missing documents fall back
/// to the stock assets.
#[derive(Debug, Clone, Default)]
pub struct JsonAssets {
    catalog: Option<String>,
    config: Option<String>,
}

impl JsonAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(mut self, json: impl Into<String>) -> Self {
        self.catalog = Some(json.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, json: impl Into<String>) -> Self {
        self.config = Some(json.into());
        self
    }
}

impl AssetLoader for JsonAssets {
    type Error = AssetError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        match &self.catalog {
            Some(json) => Ok(Catalog::from_json(json)?),
            None => Ok(Catalog::standard()),
        }
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        match &self.config {
            Some(json) => Ok(GameConfig::from_json(json)?),
            None => Ok(GameConfig::default()),
        }
    }
}
