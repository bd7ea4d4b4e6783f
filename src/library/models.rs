use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A show the user has confirmed against the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedShow {
    pub catalog_id: u64,
    pub title: String,
    /// Catalog's original-language title, when it differs
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Selected alternate ordering, if any
    #[serde(default)]
    pub episode_group_id: Option<String>,
    #[serde(default)]
    pub files: Vec<MediaFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: String,
    pub source_path: PathBuf,
    #[serde(default)]
    pub catalog_id: Option<u64>,
}

impl TrackedShow {
    pub fn new(catalog_id: u64, title: impl Into<String>) -> Self {
        Self {
            catalog_id,
            title: title.into(),
            original_title: None,
            aliases: Vec::new(),
            episode_group_id: None,
            files: Vec::new(),
        }
    }

    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.source_path.clone()).collect()
    }

    pub fn has_file(&self, id: &str) -> bool {
        self.files.iter().any(|f| f.id == id)
    }
}

impl MediaFile {
    pub fn new(id: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            catalog_id: None,
        }
    }

    pub fn with_catalog_id(mut self, catalog_id: u64) -> Self {
        self.catalog_id = Some(catalog_id);
        self
    }

    pub fn source_folder(&self) -> Option<&Path> {
        self.source_path.parent()
    }
}
