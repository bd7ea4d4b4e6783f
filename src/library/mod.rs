pub mod matcher;
pub mod models;
pub mod parser;
pub mod scanner;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

pub use models::{MediaFile, TrackedShow};
pub use scanner::scan_source_dir;

use crate::error::{Error, Result};
use parser::normalize_title;

/// What the resolver needs from persisted state
#[async_trait::async_trait]
pub trait ShowHistory: Send + Sync {
    /// Every source path previously recorded for the show
    async fn source_paths(&self, catalog_id: u64) -> Result<Vec<PathBuf>>;

    /// The alternate ordering the user picked for the show, if any
    async fn selected_episode_group(&self, catalog_id: u64) -> Result<Option<String>>;
}

/// Persisted library state
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub shows: Vec<TrackedShow>,
    /// Files no show has claimed yet
    #[serde(default)]
    pub uncategorized: Vec<MediaFile>,
}

impl Library {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Library::default());
        }

        let content = std::fs::read_to_string(path)?;
        let library: Library = toml::from_str(&content)?;
        Ok(library)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get_show(&self, catalog_id: u64) -> Option<&TrackedShow> {
        self.shows.iter().find(|s| s.catalog_id == catalog_id)
    }

    pub fn get_show_mut(&mut self, catalog_id: u64) -> Option<&mut TrackedShow> {
        self.shows.iter_mut().find(|s| s.catalog_id == catalog_id)
    }

    fn require_show_mut(&mut self, catalog_id: u64) -> Result<&mut TrackedShow> {
        self.get_show_mut(catalog_id)
            .ok_or(Error::ShowNotTracked(catalog_id))
    }

    /// Add or refresh a tracked show, keeping its aliases, files and group
    pub fn track_show(&mut self, catalog_id: u64, title: &str, original_title: Option<&str>) {
        let original_title = original_title
            .filter(|o| normalize_title(o) != normalize_title(title))
            .map(str::to_string);

        match self.get_show_mut(catalog_id) {
            Some(show) => {
                show.title = title.to_string();
                show.original_title = original_title;
            }
            None => {
                let mut show = TrackedShow::new(catalog_id, title);
                show.original_title = original_title;
                self.shows.push(show);
            }
        }
    }

    /// Returns false when an alias with the same normalized form exists
    pub fn add_alias(&mut self, catalog_id: u64, alias: &str) -> Result<bool> {
        let normalized = normalize_title(alias);
        if normalized.is_empty() {
            return Ok(false);
        }

        let show = self.require_show_mut(catalog_id)?;
        if show.aliases.iter().any(|a| normalize_title(a) == normalized) {
            return Ok(false);
        }
        show.aliases.push(alias.trim().to_string());
        Ok(true)
    }

    pub fn select_episode_group(&mut self, catalog_id: u64, group_id: Option<String>) -> Result<()> {
        let show = self.require_show_mut(catalog_id)?;
        show.episode_group_id = group_id;
        Ok(())
    }

    pub fn knows_file(&self, id: &str) -> bool {
        self.uncategorized.iter().any(|f| f.id == id) || self.shows.iter().any(|s| s.has_file(id))
    }

    /// Record scanned files, for a show when `catalog_id` is given, otherwise
    /// as uncategorized. Already-known ids are skipped. Returns how many were added.
    pub fn add_files(&mut self, catalog_id: Option<u64>, files: Vec<MediaFile>) -> Result<usize> {
        let fresh: Vec<MediaFile> = files
            .into_iter()
            .filter(|f| !self.knows_file(&f.id))
            .collect();
        let added = fresh.len();

        match catalog_id {
            Some(id) => {
                let show = self.require_show_mut(id)?;
                show.files
                    .extend(fresh.into_iter().map(|f| f.with_catalog_id(id)));
            }
            None => self.uncategorized.extend(fresh),
        }
        Ok(added)
    }

    /// Ids of uncategorized files that belong to the show
    pub fn match_uncategorized_files(&self, catalog_id: u64) -> Result<Vec<String>> {
        let show = self
            .get_show(catalog_id)
            .ok_or(Error::ShowNotTracked(catalog_id))?;
        Ok(matcher::match_uncategorized_files(show, &self.uncategorized))
    }

    /// Move the given uncategorized files onto the show
    pub fn attach_files(&mut self, catalog_id: u64, file_ids: &[String]) -> Result<usize> {
        if self.get_show(catalog_id).is_none() {
            return Err(Error::ShowNotTracked(catalog_id));
        }

        let (attached, remaining): (Vec<MediaFile>, Vec<MediaFile>) =
            std::mem::take(&mut self.uncategorized)
                .into_iter()
                .partition(|f| file_ids.contains(&f.id));
        self.uncategorized = remaining;

        let count = attached.len();
        let show = self.require_show_mut(catalog_id)?;
        show.files
            .extend(attached.into_iter().map(|f| f.with_catalog_id(catalog_id)));

        info!(show = %show.title, count, "Attached uncategorized files");
        Ok(count)
    }
}

#[async_trait::async_trait]
impl ShowHistory for Library {
    async fn source_paths(&self, catalog_id: u64) -> Result<Vec<PathBuf>> {
        Ok(self
            .get_show(catalog_id)
            .map(TrackedShow::source_paths)
            .unwrap_or_default())
    }

    async fn selected_episode_group(&self, catalog_id: u64) -> Result<Option<String>> {
        Ok(self
            .get_show(catalog_id)
            .and_then(|s| s.episode_group_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Library {
        let mut library = Library::default();
        library.track_show(42, "Show Name", Some("Shou Mei"));
        library
    }

    #[test]
    fn test_track_show_drops_identical_original_title() {
        let mut library = Library::default();
        library.track_show(1, "Monster", Some("MONSTER"));
        assert_eq!(library.get_show(1).unwrap().original_title, None);

        library.track_show(1, "Monster", Some("Monsutā"));
        assert_eq!(library.shows.len(), 1);
        assert_eq!(
            library.get_show(1).unwrap().original_title.as_deref(),
            Some("Monsutā")
        );
    }

    #[test]
    fn test_add_alias_dedupes_normalized() {
        let mut library = library();
        assert!(library.add_alias(42, "Kimi no Show").unwrap());
        assert!(!library.add_alias(42, "kimi.no.show").unwrap());
        assert!(!library.add_alias(42, "  ").unwrap());
        assert_eq!(library.get_show(42).unwrap().aliases, vec!["Kimi no Show"]);
        assert!(matches!(
            library.add_alias(7, "x"),
            Err(Error::ShowNotTracked(7))
        ));
    }

    #[test]
    fn test_add_files_skips_known_ids() {
        let mut library = library();
        let files = vec![
            MediaFile::new("a", "/dl/Show/S01E01.mkv"),
            MediaFile::new("b", "/dl/Show/S01E02.mkv"),
        ];
        assert_eq!(library.add_files(Some(42), files.clone()).unwrap(), 2);
        assert_eq!(library.add_files(None, files).unwrap(), 0);
        assert!(library.uncategorized.is_empty());
        assert!(library
            .get_show(42)
            .unwrap()
            .files
            .iter()
            .all(|f| f.catalog_id == Some(42)));
    }

    #[test]
    fn test_match_and_attach() {
        let mut library = library();
        library.add_alias(42, "Kimi no Show").unwrap();
        library
            .add_files(
                None,
                vec![
                    MediaFile::new("hit", "/dl/Kimi no Show/Show.Name.S02E01.mkv"),
                    MediaFile::new("miss", "/dl/Other Show/Other.S01E01.mkv"),
                ],
            )
            .unwrap();

        let ids = library.match_uncategorized_files(42).unwrap();
        assert_eq!(ids, vec!["hit"]);

        assert_eq!(library.attach_files(42, &ids).unwrap(), 1);
        assert_eq!(library.uncategorized.len(), 1);
        assert_eq!(library.get_show(42).unwrap().files[0].id, "hit");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.toml");

        let mut library = library();
        library
            .select_episode_group(42, Some("5eb730dd".to_string()))
            .unwrap();
        library
            .add_files(Some(42), vec![MediaFile::new("a", "/dl/Show/S01E01.mkv")])
            .unwrap();
        library.save_to(&path).unwrap();

        let loaded = Library::load_from(&path).unwrap();
        let show = loaded.get_show(42).unwrap();
        assert_eq!(show.episode_group_id.as_deref(), Some("5eb730dd"));
        assert_eq!(show.files.len(), 1);
    }

    #[test]
    fn test_load_missing_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::load_from(&dir.path().join("none.toml")).unwrap();
        assert!(library.shows.is_empty());
    }

    #[tokio::test]
    async fn test_history_reads() {
        let mut library = library();
        library
            .add_files(Some(42), vec![MediaFile::new("a", "/dl/Show/S01E01.mkv")])
            .unwrap();
        library
            .select_episode_group(42, Some("group".to_string()))
            .unwrap();

        assert_eq!(
            library.source_paths(42).await.unwrap(),
            vec![PathBuf::from("/dl/Show/S01E01.mkv")]
        );
        assert_eq!(
            library.selected_episode_group(42).await.unwrap().as_deref(),
            Some("group")
        );
        assert!(library.source_paths(7).await.unwrap().is_empty());
        assert_eq!(library.selected_episode_group(7).await.unwrap(), None);
    }
}
