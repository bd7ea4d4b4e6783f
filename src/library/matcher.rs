//! Reattach files without a confirmed identity to a tracked show.
//!
//! Matching is exact equality on normalized titles. A candidate that merely
//! contains an alias, or is contained by one, does not match.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use super::models::{MediaFile, TrackedShow};
use super::parser::{normalize_title, parse_episode_tuple, strip_episode_tokens};

/// Normalized titles a show is known by
#[derive(Debug, Clone, Default)]
pub struct AliasSet {
    entries: HashSet<String>,
}

impl AliasSet {
    pub fn for_show(show: &TrackedShow) -> Self {
        let entries = std::iter::once(show.title.as_str())
            .chain(show.original_title.as_deref())
            .chain(show.aliases.iter().map(String::as_str))
            .map(normalize_title)
            .filter(|t| !t.is_empty())
            .collect();
        Self { entries }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.entries.contains(candidate)
    }
}

/// Normalized titles a file could be named after: its own name with
/// season/episode tokens stripped, then its parent and grandparent folders.
pub fn candidate_titles(path: &Path) -> Vec<String> {
    let mut titles = Vec::new();

    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if let Some(hint) = parse_episode_tuple(stem).and_then(|p| p.title_hint) {
            titles.push(normalize_title(&hint));
        }
        titles.push(normalize_title(&strip_episode_tokens(stem)));
    }

    let folders = path.ancestors().skip(1).take(2);
    for folder in folders {
        if let Some(name) = folder.file_name().and_then(|n| n.to_str()) {
            titles.push(normalize_title(name));
        }
    }

    titles.retain(|t| !t.is_empty());
    titles.dedup();
    titles
}

/// Ids of `candidates` that belong to `show`
pub fn match_uncategorized_files(show: &TrackedShow, candidates: &[MediaFile]) -> Vec<String> {
    let aliases = AliasSet::for_show(show);
    let confirmed_folders: HashSet<&Path> =
        show.files.iter().filter_map(MediaFile::source_folder).collect();

    candidates
        .iter()
        .filter(|file| {
            if file.catalog_id == Some(show.catalog_id) {
                debug!(file = %file.id, "Matched by catalog id");
                return true;
            }
            if file
                .source_folder()
                .is_some_and(|folder| confirmed_folders.contains(folder))
            {
                debug!(file = %file.id, "Matched by shared source folder");
                return true;
            }
            let matched = candidate_titles(&file.source_path)
                .iter()
                .any(|title| aliases.contains(title));
            if matched {
                debug!(file = %file.id, "Matched by alias");
            }
            matched
        })
        .map(|file| file.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show() -> TrackedShow {
        let mut show = TrackedShow::new(42, "Different Title");
        show.original_title = Some("Chigau Taitoru".to_string());
        show.aliases = vec!["Kimi no Show".to_string()];
        show
    }

    #[test]
    fn test_alias_set_normalizes_every_source() {
        let aliases = AliasSet::for_show(&show());
        assert!(aliases.contains("different title"));
        assert!(aliases.contains("chigau taitoru"));
        assert!(aliases.contains("kimi no show"));
        assert!(!aliases.contains("Kimi no Show"));
    }

    #[test]
    fn test_parent_folder_alias_match() {
        let file = MediaFile::new("a", "/downloads/Kimi.no.Show/Show.Name.S02E01.mkv");
        assert_eq!(match_uncategorized_files(&show(), &[file]), vec!["a"]);
    }

    #[test]
    fn test_grandparent_folder_alias_match() {
        let file = MediaFile::new("a", "/downloads/Kimi no Show/Season 2/S02E01.mkv");
        assert_eq!(match_uncategorized_files(&show(), &[file]), vec!["a"]);
    }

    #[test]
    fn test_file_name_title_match() {
        let file = MediaFile::new("a", "/downloads/misc/Different.Title.S01E03.1080p.mkv");
        assert_eq!(match_uncategorized_files(&show(), &[file]), vec!["a"]);
    }

    #[test]
    fn test_superstring_and_substring_do_not_match() {
        let files = vec![
            MediaFile::new("super", "/downloads/Kimi no Show Extras/Other.S02E01.mkv"),
            MediaFile::new("sub", "/downloads/misc/Kimi.S02E01.mkv"),
        ];
        assert!(match_uncategorized_files(&show(), &files).is_empty());
    }

    #[test]
    fn test_catalog_id_match() {
        let file = MediaFile::new("a", "/downloads/misc/random.mkv").with_catalog_id(42);
        let other = MediaFile::new("b", "/downloads/misc/random2.mkv").with_catalog_id(7);
        assert_eq!(match_uncategorized_files(&show(), &[file, other]), vec!["a"]);
    }

    #[test]
    fn test_shared_folder_match() {
        let mut show = show();
        show.files
            .push(MediaFile::new("known", "/downloads/batch/Ep01.mkv").with_catalog_id(42));
        let file = MediaFile::new("a", "/downloads/batch/Ep02.mkv");
        let elsewhere = MediaFile::new("b", "/downloads/other/Ep02.mkv");
        assert_eq!(match_uncategorized_files(&show, &[file, elsewhere]), vec!["a"]);
    }

    #[test]
    fn test_candidate_titles() {
        let titles = candidate_titles(Path::new("/dl/Show Name/Season 1/Show.Name.S01E01.mkv"));
        assert_eq!(titles, vec!["show name", "season 1", "show name"]);
    }
}
