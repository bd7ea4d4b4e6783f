use std::fs;
use std::path::Path;

use tracing::debug;

use super::models::MediaFile;
use super::parser::{is_video_file, make_file_id};
use crate::error::Result;

/// Recursively collect video files under `root`
pub fn scan_source_dir(root: &Path) -> Result<Vec<MediaFile>> {
    let mut files = Vec::new();

    if !root.exists() {
        debug!(path = %root.display(), "Source directory does not exist, skipping");
        return Ok(files);
    }

    collect_files(root, &mut files)?;
    files.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    debug!(path = %root.display(), count = files.len(), "Scanned source directory");
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<MediaFile>) -> Result<()> {
    for entry in fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if is_video_file(&filename) {
            files.push(MediaFile::new(make_file_id(&path), path));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_collects_nested_videos() {
        let dir = tempfile::tempdir().unwrap();
        let season = dir.path().join("Show").join("Season 01");
        fs::create_dir_all(&season).unwrap();
        fs::write(season.join("Show.S01E01.mkv"), b"").unwrap();
        fs::write(season.join("Show.S01E02.mp4"), b"").unwrap();
        fs::write(season.join("Show.S01E01.srt"), b"").unwrap();

        let files = scan_source_dir(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].source_path.ends_with("Show.S01E01.mkv"));
        assert!(files.iter().all(|f| f.catalog_id.is_none()));
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = scan_source_dir(&dir.path().join("missing")).unwrap();
        assert!(files.is_empty());
    }
}
