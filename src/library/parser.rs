use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// A file's apparent (season, episode, episode2?) position, before any remap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceEpisodeTuple {
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub episode_number2: Option<u32>,
}

impl SourceEpisodeTuple {
    /// Drops a second episode that does not come after the first.
    pub fn new(season_number: u32, episode_number: u32, episode_number2: Option<u32>) -> Self {
        Self {
            season_number,
            episode_number,
            episode_number2: episode_number2.filter(|&second| second > episode_number),
        }
    }

    pub fn max_episode(&self) -> u32 {
        self.episode_number2.unwrap_or(self.episode_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEpisode {
    pub title_hint: Option<String>,
    pub tuple: SourceEpisodeTuple,
}

// Each pattern names `title`, `season`, `episode` and optionally `episode2`.
// Order matters: ranges before singles so the single form never eats a range.
static EPISODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // S01E05E06, S01E05-E06
        Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[^a-z0-9])S(?P<season>\d{1,3})[ ._]?E(?P<episode>\d{1,4})[ ._]?-?[ ._]?E(?P<episode2>\d{1,4})(?:$|[^a-z0-9])",
        )
        .unwrap(),
        // S01E05-06
        Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[^a-z0-9])S(?P<season>\d{1,3})[ ._]?E(?P<episode>\d{1,4})-(?P<episode2>\d{1,4})(?:$|[^a-z0-9])",
        )
        .unwrap(),
        // S01E05, S01.E05
        Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[^a-z0-9])S(?P<season>\d{1,3})[ ._]?E(?P<episode>\d{1,4})(?:$|[^0-9])",
        )
        .unwrap(),
        // 1x05, 1x05-06, 1x05-1x06
        Regex::new(
            r"(?i)^(?P<title>.*?)(?:^|[^a-z0-9])(?P<season>\d{1,2})x(?P<episode>\d{2,3})(?:-(?:\d{1,2}x)?(?P<episode2>\d{2,3}))?(?:$|[^a-z0-9])",
        )
        .unwrap(),
    ]
});

// Season/episode markers removed when deriving a bare title from a file name
static EPISODE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bS\d{1,3}(?:[ ._]?E\d{1,4})*(?:-E?\d{1,4})?\b|\b\d{1,2}x\d{2,3}(?:-\d{2,3})?\b")
        .unwrap()
});

static SEASON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bseason\s*(\d{1,3})\b").unwrap());

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "webm", "m4v", "mov", "ts"];

/// Parse an extension-stripped file name into its episode tuple.
///
/// Returns `None` when no structural pattern matches or a number is not
/// positive; callers treat that as "no structural info", never as an error.
pub fn parse_episode_tuple(name: &str) -> Option<ParsedEpisode> {
    EPISODE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(name).and_then(|caps| parsed_from_captures(&caps)))
}

/// Same as [`parse_episode_tuple`] but takes a path and parses its file stem
pub fn parse_episode_path(path: &Path) -> Option<ParsedEpisode> {
    let stem = path.file_stem()?.to_str()?;
    parse_episode_tuple(stem)
}

fn parsed_from_captures(caps: &Captures<'_>) -> Option<ParsedEpisode> {
    let number = |name: &str| -> Option<u32> {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|&n| n > 0)
    };

    let season = number("season")?;
    let episode = number("episode")?;
    let title_hint = caps
        .name("title")
        .map(|m| clean_title(m.as_str()))
        .filter(|t| !t.is_empty());

    Some(ParsedEpisode {
        title_hint,
        tuple: SourceEpisodeTuple::new(season, episode, number("episode2")),
    })
}

fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ':' || c.is_whitespace())
        .to_string()
}

/// Parse "Season N" out of a free-form name such as an episode-group sub-group
pub fn parse_season_name(name: &str) -> Option<u32> {
    SEASON_NAME
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| n > 0)
}

/// Remove season/episode tokens from a name, leaving the surrounding words
pub fn strip_episode_tokens(name: &str) -> String {
    EPISODE_TOKENS.replace_all(name, " ").into_owned()
}

/// Lowercase, punctuation-free, single-spaced form used for title comparison
pub fn normalize_title(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_video_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext))
}

pub fn make_file_id(path: &Path) -> String {
    path.to_string_lossy()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
