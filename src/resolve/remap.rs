//! Season compaction for releases that merge several catalog episodes into
//! one file.
//!
//! When a season's source numbering runs past the catalog's episode count,
//! only ranges evidenced by file names (`S01E05-E06`) are trusted to explain
//! the overflow. If they cannot absorb all of it no plan is produced and the
//! numbers stay as they are.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::library::parser::SourceEpisodeTuple;

/// Inclusive source interval that collapses onto `source_start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRemapRange {
    pub source_start: u32,
    pub source_end: u32,
}

impl SeasonRemapRange {
    fn width(&self) -> u32 {
        self.source_end - self.source_start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRemapPlan {
    pub season_number: u32,
    pub tmdb_episode_count: u32,
    pub source_episode_max: u32,
    /// Disjoint and increasing
    pub collapsed_ranges: Vec<SeasonRemapRange>,
}

/// Display-only record of what a remap changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRemapInfo {
    pub original: SourceEpisodeTuple,
    pub remapped: SourceEpisodeTuple,
    pub tmdb_episode_count: u32,
    pub source_episode_max: u32,
    pub collapsed_ranges: Vec<SeasonRemapRange>,
}

/// Decide whether `season_number` needs compacting against the catalog count.
///
/// `tuples` may contain other seasons and duplicates; both are ignored.
pub fn plan_season_remap(
    season_number: u32,
    tmdb_episode_count: u32,
    tuples: &[SourceEpisodeTuple],
) -> Option<SeasonRemapPlan> {
    if tmdb_episode_count == 0 {
        return None;
    }

    let season_tuples: BTreeSet<SourceEpisodeTuple> = tuples
        .iter()
        .filter(|t| t.season_number == season_number)
        .map(|t| SourceEpisodeTuple::new(t.season_number, t.episode_number, t.episode_number2))
        .collect();

    let source_episode_max = season_tuples.iter().map(SourceEpisodeTuple::max_episode).max()?;
    if source_episode_max <= tmdb_episode_count {
        return None;
    }
    let overflow = source_episode_max - tmdb_episode_count;

    // BTreeSet order is (season, start, end), so candidates come out sorted
    let candidates = season_tuples.iter().filter_map(|t| {
        t.episode_number2.map(|end| SeasonRemapRange {
            source_start: t.episode_number,
            source_end: end,
        })
    });

    let mut remaining = overflow;
    let mut collapsed_ranges: Vec<SeasonRemapRange> = Vec::new();

    for candidate in candidates {
        if remaining == 0 {
            break;
        }
        if let Some(previous) = collapsed_ranges.last() {
            if candidate.source_start <= previous.source_end {
                debug!(
                    season = season_number,
                    start = candidate.source_start,
                    end = candidate.source_end,
                    accepted_end = previous.source_end,
                    "Skipping remap range overlapping an accepted range"
                );
                continue;
            }
        }

        let reduced_by = candidate.width().min(remaining);
        collapsed_ranges.push(SeasonRemapRange {
            source_start: candidate.source_start,
            source_end: candidate.source_start + reduced_by,
        });
        remaining -= reduced_by;
    }

    if remaining > 0 {
        debug!(
            season = season_number,
            overflow, remaining, "Episode overflow not explained by merged ranges, no remap"
        );
        return None;
    }

    Some(SeasonRemapPlan {
        season_number,
        tmdb_episode_count,
        source_episode_max,
        collapsed_ranges,
    })
}

/// Map one source episode number through the plan's ranges
pub fn remap_episode_number(episode: u32, ranges: &[SeasonRemapRange]) -> u32 {
    let mut reduction = 0;
    for range in ranges {
        if episode < range.source_start {
            return episode - reduction;
        }
        if episode <= range.source_end {
            return range.source_start - reduction;
        }
        reduction += range.width();
    }
    episode - reduction
}

/// Apply `plan` to a tuple. Info is returned only when a number changed.
pub fn apply_season_remap(
    tuple: SourceEpisodeTuple,
    plan: Option<&SeasonRemapPlan>,
) -> (SourceEpisodeTuple, Option<EpisodeRemapInfo>) {
    let Some(plan) = plan.filter(|p| p.season_number == tuple.season_number) else {
        return (tuple, None);
    };

    let episode = remap_episode_number(tuple.episode_number, &plan.collapsed_ranges);
    let episode2 = tuple
        .episode_number2
        .map(|e| remap_episode_number(e, &plan.collapsed_ranges));
    let remapped = SourceEpisodeTuple::new(tuple.season_number, episode, episode2);

    if remapped == tuple {
        return (tuple, None);
    }

    let info = EpisodeRemapInfo {
        original: tuple,
        remapped,
        tmdb_episode_count: plan.tmdb_episode_count,
        source_episode_max: plan.source_episode_max,
        collapsed_ranges: plan.collapsed_ranges.clone(),
    };
    (remapped, Some(info))
}
