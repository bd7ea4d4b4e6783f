//! Placement of default-order episodes inside a catalog episode group
//! (an alternate ordering such as "DVD order" or "Absolute").

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::catalog::{Catalog, EpisodeGroupDetails, EpisodeGroupEntry, EpisodeSubgroup};
use crate::error::Result;
use crate::library::parser::parse_season_name;

/// Where an entry lands inside the selected group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEpisodePlacement {
    pub season_number: u32,
    pub episode_number: u32,
    pub name: Option<String>,
}

/// Lookup tables built from one episode group
#[derive(Debug, Clone, Default)]
pub struct GroupPlacementTable {
    by_episode_id: HashMap<u64, GroupEpisodePlacement>,
    /// Keyed by (detected sub-group season, 1-based position in sub-group)
    by_position: HashMap<(u32, u32), GroupEpisodePlacement>,
}

impl GroupPlacementTable {
    pub fn lookup_position(&self, season: u32, episode: u32) -> Option<&GroupEpisodePlacement> {
        self.by_position.get(&(season, episode))
    }

    pub fn lookup_episode_id(&self, episode_id: u64) -> Option<&GroupEpisodePlacement> {
        self.by_episode_id.get(&episode_id)
    }

    pub fn len(&self) -> usize {
        self.by_episode_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_episode_id.is_empty()
    }
}

fn positive(n: Option<u32>) -> Option<u32> {
    n.filter(|&n| n > 0)
}

fn entry_sort_key(entry: &EpisodeGroupEntry) -> u32 {
    entry.order.or(entry.episode_number).unwrap_or(0)
}

/// The season a whole sub-group stands for: the single positive season all
/// entries share, else "Season N" in its name.
fn detect_subgroup_season(subgroup: &EpisodeSubgroup) -> Option<u32> {
    let seasons: HashSet<Option<u32>> = subgroup
        .episodes
        .iter()
        .map(|e| positive(e.season_number))
        .collect();

    let shared = match seasons.len() {
        1 => seasons.into_iter().next().flatten(),
        _ => None,
    };
    shared.or_else(|| parse_season_name(&subgroup.name))
}

fn place_entry(
    entry: &EpisodeGroupEntry,
    detected_season: Option<u32>,
    subgroup_index: usize,
    position: usize,
) -> GroupEpisodePlacement {
    let season_number = positive(entry.season_number)
        .or(detected_season)
        .unwrap_or(subgroup_index as u32 + 1);
    let episode_number = entry
        .order
        .map(|o| o + 1)
        .or_else(|| positive(entry.episode_number))
        .unwrap_or(position as u32 + 1);

    GroupEpisodePlacement {
        season_number,
        episode_number,
        name: entry.name.clone(),
    }
}

/// Build both lookup tables for a fetched episode group
pub fn build_placement_table(group: &EpisodeGroupDetails) -> GroupPlacementTable {
    let mut subgroups: Vec<(usize, &EpisodeSubgroup)> = group.groups.iter().enumerate().collect();
    subgroups.sort_by_key(|(index, subgroup)| subgroup.order.unwrap_or(*index as u32));

    let mut table = GroupPlacementTable::default();

    for (subgroup_index, (_, subgroup)) in subgroups.into_iter().enumerate() {
        let mut entries: Vec<&EpisodeGroupEntry> = subgroup.episodes.iter().collect();
        entries.sort_by_key(|e| entry_sort_key(e));

        let detected_season = detect_subgroup_season(subgroup);
        if detected_season.is_none() {
            debug!(group = %group.id, subgroup = %subgroup.name, "No season detected for sub-group");
        }

        for (position, entry) in entries.into_iter().enumerate() {
            let placement = place_entry(entry, detected_season, subgroup_index, position);
            if let Some(season) = detected_season {
                table
                    .by_position
                    .insert((season, position as u32 + 1), placement.clone());
            }
            table.by_episode_id.insert(entry.id, placement);
        }
    }

    table
}

/// Process-lifetime tables per group id.
///
/// Two callers missing the same id may both build it; builds are
/// deterministic so the later insert is identical to the earlier one.
#[derive(Debug, Default)]
pub struct EpisodeGroupPlacementCache {
    tables: RwLock<HashMap<String, Arc<GroupPlacementTable>>>,
}

impl EpisodeGroupPlacementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_build<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        group_id: &str,
    ) -> Result<Arc<GroupPlacementTable>> {
        if let Some(table) = self.tables.read().await.get(group_id) {
            return Ok(Arc::clone(table));
        }

        let group = catalog.get_episode_group(group_id).await?;
        let table = Arc::new(build_placement_table(&group));
        if table.is_empty() {
            warn!(group = %group_id, "Episode group has no entries");
        } else {
            debug!(group = %group_id, entries = table.len(), "Built episode group placement table");
        }

        let mut tables = self.tables.write().await;
        Ok(Arc::clone(
            tables.entry(group_id.to_string()).or_insert(table),
        ))
    }

    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        id: u64,
        season: Option<u32>,
        episode: Option<u32>,
        order: Option<u32>,
    ) -> EpisodeGroupEntry {
        EpisodeGroupEntry {
            id,
            name: Some(format!("Episode {}", id)),
            season_number: season,
            episode_number: episode,
            order,
        }
    }

    fn subgroup(name: &str, order: Option<u32>, episodes: Vec<EpisodeGroupEntry>) -> EpisodeSubgroup {
        EpisodeSubgroup {
            id: None,
            name: name.to_string(),
            order,
            episodes,
        }
    }

    fn group(groups: Vec<EpisodeSubgroup>) -> EpisodeGroupDetails {
        EpisodeGroupDetails {
            id: "g".to_string(),
            name: "Alternate".to_string(),
            groups,
        }
    }

    #[test]
    fn test_order_drives_episode_number() {
        let table = build_placement_table(&group(vec![subgroup(
            "Arc",
            Some(0),
            vec![
                entry(1, Some(1), Some(7), Some(0)),
                entry(2, Some(1), Some(9), Some(1)),
                entry(3, Some(1), Some(4), Some(2)),
            ],
        )]));

        let placement = table.lookup_episode_id(3).unwrap();
        assert_eq!(placement.season_number, 1);
        assert_eq!(placement.episode_number, 3);
        assert_eq!(table.lookup_position(1, 3), Some(placement));
    }

    #[test]
    fn test_season_from_subgroup_name() {
        // entries disagree on season, so the name decides
        let table = build_placement_table(&group(vec![subgroup(
            "Season 2",
            None,
            vec![
                entry(10, Some(1), Some(12), Some(0)),
                entry(11, Some(3), Some(1), Some(1)),
            ],
        )]));

        assert_eq!(table.lookup_position(2, 1).unwrap().season_number, 1);
        assert_eq!(table.lookup_position(2, 2).unwrap().episode_number, 2);
        assert!(table.lookup_position(1, 1).is_none());
    }

    #[test]
    fn test_undetected_season_falls_back_to_index() {
        let table = build_placement_table(&group(vec![
            subgroup("Part A", Some(0), vec![entry(1, Some(1), Some(1), Some(0))]),
            subgroup(
                "Part B",
                Some(1),
                vec![entry(2, None, None, None), entry(3, Some(0), Some(5), None)],
            ),
        ]));

        // Part B: entry 2 has no season/number, sorts first (key 0)
        let second = table.lookup_episode_id(2).unwrap();
        assert_eq!(second.season_number, 2);
        assert_eq!(second.episode_number, 1);
        let special = table.lookup_episode_id(3).unwrap();
        assert_eq!(special.season_number, 2);
        assert_eq!(special.episode_number, 5);
        assert!(table.lookup_position(2, 1).is_none());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_group_builds_empty_table() {
        let table = build_placement_table(&group(vec![subgroup("Season 1", None, Vec::new())]));
        assert!(table.is_empty());
        assert!(table.lookup_position(1, 1).is_none());
    }

    #[test]
    fn test_subgroups_sorted_by_declared_order() {
        let table = build_placement_table(&group(vec![
            subgroup("Later", Some(2), vec![entry(20, None, None, Some(0))]),
            subgroup("Earlier", Some(1), vec![entry(10, None, None, Some(0))]),
        ]));
        assert_eq!(table.lookup_episode_id(10).unwrap().season_number, 1);
        assert_eq!(table.lookup_episode_id(20).unwrap().season_number, 2);
    }

    #[test]
    fn test_entries_sorted_by_order_then_number() {
        let table = build_placement_table(&group(vec![subgroup(
            "Season 1",
            None,
            vec![
                entry(2, Some(1), Some(8), None),
                entry(1, Some(1), Some(3), None),
            ],
        )]));
        assert_eq!(table.lookup_position(1, 1).unwrap().episode_number, 3);
        assert_eq!(table.lookup_position(1, 2).unwrap().episode_number, 8);
    }
}
