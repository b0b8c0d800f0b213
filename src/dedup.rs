//! The deduplication pipeline: Filter -> Grouper -> Remapper -> Rewriter.
//!
//! All four stages are pure batch transforms over fully materialized
//! in-memory tables. Data flows strictly forward; the rewriter additionally
//! consumes the original playlist table.

use anyhow::{anyhow, Result};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

use crate::models::{DedupStats, GroupIndex, IdMap, PlaylistRecord, TrackRecord};

/// Drop tracks below the occurrence threshold and classify the remainder
/// by URL presence.
///
/// The threshold applies to raw per-row counts, before any aggregation.
/// With `drop_missing_urls` set, URL-less tracks are discarded outright;
/// otherwise they are stably sorted behind URL-bearing tracks so that
/// first-member representative selection downstream prefers a usable URL.
pub fn filter_tracks(
    tracks: Vec<TrackRecord>,
    min_count: u64,
    drop_missing_urls: bool,
    stats: &mut DedupStats,
) -> Vec<TrackRecord> {
    let before = tracks.len();
    let mut kept: Vec<TrackRecord> = tracks
        .into_iter()
        .filter(|t| t.count >= min_count)
        .collect();
    stats.tracks_below_min_count = before - kept.len();

    if drop_missing_urls {
        let before_urls = kept.len();
        kept.retain(TrackRecord::has_url);
        stats.tracks_missing_url_dropped = before_urls - kept.len();
    } else {
        // Stable partition: relative order within each side is preserved.
        kept.sort_by_key(|t| !t.has_url());
    }

    stats.tracks_surviving = kept.len();
    kept
}

/// Collapse the filtered table into one row per distinct (artist, title).
///
/// Group order follows first appearance of each key in the filtered table.
/// The representative id and url are taken from the group's first member in
/// table order; counts are summed over all members. Ties are resolved purely
/// positionally, never by a secondary sort.
pub fn group_tracks(filtered: &[TrackRecord], stats: &mut DedupStats) -> Vec<TrackRecord> {
    let mut index = GroupIndex::default();
    let mut canonical: Vec<TrackRecord> = Vec::new();

    for track in filtered {
        match index.entry(track.group_key()) {
            Entry::Occupied(slot) => canonical[*slot.get()].count += track.count,
            Entry::Vacant(slot) => {
                slot.insert(canonical.len());
                canonical.push(track.clone());
            }
        }
    }

    stats.canonical_groups = canonical.len();
    stats.duplicates_merged = filtered.len() - canonical.len();
    canonical
}

/// Left-join the filtered table to the canonical table on (artist, title),
/// producing the original-id -> canonical-id map.
///
/// Every filtered row belongs to exactly one group by construction, so a
/// missing match is an internal invariant violation, not an empty-map
/// policy.
pub fn build_id_map(filtered: &[TrackRecord], canonical: &[TrackRecord]) -> Result<IdMap> {
    let mut by_key: FxHashMap<(&str, &str), &str> = FxHashMap::default();
    for track in canonical {
        by_key.insert((track.artist.as_str(), track.title.as_str()), track.id.as_str());
    }

    let mut id_map = IdMap::default();
    for track in filtered {
        let canonical_id = by_key
            .get(&(track.artist.as_str(), track.title.as_str()))
            .ok_or_else(|| {
                anyhow!(
                    "filtered track '{}' ({} - {}) has no canonical group",
                    track.id,
                    track.artist,
                    track.title
                )
            })?;
        id_map.insert(track.id.clone(), (*canonical_id).to_string());
    }
    Ok(id_map)
}

/// Rewrite every playlist against the identifier map.
///
/// Mapped ids are replaced by their canonical id; unmapped ids become the
/// `oov` marker when one is configured and are removed otherwise. Track
/// order and intra-playlist repetition are preserved. A playlist is kept
/// only if it carries in-vocabulary content after substitution: the drop
/// predicate "every remaining entry equals the oov marker" is vacuously
/// true for an empty sequence, so both emptiness policies collapse into
/// one check.
pub fn rewrite_playlists(
    playlists: Vec<PlaylistRecord>,
    id_map: &IdMap,
    oov: Option<&str>,
    stats: &mut DedupStats,
) -> Vec<PlaylistRecord> {
    stats.playlists_read = playlists.len();
    let mut kept = Vec::with_capacity(playlists.len());

    for playlist in playlists {
        let mut tracks = Vec::with_capacity(playlist.tracks.len());
        for track_id in &playlist.tracks {
            match id_map.get(track_id) {
                Some(canonical_id) => tracks.push(canonical_id.clone()),
                None => match oov {
                    Some(marker) => {
                        stats.oov_substitutions += 1;
                        tracks.push(marker.to_string());
                    }
                    None => stats.track_refs_dropped += 1,
                },
            }
        }

        if tracks.iter().all(|t| Some(t.as_str()) == oov) {
            stats.playlists_dropped += 1;
        } else {
            kept.push(PlaylistRecord {
                id: playlist.id,
                tracks,
            });
        }
    }

    stats.playlists_written = kept.len();
    kept
}
