//! Core data models for playlist deduplication.
//!
//! This module contains the record structs, type aliases, and run
//! statistics used throughout the pipeline.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Mapping from every surviving original track id to its group's canonical id.
/// Ids filtered out upstream have no entry.
pub type IdMap = FxHashMap<String, String>;

/// Index mapping (artist, title) to group index in Vec<TrackRecord>.
/// Preserves first-appearance group order without an ordered map.
pub type GroupIndex = FxHashMap<(String, String), usize>;

// ============================================================================
// Records
// ============================================================================

/// One row of the track table. `count` is the number of observed occurrences
/// across all source playlists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub url: Option<String>,
    pub count: u64,
}

impl TrackRecord {
    /// An empty CSV field deserializes to `None`, but a present-but-blank
    /// string also counts as missing.
    pub fn has_url(&self) -> bool {
        self.url.as_deref().map_or(false, |u| !u.is_empty())
    }

    /// Grouping key: exact, case-sensitive (artist, title).
    pub fn group_key(&self) -> (String, String) {
        (self.artist.clone(), self.title.clone())
    }
}

/// One row of the playlist table. Track order is playlist order and is
/// preserved end to end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub id: String,
    pub tracks: Vec<String>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, logged as JSON to stderr and optionally written to disk.
#[derive(Default, Debug, Clone, Serialize)]
pub struct DedupStats {
    // Track filtering
    pub tracks_read: usize,
    pub tracks_below_min_count: usize,
    pub tracks_missing_url_dropped: usize,
    pub tracks_surviving: usize,

    // Grouping
    pub canonical_groups: usize,
    pub duplicates_merged: usize,

    // Playlist rewriting
    pub playlists_read: usize,
    pub playlists_written: usize,
    pub playlists_dropped: usize,
    pub oov_substitutions: usize,
    pub track_refs_dropped: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl DedupStats {
    /// Fraction of surviving tracks that were folded into another group.
    pub fn dedup_rate(&self) -> f64 {
        if self.tracks_surviving == 0 {
            0.0
        } else {
            100.0 * self.duplicates_merged as f64 / self.tracks_surviving as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_url() {
        let mut t = TrackRecord {
            id: "1".into(),
            artist: "A".into(),
            title: "X".into(),
            url: Some("http://example".into()),
            count: 3,
        };
        assert!(t.has_url());
        t.url = Some(String::new());
        assert!(!t.has_url());
        t.url = None;
        assert!(!t.has_url());
    }

    #[test]
    fn test_dedup_rate_empty() {
        assert_eq!(DedupStats::default().dedup_rate(), 0.0);
    }
}
