//! CSV adapters for the track and playlist tables.
//!
//! Both tables are headerless. Track rows are fixed five-column records;
//! playlist rows are variable-width (a playlist id followed by arbitrarily
//! many track ids, with no row-length ceiling). Any malformed row is a
//! fatal parse error; there is no partial recovery.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use indicatif::ProgressBar;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::models::{PlaylistRecord, TrackRecord};
use crate::progress::{create_progress_bar, create_spinner};

/// Read the track table from a headerless CSV file.
pub fn read_tracks(path: &Path) -> Result<Vec<TrackRecord>> {
    let spinner = create_spinner("Phase 1: Reading tracks");
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open track table '{}'", path.display()))?;
    let tracks = read_tracks_from(file)
        .with_context(|| format!("failed to parse track table '{}'", path.display()))?;
    spinner.finish_with_message(format!("Phase 1: Read {} tracks", tracks.len()));
    Ok(tracks)
}

pub fn read_tracks_from<R: Read>(reader: R) -> Result<Vec<TrackRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut tracks = Vec::new();
    for (row, result) in reader.deserialize::<TrackRecord>().enumerate() {
        let track = result.with_context(|| format!("malformed track row {}", row + 1))?;
        tracks.push(track);
    }
    Ok(tracks)
}

/// Read the playlist table from a headerless, variable-width CSV file.
pub fn read_playlists(path: &Path) -> Result<Vec<PlaylistRecord>> {
    let spinner = create_spinner("Phase 2: Reading playlists");
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open playlist table '{}'", path.display()))?;
    let playlists = read_playlists_from(file)
        .with_context(|| format!("failed to parse playlist table '{}'", path.display()))?;
    spinner.finish_with_message(format!("Phase 2: Read {} playlists", playlists.len()));
    Ok(playlists)
}

pub fn read_playlists_from<R: Read>(reader: R) -> Result<Vec<PlaylistRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut playlists = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed playlist row {}", row + 1))?;
        let mut fields = record.iter();
        let id = fields
            .next()
            .with_context(|| format!("empty playlist row {}", row + 1))?
            .to_string();
        playlists.push(PlaylistRecord {
            id,
            tracks: fields.map(str::to_string).collect(),
        });
    }
    Ok(playlists)
}

pub fn write_tracks_to<W: Write>(
    writer: W,
    tracks: &[TrackRecord],
    pb: &ProgressBar,
) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for track in tracks {
        writer.serialize(track)?;
        pb.inc(1);
    }
    writer.flush()?;
    Ok(())
}

pub fn write_playlists_to<W: Write>(
    writer: W,
    playlists: &[PlaylistRecord],
    pb: &ProgressBar,
) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);
    for playlist in playlists {
        writer.write_record(
            std::iter::once(playlist.id.as_str()).chain(playlist.tracks.iter().map(String::as_str)),
        )?;
        pb.inc(1);
    }
    writer.flush()?;
    Ok(())
}

/// Write both output tables, all or nothing.
///
/// Each table goes to a `.tmp` sibling first; the temporaries are renamed
/// into place only after both writes succeed, so a failure partway through
/// leaves neither output behind.
pub fn write_outputs(
    tracks_path: &Path,
    playlists_path: &Path,
    tracks: &[TrackRecord],
    playlists: &[PlaylistRecord],
) -> Result<()> {
    let tracks_tmp = tmp_sibling(tracks_path);
    let playlists_tmp = tmp_sibling(playlists_path);

    let result = write_tmp_outputs(&tracks_tmp, &playlists_tmp, tracks, playlists);
    if result.is_err() {
        let _ = fs::remove_file(&tracks_tmp);
        let _ = fs::remove_file(&playlists_tmp);
        return result;
    }

    fs::rename(&tracks_tmp, tracks_path)
        .with_context(|| format!("failed to move track table into '{}'", tracks_path.display()))?;
    fs::rename(&playlists_tmp, playlists_path).with_context(|| {
        format!(
            "failed to move playlist table into '{}'",
            playlists_path.display()
        )
    })?;
    Ok(())
}

fn write_tmp_outputs(
    tracks_tmp: &Path,
    playlists_tmp: &Path,
    tracks: &[TrackRecord],
    playlists: &[PlaylistRecord],
) -> Result<()> {
    let pb = create_progress_bar(tracks.len() as u64, "Phase 5: Writing tracks");
    let file = fs::File::create(tracks_tmp)
        .with_context(|| format!("failed to create '{}'", tracks_tmp.display()))?;
    write_tracks_to(file, tracks, &pb)?;
    pb.finish_with_message(format!("Phase 5: Wrote {} tracks", tracks.len()));

    let pb = create_progress_bar(playlists.len() as u64, "Phase 6: Writing playlists");
    let file = fs::File::create(playlists_tmp)
        .with_context(|| format!("failed to create '{}'", playlists_tmp.display()))?;
    write_playlists_to(file, playlists, &pb)?;
    pb.finish_with_message(format!("Phase 6: Wrote {} playlists", playlists.len()));
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tracks_headerless() {
        let data = "t1,Artist,Title,http://u1,5\nt2,Other,Song,,3\n";
        let tracks = read_tracks_from(data.as_bytes()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "t1");
        assert_eq!(tracks[0].url.as_deref(), Some("http://u1"));
        assert_eq!(tracks[0].count, 5);
        // Empty url field becomes None
        assert_eq!(tracks[1].url, None);
    }

    #[test]
    fn test_read_tracks_non_numeric_count_is_fatal() {
        let data = "t1,Artist,Title,http://u1,many\n";
        assert!(read_tracks_from(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_tracks_wrong_arity_is_fatal() {
        let data = "t1,Artist,Title\n";
        assert!(read_tracks_from(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_playlists_variable_width() {
        let data = "p1,t1,t2,t3\np2,t9\n";
        let playlists = read_playlists_from(data.as_bytes()).unwrap();
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].id, "p1");
        assert_eq!(playlists[0].tracks, vec!["t1", "t2", "t3"]);
        assert_eq!(playlists[1].tracks, vec!["t9"]);
    }

    #[test]
    fn test_read_playlists_bare_id_row() {
        let playlists = read_playlists_from("p1\n".as_bytes()).unwrap();
        assert_eq!(playlists.len(), 1);
        assert!(playlists[0].tracks.is_empty());
    }

    #[test]
    fn test_write_tracks_headerless_round() {
        let tracks = vec![
            TrackRecord {
                id: "t1".into(),
                artist: "Artist".into(),
                title: "Title".into(),
                url: Some("http://u1".into()),
                count: 5,
            },
            TrackRecord {
                id: "t2".into(),
                artist: "Other".into(),
                title: "Song".into(),
                url: None,
                count: 3,
            },
        ];
        let mut buf = Vec::new();
        write_tracks_to(&mut buf, &tracks, &ProgressBar::hidden()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "t1,Artist,Title,http://u1,5\nt2,Other,Song,,3\n");
    }

    #[test]
    fn test_write_playlists_variable_width() {
        let playlists = vec![
            PlaylistRecord {
                id: "p1".into(),
                tracks: vec!["t1".into(), "t2".into()],
            },
            PlaylistRecord {
                id: "p2".into(),
                tracks: vec!["t9".into()],
            },
        ];
        let mut buf = Vec::new();
        write_playlists_to(&mut buf, &playlists, &ProgressBar::hidden()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "p1,t1,t2\np2,t9\n");
    }

    #[test]
    fn test_tmp_sibling_keeps_directory() {
        let tmp = tmp_sibling(Path::new("data/tracks_dedup.csv"));
        assert_eq!(tmp, Path::new("data/tracks_dedup.csv.tmp"));
    }
}
