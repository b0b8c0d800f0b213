use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use playlist_dedup::dedup::{build_id_map, filter_tracks, group_tracks, rewrite_playlists};
use playlist_dedup::io;
use playlist_dedup::models::DedupStats;
use playlist_dedup::progress;
use playlist_dedup::safety::validate_output_paths;

#[derive(Parser)]
#[command(name = "playlist-dedup")]
#[command(about = "Deduplicate a track catalog and rewrite playlists against it")]
struct Args {
    /// Tracks CSV file: id, artist, title, url, count (no header)
    #[arg(long, default_value = "data/tracks.csv")]
    tracks_file: PathBuf,

    /// Playlists CSV file: playlist id followed by track ids (no header)
    #[arg(long, default_value = "data/playlist_details.csv")]
    playlists_file: PathBuf,

    /// Deduplicated tracks CSV file
    #[arg(long, default_value = "data/tracks_dedup.csv")]
    dedup_tracks_file: PathBuf,

    /// Deduplicated playlists CSV file
    #[arg(long, default_value = "data/playlists_dedup.csv")]
    dedup_playlists_file: PathBuf,

    /// Number of times a track must appear in playlists to be included
    #[arg(long, default_value_t = 10)]
    min_count: u64,

    /// Drop tracks with missing URLs (false keeps them, sorted behind URL-bearing tracks)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    drop_missing_urls: bool,

    /// ID substituted for out-of-vocabulary track references; omit to drop them instead
    #[arg(long)]
    oov: Option<String>,

    /// Write run statistics to this JSON file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide progress bars for tail-friendly logging
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    progress::set_log_only(args.log_only);

    validate_output_paths(
        &[&args.dedup_tracks_file, &args.dedup_playlists_file],
        &[&args.tracks_file, &args.playlists_file],
    )?;

    let start = Instant::now();
    let mut stats = DedupStats::default();

    let tracks = io::read_tracks(&args.tracks_file)?;
    stats.tracks_read = tracks.len();
    let playlists = io::read_playlists(&args.playlists_file)?;

    let filtered = filter_tracks(tracks, args.min_count, args.drop_missing_urls, &mut stats);
    let canonical = group_tracks(&filtered, &mut stats);
    println!(
        "Phase 3: {} tracks in {} unique (artist, title) groups",
        filtered.len(),
        canonical.len()
    );

    let id_map = build_id_map(&filtered, &canonical)?;
    let rewritten = rewrite_playlists(playlists, &id_map, args.oov.as_deref(), &mut stats);
    println!(
        "Phase 4: Rewrote {} playlists ({} dropped)",
        stats.playlists_written, stats.playlists_dropped
    );

    io::write_outputs(
        &args.dedup_tracks_file,
        &args.dedup_playlists_file,
        &canonical,
        &rewritten,
    )?;

    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("dedup");
    if let Some(path) = &args.stats {
        stats.write_to_file(path)?;
    }

    println!("\n{:=<60}", "");
    println!("Deduplication complete!");
    println!(
        "  Tracks: {} -> {}",
        stats.tracks_read, stats.canonical_groups
    );
    println!(
        "  Playlists: {} -> {}",
        stats.playlists_read, stats.playlists_written
    );
    println!(
        "  Duplicates merged: {} ({:.1}%)",
        stats.duplicates_merged,
        stats.dedup_rate()
    );
    println!("  Elapsed: {}", progress::format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
