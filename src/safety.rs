//! Safety checks to prevent accidental clobbering of input tables.
//!
//! Output paths are validated before any file is touched, so a bad
//! invocation aborts without writing anything.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that the output paths are safe to overwrite.
///
/// Checks:
/// - No output path may equal any input path
/// - The output paths must be distinct from each other
pub fn validate_output_paths(outputs: &[&Path], sources: &[&Path]) -> Result<()> {
    for (i, output) in outputs.iter().enumerate() {
        for other in &outputs[i + 1..] {
            if output == other {
                bail!(
                    "Safety check failed: output paths must be distinct, got '{}' twice",
                    output.display()
                );
            }
        }
        for source in sources {
            if output == source {
                bail!(
                    "Safety check failed: output '{}' cannot be the same as input '{}'",
                    output.display(),
                    source.display()
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output_paths() {
        let tracks_out = PathBuf::from("data/tracks_dedup.csv");
        let playlists_out = PathBuf::from("data/playlists_dedup.csv");
        let tracks_in = PathBuf::from("data/tracks.csv");
        let playlists_in = PathBuf::from("data/playlist_details.csv");
        assert!(validate_output_paths(
            &[&tracks_out, &playlists_out],
            &[&tracks_in, &playlists_in]
        )
        .is_ok());
    }

    #[test]
    fn test_output_equals_input() {
        let path = PathBuf::from("data/tracks.csv");
        let other_out = PathBuf::from("data/playlists_dedup.csv");
        let playlists_in = PathBuf::from("data/playlist_details.csv");
        let result = validate_output_paths(&[&path, &other_out], &[&path, &playlists_in]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as input"));
    }

    #[test]
    fn test_duplicate_outputs() {
        let out = PathBuf::from("data/dedup.csv");
        let tracks_in = PathBuf::from("data/tracks.csv");
        let result = validate_output_paths(&[&out, &out], &[&tracks_in]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must be distinct"));
    }
}
