//! Temporary file management for scanning jobs.
//!
//! Every transient resource a job allocates goes through this module: the
//! materialized upload and the per-frame JPEG artifacts handed to the
//! recognizer. It leverages the tempfile crate to handle cleanup via the
//! Drop trait, so release happens on every exit path, error paths included.

use crate::error::CoreResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Resolves the base directory for a job's temporary files.
pub fn temp_base(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir)
}

/// Materializes an uploaded video into a temporary `.mp4` file.
///
/// The returned handle owns the file; dropping it removes the file.
pub fn write_temp_video(video: &[u8], base: Option<&Path>) -> CoreResult<NamedTempFile> {
    let base = temp_base(base);
    std::fs::create_dir_all(&base)?;
    let mut temp = TempFileBuilder::new()
        .prefix("platescan_upload_")
        .suffix(".mp4")
        .tempfile_in(&base)?;
    temp.write_all(video)?;
    temp.flush()?;
    Ok(temp)
}

/// Creates a uniquely named JPEG artifact file for one sampled frame.
///
/// The random component in the name keeps concurrent invocations from
/// colliding. Auto-deleted when dropped.
pub fn create_frame_artifact(dir: &Path, frame_index: u32) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let artifact = TempFileBuilder::new()
        .prefix(&format!("frame_{frame_index}_"))
        .suffix(".jpg")
        .tempfile_in(dir)?;
    Ok(artifact)
}
