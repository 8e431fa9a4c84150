//! FFprobe integration for the job-level open check.
//!
//! A video that ffprobe cannot read is an open failure: the job aborts
//! before any frame is pulled. Probe success also yields basic properties
//! for observability.

use crate::error::{CoreError, CoreResult};
use ffprobe::ffprobe;
use std::path::Path;

/// Basic properties of a probed video.
#[derive(Debug, Default, Clone)]
pub struct VideoProperties {
    /// Width of the video stream in pixels
    pub width: u32,
    /// Height of the video stream in pixels
    pub height: u32,
    /// Duration of the media in seconds
    pub duration_secs: f64,
    /// Total number of frames, when the container reports it
    pub total_frames: Option<u64>,
}

/// Probes a video file, returning its properties or an open failure.
pub fn probe_video(input_path: &Path) -> CoreResult<VideoProperties> {
    log::debug!(
        "Running ffprobe (via crate) on: {}",
        input_path.display()
    );
    let metadata = ffprobe(input_path).map_err(|err| {
        log::error!("ffprobe failed for {}: {:?}", input_path.display(), err);
        CoreError::VideoOpen(format!(
            "ffprobe could not read {}: {err:?}",
            input_path.display()
        ))
    })?;

    let duration_secs = metadata
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            CoreError::VideoOpen(format!(
                "Failed to parse duration from format for {}",
                input_path.display()
            ))
        })?;

    let video_stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::VideoOpen(format!(
                "No video stream found in {}",
                input_path.display()
            ))
        })?;
    let width = video_stream.width.ok_or_else(|| {
        CoreError::VideoOpen(format!(
            "Video stream missing width in {}",
            input_path.display()
        ))
    })?;
    let height = video_stream.height.ok_or_else(|| {
        CoreError::VideoOpen(format!(
            "Video stream missing height in {}",
            input_path.display()
        ))
    })?;

    if width < 0 || height < 0 {
        return Err(CoreError::VideoOpen(format!(
            "Invalid dimensions (negative) found in {}: width={}, height={}",
            input_path.display(),
            width,
            height
        )));
    }

    let total_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok());

    Ok(VideoProperties {
        width: width as u32,
        height: height as u32,
        duration_secs,
        total_frames,
    })
}
