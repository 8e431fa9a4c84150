// ============================================================================
// platescan-core/src/processing/video.rs
// ============================================================================
//
// SCAN ORCHESTRATION: Main Scanning Pipeline
//
// This module houses the orchestration logic for the platescan-core library.
// It drives the full pipeline for one job: materialize the upload, probe the
// video, pull sampled frames, hand each to the plate detector, and absorb
// the results into the final report.
//
// KEY COMPONENTS:
// - process_video_bytes: entry point for an uploaded video payload
// - process_video: entry point for an on-disk video file
// - run_detection_pass: detector loop over any sampled frame stream
//
// WORKFLOW:
// 1. Validate the job configuration
// 2. Check for required external dependencies (ffmpeg, ffprobe)
// 3. Probe the video; an unreadable input aborts the job here
// 4. Stream frames out of ffmpeg, sampled by stride up to the frame cap
// 5. For each sampled frame: detect, then absorb into the report
//    (sequentially, or in bounded parallel batches)
// 6. Finalize and return the report; temporary resources are released by
//    Drop on success and failure paths alike
//
// AI-ASSISTANT-INFO: Main scanning pipeline orchestration module

// ---- Internal crate imports ----
use crate::config::JobConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::alpr::{DetectionResult, PlateDetector};
use crate::external::check_dependency;
use crate::external::decoder::{FrameDecoder, RawFrame};
use crate::external::probe::probe_video;
use crate::processing::report::{PlateReport, ReportBuilder};
use crate::processing::sampling::sample_frames;
use crate::temp_files;

// ---- External crate imports ----
use log::{debug, info, warn};
use rayon::prelude::*;

// ---- Standard library imports ----
use std::path::Path;
use std::time::Instant;

/// Scans an uploaded video payload for license plates.
///
/// The payload is materialized into a temporary file that lives exactly as
/// long as the job; it is removed on every exit path, including job-fatal
/// errors.
pub fn process_video_bytes<D: PlateDetector>(
    video: &[u8],
    config: &JobConfig,
    detector: &D,
) -> CoreResult<PlateReport> {
    config.validate()?;
    let upload = temp_files::write_temp_video(video, config.temp_dir.as_deref())?;
    debug!(
        "Materialized {} byte upload at {}",
        video.len(),
        upload.path().display()
    );
    process_video(upload.path(), config, detector)
}

/// Scans an on-disk video file for license plates.
///
/// Returns the aggregated report in frame-processing order; an empty report
/// is a valid outcome. An unreadable video is the only frame-related
/// condition that aborts the job.
pub fn process_video<D: PlateDetector>(
    input_path: &Path,
    config: &JobConfig,
    detector: &D,
) -> CoreResult<PlateReport> {
    config.validate()?;

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    let properties = probe_video(input_path)?;
    info!(
        "Scanning {}: {}x{}, {:.1}s, stride {}, cap {}",
        input_path.display(),
        properties.width,
        properties.height,
        properties.duration_secs,
        config.frame_stride,
        config.max_frames
    );

    let decoder = FrameDecoder::open(input_path)?;
    let sampled = sample_frames(decoder, config.frame_stride, config.max_frames);
    run_detection_pass(sampled, config, detector)
}

/// Drives the detect-and-absorb loop over a stream of sampled frames.
///
/// With one worker, frames are processed strictly sequentially. With more,
/// frames are pulled in batches of at most `detection_workers` and detected
/// on a bounded thread pool; results are absorbed in frame-index order
/// either way, so report entries are monotonically non-decreasing in frame
/// index. The optional job deadline is checked before each pull; on expiry
/// the report is finalized with what has been absorbed so far.
pub fn run_detection_pass<I, D>(
    frames: I,
    config: &JobConfig,
    detector: &D,
) -> CoreResult<PlateReport>
where
    I: IntoIterator<Item = CoreResult<RawFrame>>,
    D: PlateDetector,
{
    let started = Instant::now();
    let mut frames = frames.into_iter();
    let mut builder = ReportBuilder::new();
    let mut attempted: u32 = 0;

    if config.detection_workers <= 1 {
        loop {
            if deadline_expired(config, started) {
                break;
            }
            let Some(item) = frames.next() else { break };
            let frame = item?;
            let index = frame.index;
            builder.absorb(index, detector.detect(frame));
            attempted += 1;
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.detection_workers)
            .build()
            .map_err(|e| CoreError::Other(format!("Failed to initialize thread pool: {e}")))?;

        loop {
            if deadline_expired(config, started) {
                break;
            }
            // At most one batch of frames is in memory at a time; each frame
            // is dropped inside its detection attempt.
            let mut batch: Vec<RawFrame> = Vec::with_capacity(config.detection_workers);
            while batch.len() < config.detection_workers {
                match frames.next() {
                    Some(item) => batch.push(item?),
                    None => break,
                }
            }
            if batch.is_empty() {
                break;
            }
            attempted += batch.len() as u32;

            // into_par_iter + collect preserves input order, which keeps the
            // report monotonic in frame index under concurrency.
            let results: Vec<(u32, DetectionResult)> = pool.install(|| {
                batch
                    .into_par_iter()
                    .map(|frame| {
                        let index = frame.index;
                        (index, detector.detect(frame))
                    })
                    .collect()
            });
            for (index, result) in results {
                builder.absorb(index, result);
            }
        }
    }

    let degraded = builder.degraded_frames();
    let report = builder.finalize();
    debug!(
        "Detection pass complete: {} frames attempted, {} degraded, {} plates, {:.2?} elapsed",
        attempted,
        degraded,
        report.plates.len(),
        started.elapsed()
    );
    Ok(report)
}

fn deadline_expired(config: &JobConfig, started: Instant) -> bool {
    match config.job_deadline {
        Some(deadline) if started.elapsed() >= deadline => {
            warn!(
                "Job deadline of {:.2?} expired; finalizing with absorbed results",
                deadline
            );
            true
        }
        _ => false,
    }
}
