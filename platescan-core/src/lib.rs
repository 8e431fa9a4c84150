//! Core library for scanning videos for license plates using ffmpeg and alpr.
//!
//! This crate implements the frame-sampling and detection-aggregation
//! pipeline: it pulls frames out of a video at a configurable stride up to a
//! hard cap, hands each sampled frame to a plate recognizer, and merges the
//! per-frame results into a single report. Per-frame failures degrade to
//! empty results; only an unreadable video aborts a job.
//!
//! The HTTP surface and the recognition engine itself are collaborators,
//! not part of this crate: the pipeline exposes plain function contracts
//! and treats the recognizer as a `PlateDetector` implementation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use platescan_core::{AlprDetector, JobConfig, process_video};
//! use std::path::Path;
//!
//! let config = JobConfig::default();
//! config.validate().unwrap();
//!
//! let detector = AlprDetector::new(&config).unwrap();
//! let report = process_video(Path::new("/path/to/video.mp4"), &config, &detector).unwrap();
//!
//! for detection in &report.plates {
//!     println!(
//!         "{} ({:.1}) at frame {}",
//!         detection.plate, detection.confidence, detection.frame
//!     );
//! }
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod processing;
pub mod temp_files;

// Re-exports for public API
pub use config::{JobConfig, JobConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use external::{
    AlprDetector, DetectionResult, FrameDecoder, PlateCandidate, PlateDetector, RawFrame,
    VideoProperties, probe_video,
};
pub use processing::{
    Detection, PlateReport, ReportBuilder, process_video, process_video_bytes,
    run_detection_pass, sample_frames,
};
pub use temp_files::write_temp_video;
