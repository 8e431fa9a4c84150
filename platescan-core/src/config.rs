//! Configuration structures and constants for the platescan-core library.
//!
//! This module provides the configuration for a single scanning job: the
//! frame sampling policy, the recognizer region, timeouts, and the worker
//! count for parallel detection.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Default hard cap on the number of frames examined per job.
/// Sampling stops once the next candidate index would reach this value.
pub const DEFAULT_MAX_FRAMES: u32 = 300;

/// Default sampling stride, in frame-index units.
/// With the default of 10, frames 0, 10, 20, ... are examined.
pub const DEFAULT_FRAME_STRIDE: u32 = 10;

/// Default recognizer region passed to alpr's `-c` flag.
pub const DEFAULT_REGION: &str = "eu";

/// Default per-invocation timeout for one recognizer call, in seconds.
/// An external-process call can hang; expiry degrades the frame, never the job.
pub const DEFAULT_DETECTION_TIMEOUT_SECS: u64 = 10;

/// Default number of detection workers. 1 means strictly sequential
/// processing, one recognizer call at a time.
pub const DEFAULT_DETECTION_WORKERS: usize = 1;

/// Configuration for one video scanning job.
///
/// Holds the frame sampling policy, recognizer settings, and resource
/// limits. Typically created by the consumer of the library (a service
/// layer) and passed to the `process_video` family of functions.
///
/// All fields have sensible defaults; the builder provides a fluent way to
/// override them.
///
/// # Examples
///
/// ```rust
/// use platescan_core::config::JobConfigBuilder;
/// use std::time::Duration;
///
/// let config = JobConfigBuilder::new()
///     .max_frames(300)
///     .frame_stride(10)
///     .region("eu")
///     .detection_timeout(Duration::from_secs(10))
///     .detection_workers(4)
///     .build();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Hard cap on the number of frames examined per job.
    /// Frames with index >= `max_frames` are never sampled.
    pub max_frames: u32,

    /// Sampling stride: only frames whose index is a multiple of this value
    /// are handed to the recognizer.
    pub frame_stride: u32,

    /// Recognizer region/locale configuration (alpr `-c` value).
    pub region: String,

    /// Timeout for a single recognizer invocation. Expiry degrades that
    /// frame's result to empty.
    pub detection_timeout: Duration,

    /// Optional deadline for the whole job. When it expires, no further
    /// frames are pulled and the report is finalized with what has been
    /// absorbed so far.
    pub job_deadline: Option<Duration>,

    /// Number of concurrent detection workers. 1 = sequential.
    pub detection_workers: usize,

    /// Optional base directory for temporary files (uploaded video, frame
    /// artifacts). Defaults to the system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            frame_stride: DEFAULT_FRAME_STRIDE,
            region: DEFAULT_REGION.to_string(),
            detection_timeout: Duration::from_secs(DEFAULT_DETECTION_TIMEOUT_SECS),
            job_deadline: None,
            detection_workers: DEFAULT_DETECTION_WORKERS,
            temp_dir: None,
        }
    }
}

impl JobConfig {
    /// Checks the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.frame_stride == 0 {
            return Err(CoreError::Config(
                "frame_stride must be greater than zero".to_string(),
            ));
        }
        if self.max_frames == 0 {
            return Err(CoreError::Config(
                "max_frames must be greater than zero".to_string(),
            ));
        }
        if self.detection_workers == 0 {
            return Err(CoreError::Config(
                "detection_workers must be greater than zero".to_string(),
            ));
        }
        if self.region.is_empty() {
            return Err(CoreError::Config(
                "region must not be empty".to_string(),
            ));
        }
        if self.detection_timeout.is_zero() {
            return Err(CoreError::Config(
                "detection_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for creating `JobConfig` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    /// Creates a new builder initialized with the default configuration.
    pub fn new() -> Self {
        Self {
            config: JobConfig::default(),
        }
    }

    /// Sets the hard cap on examined frames.
    pub fn max_frames(mut self, max_frames: u32) -> Self {
        self.config.max_frames = max_frames;
        self
    }

    /// Sets the sampling stride.
    pub fn frame_stride(mut self, frame_stride: u32) -> Self {
        self.config.frame_stride = frame_stride;
        self
    }

    /// Sets the recognizer region.
    pub fn region(mut self, region: &str) -> Self {
        self.config.region = region.to_string();
        self
    }

    /// Sets the per-invocation recognizer timeout.
    pub fn detection_timeout(mut self, timeout: Duration) -> Self {
        self.config.detection_timeout = timeout;
        self
    }

    /// Sets the overall job deadline.
    pub fn job_deadline(mut self, deadline: Duration) -> Self {
        self.config.job_deadline = Some(deadline);
        self
    }

    /// Sets the number of concurrent detection workers.
    pub fn detection_workers(mut self, workers: usize) -> Self {
        self.config.detection_workers = workers;
        self
    }

    /// Sets the base directory for temporary files.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.config.temp_dir = Some(dir);
        self
    }

    /// Returns the configured `JobConfig`.
    pub fn build(self) -> JobConfig {
        self.config
    }
}

impl Default for JobConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = JobConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_frames, 300);
        assert_eq!(config.frame_stride, 10);
        assert_eq!(config.region, "eu");
        assert_eq!(config.detection_workers, 1);
        assert!(config.job_deadline.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = JobConfigBuilder::new()
            .max_frames(60)
            .frame_stride(5)
            .region("us")
            .detection_workers(4)
            .job_deadline(Duration::from_secs(30))
            .build();
        assert_eq!(config.max_frames, 60);
        assert_eq!(config.frame_stride, 5);
        assert_eq!(config.region, "us");
        assert_eq!(config.detection_workers, 4);
        assert_eq!(config.job_deadline, Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(JobConfigBuilder::new().frame_stride(0).build().validate().is_err());
        assert!(JobConfigBuilder::new().max_frames(0).build().validate().is_err());
        assert!(JobConfigBuilder::new().detection_workers(0).build().validate().is_err());
        assert!(JobConfigBuilder::new().region("").build().validate().is_err());
        assert!(
            JobConfigBuilder::new()
                .detection_timeout(Duration::ZERO)
                .build()
                .validate()
                .is_err()
        );
    }
}
