//! Plate recognition invocation against the external alpr tool.
//!
//! One call per sampled frame: the frame is materialized as a uniquely named
//! JPEG artifact, alpr is run against it with a timeout, and its JSON output
//! is parsed without trusting the tool. Any failure in that sequence
//! degrades the frame to an empty detection list; a single bad frame must
//! never abort the job. The artifact is removed on every exit path via Drop.

use crate::config::JobConfig;
use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::check_dependency;
use crate::external::decoder::RawFrame;
use crate::temp_files;
use image::{ImageFormat, RgbImage};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Poll interval while waiting on a recognizer process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One plate candidate as reported by the recognizer for a single frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlateCandidate {
    /// Recognized plate text
    pub plate: String,
    /// Recognizer confidence, typically 0.0-100.0, passed through verbatim
    pub confidence: f32,
}

/// Outcome of one detection attempt for one frame.
///
/// `Degraded` carries a diagnostic and absorbs to zero detections; it never
/// escalates to a job-level error.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    /// A (possibly empty) ordered list of plate candidates
    Detections(Vec<PlateCandidate>),
    /// The attempt failed; the diagnostic is recorded for observability only
    Degraded(String),
}

/// A plate recognition capability: one image in, candidates out.
///
/// Implementations must uphold the invoker contract: `detect` consumes the
/// frame, never panics on recognizer misbehavior, and reports failures as
/// `DetectionResult::Degraded` rather than raising them. The seam admits
/// in-process or out-of-process recognizers interchangeably.
pub trait PlateDetector: Send + Sync {
    /// Runs one detection attempt against a single frame.
    fn detect(&self, frame: RawFrame) -> DetectionResult;
}

/// Expected shape of alpr's JSON output. Extra fields are ignored; a missing
/// `results` array reads as empty.
#[derive(Debug, Deserialize)]
struct AlprOutput {
    #[serde(default)]
    results: Vec<PlateCandidate>,
}

/// `PlateDetector` implementation that shells out to the alpr CLI.
pub struct AlprDetector {
    binary: PathBuf,
    region: String,
    timeout: Duration,
    artifact_dir: PathBuf,
}

impl AlprDetector {
    /// Creates a detector after verifying that alpr is on the PATH.
    pub fn new(config: &JobConfig) -> CoreResult<Self> {
        check_dependency("alpr")?;
        Ok(Self::with_binary(PathBuf::from("alpr"), config))
    }

    /// Creates a detector driving the given binary, skipping the PATH check.
    pub fn with_binary(binary: PathBuf, config: &JobConfig) -> Self {
        Self {
            binary,
            region: config.region.clone(),
            timeout: config.detection_timeout,
            artifact_dir: temp_files::temp_base(config.temp_dir.as_deref()),
        }
    }

    fn try_detect(&self, frame: RawFrame) -> CoreResult<DetectionResult> {
        let frame_index = frame.index;
        // Holding the artifact across the recognizer call keeps it alive
        // exactly as long as the call; Drop removes it on every path out.
        let artifact = self.write_artifact(frame)?;
        let stdout = self.run_recognizer(artifact.path())?;
        log::trace!(
            "Recognizer output for frame {}: {}",
            frame_index,
            stdout.trim()
        );
        Ok(parse_detections(&stdout))
    }

    /// Encodes the frame as a uniquely named JPEG under the artifact dir.
    fn write_artifact(&self, frame: RawFrame) -> CoreResult<tempfile::NamedTempFile> {
        let artifact = temp_files::create_frame_artifact(&self.artifact_dir, frame.index)?;
        let (index, width, height) = (frame.index, frame.width, frame.height);
        let rgb = RgbImage::from_raw(width, height, frame.data).ok_or_else(|| {
            CoreError::FrameEncode(format!(
                "frame {index} buffer does not match {width}x{height} rgb24"
            ))
        })?;
        rgb.save_with_format(artifact.path(), ImageFormat::Jpeg)
            .map_err(|e| CoreError::FrameEncode(e.to_string()))?;
        Ok(artifact)
    }

    /// Runs alpr against the artifact, enforcing the per-invocation timeout.
    fn run_recognizer(&self, image_path: &Path) -> CoreResult<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-j")
            .arg("-c")
            .arg(&self.region)
            .arg(image_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::trace!("Running recognizer command: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| command_start_error("alpr", e))?;

        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| command_start_error("alpr", "stdout pipe unavailable"))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| command_start_error("alpr", "stderr pipe unavailable"))?;

        // Drain the pipes off-thread so a chatty recognizer cannot deadlock
        // against a full pipe buffer while we poll for exit.
        let stdout_handle = std::thread::spawn(move || read_to_string_lossy(stdout_pipe));
        let stderr_handle = std::thread::spawn(move || read_to_string_lossy(stderr_pipe));

        match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => {
                let stdout = stdout_handle.join().unwrap_or_default();
                let stderr = stderr_handle.join().unwrap_or_default();
                if !status.success() {
                    return Err(command_failed_error("alpr", status, stderr.trim()));
                }
                Ok(stdout)
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(CoreError::CommandTimeout {
                    tool: "alpr".to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

impl PlateDetector for AlprDetector {
    fn detect(&self, frame: RawFrame) -> DetectionResult {
        let frame_index = frame.index;
        match self.try_detect(frame) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("Detection attempt for frame {} failed: {}", frame_index, e);
                DetectionResult::Degraded(e.to_string())
            }
        }
    }
}

/// Parses recognizer stdout into a detection result.
///
/// Absent, empty, or malformed payloads degrade; a well-formed payload with
/// an empty `results` array is a legitimate empty detection list.
fn parse_detections(stdout: &str) -> DetectionResult {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return DetectionResult::Degraded("recognizer produced no output".to_string());
    }
    match serde_json::from_str::<AlprOutput>(trimmed) {
        Ok(output) => DetectionResult::Detections(output.results),
        Err(e) => DetectionResult::Degraded(format!("unparseable recognizer output: {e}")),
    }
}

fn read_to_string_lossy(mut pipe: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Polls the child until it exits or the timeout elapses.
///
/// Returns `Ok(None)` on timeout; the caller decides whether to kill.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> CoreResult<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        match child
            .try_wait()
            .map_err(|e| command_wait_error("alpr", e))?
        {
            Some(status) => return Ok(Some(status)),
            None if start.elapsed() >= timeout => return Ok(None),
            None => std::thread::sleep(WAIT_POLL_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfigBuilder;
    use tempfile::tempdir;

    fn test_frame(index: u32) -> RawFrame {
        RawFrame {
            index,
            width: 2,
            height: 2,
            data: vec![128; 12],
        }
    }

    #[test]
    fn test_parse_detections_valid_payload() {
        let payload = r#"{
            "version": 2,
            "data_type": "alpr_results",
            "epoch_time": 1717000000,
            "img_width": 1920,
            "results": [
                {"plate": "ABC1234", "confidence": 92.337, "matches_template": 0},
                {"plate": "ABC123", "confidence": 78.5}
            ]
        }"#;
        let result = parse_detections(payload);
        assert_eq!(
            result,
            DetectionResult::Detections(vec![
                PlateCandidate {
                    plate: "ABC1234".to_string(),
                    confidence: 92.337,
                },
                PlateCandidate {
                    plate: "ABC123".to_string(),
                    confidence: 78.5,
                },
            ])
        );
    }

    #[test]
    fn test_parse_detections_empty_results_is_not_degraded() {
        assert_eq!(
            parse_detections(r#"{"results": []}"#),
            DetectionResult::Detections(vec![])
        );
        // Missing results array reads as empty, not as an error.
        assert_eq!(
            parse_detections(r#"{"version": 2}"#),
            DetectionResult::Detections(vec![])
        );
    }

    #[test]
    fn test_parse_detections_degrades_on_bad_payloads() {
        assert!(matches!(
            parse_detections(""),
            DetectionResult::Degraded(_)
        ));
        assert!(matches!(
            parse_detections("   \n"),
            DetectionResult::Degraded(_)
        ));
        assert!(matches!(
            parse_detections("error: no such file"),
            DetectionResult::Degraded(_)
        ));
        assert!(matches!(
            parse_detections(r#"{"results": [{"plate": "ABC"}]}"#),
            DetectionResult::Degraded(_)
        ));
        assert!(matches!(
            parse_detections(r#"{"results": "nope"}"#),
            DetectionResult::Degraded(_)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_wait_with_timeout_expires() {
        let mut child = Command::new("sleep")
            .arg("5")
            .spawn()
            .expect("spawn sleep");
        let waited = wait_with_timeout(&mut child, Duration::from_millis(200)).unwrap();
        assert!(waited.is_none());
        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    #[cfg(unix)]
    fn test_wait_with_timeout_returns_status() {
        let mut child = Command::new("sh")
            .args(["-c", "exit 3"])
            .spawn()
            .expect("spawn sh");
        let status = wait_with_timeout(&mut child, Duration::from_secs(5))
            .unwrap()
            .expect("process should have exited");
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_detect_degrades_when_binary_is_missing_and_cleans_artifacts() {
        let dir = tempdir().unwrap();
        let config = JobConfigBuilder::new()
            .temp_dir(dir.path().to_path_buf())
            .build();
        let detector =
            AlprDetector::with_binary(PathBuf::from("/no/such/alpr-binary"), &config);

        let result = detector.detect(test_frame(7));
        assert!(matches!(result, DetectionResult::Degraded(_)));

        // The JPEG artifact must not survive the failed attempt.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "leaked artifacts: {leftovers:?}");
    }

    #[test]
    #[cfg(unix)]
    fn test_detect_degrades_on_unparseable_output_and_cleans_artifacts() {
        let dir = tempdir().unwrap();
        let config = JobConfigBuilder::new()
            .temp_dir(dir.path().to_path_buf())
            .build();
        // `echo -j -c eu <artifact>` exits zero with non-JSON stdout.
        let detector = AlprDetector::with_binary(PathBuf::from("echo"), &config);

        match detector.detect(test_frame(0)) {
            DetectionResult::Degraded(diag) => {
                assert!(diag.contains("unparseable"), "unexpected diagnostic: {diag}");
            }
            other => panic!("expected degraded result, got {other:?}"),
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "leaked artifacts: {leftovers:?}");
    }

    #[test]
    fn test_detect_degrades_on_undersized_frame_buffer() {
        let dir = tempdir().unwrap();
        let config = JobConfigBuilder::new()
            .temp_dir(dir.path().to_path_buf())
            .build();
        let detector = AlprDetector::with_binary(PathBuf::from("echo"), &config);

        let bogus = RawFrame {
            index: 3,
            width: 100,
            height: 100,
            data: vec![0; 4],
        };
        assert!(matches!(
            detector.detect(bogus),
            DetectionResult::Degraded(_)
        ));
    }
}
