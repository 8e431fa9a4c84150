// ============================================================================
// platescan-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// This module encapsulates interactions with the external command-line tools
// the pipeline consumes: ffmpeg/ffprobe for frame decoding and media probing,
// and alpr for plate recognition. It provides abstractions through traits and
// concrete implementations to make these external dependencies testable.
//
// KEY COMPONENTS:
// - PlateDetector trait and the AlprDetector subprocess implementation
// - FrameDecoder for streaming raw frames out of ffmpeg
// - probe_video for the open-failure check via ffprobe
// - Dependency checking functions
//
// AI-ASSISTANT-INFO: External tool interactions and abstractions

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult, command_start_error};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains the plate recognition trait and its alpr subprocess implementation
pub mod alpr;

/// Contains the ffmpeg-backed raw frame stream
pub mod decoder;

/// Contains the ffprobe-backed media probe
pub mod probe;

// ============================================================================
// RE-EXPORTS
// ============================================================================

// ----- Plate Recognition -----
pub use alpr::{AlprDetector, DetectionResult, PlateCandidate, PlateDetector};

// ----- Frame Decoding -----
pub use decoder::{FrameDecoder, RawFrame};

// ----- Media Probing -----
pub use probe::{VideoProperties, probe_video};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Attempts to run the specified command with a `-version` argument to
/// verify that it exists and can be started. Any exit status counts as
/// found; only a missing binary or a spawn failure is an error.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                log::warn!("Dependency '{}' not found.", cmd_name);
                Err(CoreError::DependencyNotFound(cmd_name.to_string()))
            } else {
                log::error!("Failed to start dependency check for '{}': {}", cmd_name, e);
                Err(command_start_error(cmd_name, e))
            }
        }
    }
}
