//! FFmpeg-backed raw frame stream.
//!
//! Spawns ffmpeg via ffmpeg-sidecar with rawvideo/rgb24 piped output and
//! yields every decoded frame with its sequential index. The decoder owns
//! the child process exclusively; dropping it kills and reaps the child, so
//! the handle is released on every exit path.

use crate::error::{CoreError, CoreResult, command_start_error};
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use std::path::Path;

/// One decoded frame: a packed rgb24 buffer plus its sequential index.
///
/// Owned exclusively by the detection attempt that consumes it and released
/// immediately afterwards; frames are never retained across attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    /// Zero-based sequential frame index
    pub index: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed rgb24 pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

/// Streaming frame decoder over a spawned ffmpeg process.
///
/// Iterates `CoreResult<RawFrame>`. If ffmpeg produces no frames at all the
/// stream yields exactly one `Err(CoreError::VideoOpen)`, the open-failure
/// signal. A decode anomaly after at least one good frame ends the stream
/// with a warning instead; the job continues with the frames it got.
pub struct FrameDecoder {
    child: FfmpegChild,
    events: FfmpegIterator,
    frames_seen: u32,
    last_error: Option<String>,
    finished: bool,
}

impl FrameDecoder {
    /// Spawns ffmpeg for the given video and returns the frame stream.
    pub fn open(input_path: &Path) -> CoreResult<Self> {
        let mut cmd = FfmpegCommand::new();
        cmd.input(input_path.to_string_lossy().as_ref());
        cmd.rawvideo();

        log::debug!("Running frame decode command: {:?}", cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| command_start_error("ffmpeg", e))?;
        let events = child
            .iter()
            .map_err(|e| command_start_error("ffmpeg", e))?;

        Ok(Self {
            child,
            events,
            frames_seen: 0,
            last_error: None,
            finished: false,
        })
    }
}

impl Iterator for FrameDecoder {
    type Item = CoreResult<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let index = self.frames_seen;
                    self.frames_seen += 1;
                    return Some(Ok(RawFrame {
                        index,
                        width: frame.width,
                        height: frame.height,
                        data: frame.data,
                    }));
                }
                FfmpegEvent::Error(err) => {
                    self.last_error = Some(err);
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                    self.last_error = Some(line);
                }
                _ => {}
            }
        }

        self.finished = true;
        if self.frames_seen == 0 {
            let diagnostic = self
                .last_error
                .take()
                .unwrap_or_else(|| "ffmpeg produced no frames".to_string());
            return Some(Err(CoreError::VideoOpen(diagnostic)));
        }
        if let Some(err) = self.last_error.take() {
            log::warn!(
                "Frame decoding ended early after {} frames: {}",
                self.frames_seen,
                err
            );
        }
        None
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        // The child may already have exited; killing is best-effort, reaping
        // must still happen to avoid a zombie.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
