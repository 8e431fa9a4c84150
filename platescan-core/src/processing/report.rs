//! Detection accumulation and the final report.
//!
//! Detections are appended in encounter order as frames are absorbed; the
//! same physical plate seen in several frames yields several independent
//! entries. No deduplication, no sorting by confidence.

use crate::external::alpr::DetectionResult;
use serde::Serialize;

/// One recognized plate candidate, stamped with its source frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    /// Recognized plate text, never empty
    pub plate: String,
    /// Recognizer confidence, passed through verbatim
    pub confidence: f32,
    /// Index of the sampled frame that produced this detection
    pub frame: u32,
}

/// The aggregated output of one scanning job.
///
/// Serializes to the wire shape `{"plates": [...]}`. An empty report is a
/// valid, non-error outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlateReport {
    /// Detections in accumulation order
    pub plates: Vec<Detection>,
}

/// Accumulator for per-frame detection results.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    plates: Vec<Detection>,
    degraded_frames: u32,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one frame's detection result.
    ///
    /// Candidates are copied verbatim and stamped with the frame index.
    /// A degraded result contributes zero detections; its diagnostic is
    /// logged and counted but never escalates.
    pub fn absorb(&mut self, frame_index: u32, result: DetectionResult) {
        match result {
            DetectionResult::Detections(candidates) => {
                for candidate in candidates {
                    if candidate.plate.is_empty() {
                        log::warn!(
                            "Dropping empty plate text from frame {} (confidence {})",
                            frame_index,
                            candidate.confidence
                        );
                        continue;
                    }
                    self.plates.push(Detection {
                        plate: candidate.plate,
                        confidence: candidate.confidence,
                        frame: frame_index,
                    });
                }
            }
            DetectionResult::Degraded(diagnostic) => {
                self.degraded_frames += 1;
                log::warn!("Frame {} degraded: {}", frame_index, diagnostic);
            }
        }
    }

    /// Number of frames absorbed as degraded so far.
    pub fn degraded_frames(&self) -> u32 {
        self.degraded_frames
    }

    /// Snapshots the accumulator into the final report.
    pub fn finalize(self) -> PlateReport {
        PlateReport {
            plates: self.plates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::alpr::PlateCandidate;

    fn candidate(plate: &str, confidence: f32) -> PlateCandidate {
        PlateCandidate {
            plate: plate.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_absorb_stamps_frame_and_keeps_order() {
        let mut builder = ReportBuilder::new();
        builder.absorb(
            0,
            DetectionResult::Detections(vec![candidate("AAA111", 90.0)]),
        );
        builder.absorb(10, DetectionResult::Detections(vec![]));
        builder.absorb(
            20,
            DetectionResult::Detections(vec![
                candidate("AAA111", 85.0),
                candidate("BBB222", 60.0),
            ]),
        );

        let report = builder.finalize();
        let frames: Vec<u32> = report.plates.iter().map(|d| d.frame).collect();
        assert_eq!(frames, vec![0, 20, 20]);
        // Same plate in different frames stays as independent entries.
        assert_eq!(report.plates[0].plate, "AAA111");
        assert_eq!(report.plates[1].plate, "AAA111");
        assert_eq!(report.plates[2].plate, "BBB222");
    }

    #[test]
    fn test_degraded_counts_but_adds_nothing() {
        let mut builder = ReportBuilder::new();
        builder.absorb(0, DetectionResult::Degraded("timeout".to_string()));
        builder.absorb(10, DetectionResult::Degraded("bad output".to_string()));
        assert_eq!(builder.degraded_frames(), 2);

        let report = builder.finalize();
        assert!(report.plates.is_empty());
    }

    #[test]
    fn test_empty_plate_text_is_dropped() {
        let mut builder = ReportBuilder::new();
        builder.absorb(
            0,
            DetectionResult::Detections(vec![candidate("", 99.0), candidate("XYZ789", 70.0)]),
        );
        let report = builder.finalize();
        assert_eq!(report.plates.len(), 1);
        assert_eq!(report.plates[0].plate, "XYZ789");
    }

    #[test]
    fn test_report_wire_shape() {
        let mut builder = ReportBuilder::new();
        builder.absorb(
            30,
            DetectionResult::Detections(vec![candidate("ABC1234", 88.5)]),
        );
        let report = builder.finalize();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "plates": [
                    {"plate": "ABC1234", "confidence": 88.5, "frame": 30}
                ]
            })
        );
    }

    #[test]
    fn test_empty_report_serializes_to_empty_list() {
        let report = ReportBuilder::new().finalize();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value, serde_json::json!({"plates": []}));
    }
}
