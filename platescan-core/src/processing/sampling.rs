//! Frame sampling policy.
//!
//! Only frames whose index is a multiple of the stride are handed to the
//! recognizer, and sampling stops before the frame cap. Intervening frames
//! are decoded upstream (unavoidable with sequential codecs) but discarded
//! here without further materialization.

use crate::error::CoreResult;
use crate::external::decoder::RawFrame;

/// Filters a decoded frame stream down to the sampled set.
///
/// The sampled indices are exactly `{0, stride, 2*stride, ...}` below
/// `max_frames`. Stream errors pass through untouched so the orchestrator
/// can distinguish an open failure from an empty video.
pub fn sample_frames<I>(
    frames: I,
    stride: u32,
    max_frames: u32,
) -> impl Iterator<Item = CoreResult<RawFrame>>
where
    I: Iterator<Item = CoreResult<RawFrame>>,
{
    frames
        .take_while(move |item| match item {
            Ok(frame) => frame.index < max_frames,
            Err(_) => true,
        })
        .filter(move |item| match item {
            Ok(frame) => frame.index % stride == 0,
            Err(_) => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn synthetic_frames(count: u32) -> impl Iterator<Item = CoreResult<RawFrame>> {
        (0..count).map(|index| {
            Ok(RawFrame {
                index,
                width: 1,
                height: 1,
                data: vec![0, 0, 0],
            })
        })
    }

    fn sampled_indices(count: u32, stride: u32, max_frames: u32) -> Vec<u32> {
        sample_frames(synthetic_frames(count), stride, max_frames)
            .map(|item| item.unwrap().index)
            .collect()
    }

    #[test]
    fn test_long_video_stops_at_cap() {
        // 3000 decodable frames, stride 10, cap 300: exactly 30 samples.
        let indices = sampled_indices(3000, 10, 300);
        assert_eq!(indices.len(), 30);
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&290));
        assert!(indices.iter().all(|i| i % 10 == 0 && *i < 300));
    }

    #[test]
    fn test_short_video_exhausts_before_cap() {
        let indices = sampled_indices(50, 10, 300);
        assert_eq!(indices, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_non_divisible_stride() {
        let indices = sampled_indices(100, 7, 30);
        assert_eq!(indices, vec![0, 7, 14, 21, 28]);
    }

    #[test]
    fn test_stride_one_takes_every_frame_below_cap() {
        let indices = sampled_indices(10, 1, 4);
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_errors_pass_through() {
        let stream = vec![Err(CoreError::VideoOpen("corrupt".to_string()))];
        let mut sampled = sample_frames(stream.into_iter(), 10, 300);
        assert!(matches!(
            sampled.next(),
            Some(Err(CoreError::VideoOpen(_)))
        ));
        assert!(sampled.next().is_none());
    }
}
