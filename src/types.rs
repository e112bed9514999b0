//! Reelcheck Core Type Definitions
//!
//! Fundamental types shared across the engine: declared video metadata,
//! decoded frames, and the decoded-video container the checks analyze.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{QaError, QaResult};

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Declared Metadata
// =============================================================================

/// Metadata declared by the generation service for a candidate video.
///
/// Only `duration_seconds` is interpreted by the engine; any further
/// declared fields are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Expected duration in seconds
    pub duration_seconds: TimeSec,
    /// Additional declared fields, passed through as-is
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl VideoMetadata {
    /// Creates metadata with just an expected duration
    pub fn with_duration(duration_seconds: TimeSec) -> Self {
        Self {
            duration_seconds,
            extra: HashMap::new(),
        }
    }

    /// Validates caller-supplied metadata.
    ///
    /// The expected duration must be a finite, positive number of seconds.
    pub fn validate(&self) -> QaResult<()> {
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(QaError::InvalidInput(format!(
                "declared duration_seconds must be finite and positive, got {}",
                self.duration_seconds
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Frames
// =============================================================================

/// A single decoded frame in packed RGB24 layout (3 bytes per pixel, row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed RGB24 pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Creates a frame from raw RGB24 data
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> QaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(QaError::Decode(format!(
                "frame data length {} does not match {}x{} RGB24 ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a frame filled with a single color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// RGB components of the pixel at (x, y)
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Grayscale intensity plane (Rec. 601 luma), one f64 per pixel
    pub fn luma_plane(&self) -> Vec<f64> {
        self.data
            .chunks_exact(3)
            .map(|px| 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64)
            .collect()
    }

    /// Per-channel mean intensity (r, g, b)
    pub fn channel_means(&self) -> (f64, f64, f64) {
        let pixels = (self.width as usize * self.height as usize).max(1) as f64;
        let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
        for px in self.data.chunks_exact(3) {
            r += px[0] as f64;
            g += px[1] as f64;
            b += px[2] as f64;
        }
        (r / pixels, g / pixels, b / pixels)
    }
}

// =============================================================================
// Decoded Video
// =============================================================================

/// A fully decoded video stream held in memory
#[derive(Debug, Clone)]
pub struct DecodedVideo {
    /// Stream width in pixels
    pub width: u32,
    /// Stream height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Decoded frames in presentation order
    pub frames: Vec<Frame>,
}

impl DecodedVideo {
    /// Number of decoded frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Measured duration in seconds (`frame_count / fps`, 0 when fps is invalid)
    pub fn duration_seconds(&self) -> TimeSec {
        if self.fps > 0.0 {
            self.frames.len() as f64 / self.fps
        } else {
            0.0
        }
    }

    /// The middle frame of the stream, if any
    pub fn middle_frame(&self) -> Option<&Frame> {
        self.frames.get(self.frames.len() / 2)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // VideoMetadata Tests
    // ========================================================================

    #[test]
    fn test_metadata_validate_ok() {
        assert!(VideoMetadata::with_duration(30.0).validate().is_ok());
    }

    #[test]
    fn test_metadata_validate_rejects_bad_duration() {
        assert!(VideoMetadata::with_duration(0.0).validate().is_err());
        assert!(VideoMetadata::with_duration(-1.0).validate().is_err());
        assert!(VideoMetadata::with_duration(f64::NAN).validate().is_err());
        assert!(VideoMetadata::with_duration(f64::INFINITY)
            .validate()
            .is_err());
    }

    #[test]
    fn test_metadata_extra_fields_roundtrip() {
        let json = r#"{"duration_seconds": 30.0, "generator": "veo"}"#;
        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.duration_seconds, 30.0);
        assert_eq!(
            meta.extra.get("generator").and_then(|v| v.as_str()),
            Some("veo")
        );
    }

    // ========================================================================
    // Frame Tests
    // ========================================================================

    #[test]
    fn test_frame_new_validates_length() {
        assert!(Frame::new(2, 2, vec![0; 12]).is_ok());
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn test_frame_rgb_at() {
        let mut data = vec![0u8; 12];
        data[3..6].copy_from_slice(&[10, 20, 30]); // pixel (1, 0)
        let frame = Frame::new(2, 2, data).unwrap();
        assert_eq!(frame.rgb_at(1, 0), [10, 20, 30]);
        assert_eq!(frame.rgb_at(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_frame_luma_plane() {
        let frame = Frame::filled(2, 2, [100, 100, 100]);
        let luma = frame.luma_plane();
        assert_eq!(luma.len(), 4);
        for v in luma {
            assert!((v - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frame_channel_means() {
        let frame = Frame::filled(4, 4, [200, 100, 50]);
        let (r, g, b) = frame.channel_means();
        assert_eq!(r, 200.0);
        assert_eq!(g, 100.0);
        assert_eq!(b, 50.0);
    }

    // ========================================================================
    // DecodedVideo Tests
    // ========================================================================

    #[test]
    fn test_decoded_video_duration() {
        let video = DecodedVideo {
            width: 2,
            height: 2,
            fps: 30.0,
            frames: vec![Frame::filled(2, 2, [0, 0, 0]); 90],
        };
        assert_eq!(video.frame_count(), 90);
        assert!((video.duration_seconds() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_decoded_video_zero_fps_duration() {
        let video = DecodedVideo {
            width: 2,
            height: 2,
            fps: 0.0,
            frames: vec![Frame::filled(2, 2, [0, 0, 0])],
        };
        assert_eq!(video.duration_seconds(), 0.0);
    }

    #[test]
    fn test_decoded_video_middle_frame() {
        let video = DecodedVideo {
            width: 1,
            height: 1,
            fps: 1.0,
            frames: vec![
                Frame::filled(1, 1, [1, 1, 1]),
                Frame::filled(1, 1, [2, 2, 2]),
                Frame::filled(1, 1, [3, 3, 3]),
            ],
        };
        assert_eq!(video.middle_frame().unwrap().rgb_at(0, 0), [2, 2, 2]);

        let empty = DecodedVideo {
            width: 1,
            height: 1,
            fps: 1.0,
            frames: vec![],
        };
        assert!(empty.middle_frame().is_none());
    }
}
