//! Video Decoding Interface
//!
//! The engine analyzes decoded frames; how bytes become frames is behind
//! the [`VideoDecoder`] trait so embedders can plug in a real container
//! decoder. Decoding is fully in-memory, no temp files.
//!
//! A minimal raw RGB24 frame-stream codec ships as the reference
//! implementation; it is also what the test suite feeds the engine.

use crate::error::{QaError, QaResult};
use crate::types::{DecodedVideo, Frame};

/// Decodes raw video bytes into frames
pub trait VideoDecoder: Send + Sync {
    /// Decodes the full byte buffer into an in-memory frame stream
    fn decode(&self, data: &[u8]) -> QaResult<DecodedVideo>;
}

// =============================================================================
// Raw RGB24 reference codec
// =============================================================================

/// Magic bytes identifying the raw frame-stream format
const RAW_MAGIC: &[u8; 4] = b"RVID";

/// Header length: magic + width + height + fps(milli) + frame count, u32 LE each
const RAW_HEADER_LEN: usize = 4 + 4 * 4;

/// Decoder for an uncompressed RGB24 frame stream.
///
/// Layout: `"RVID"`, then width, height, fps in millihertz, and frame
/// count as little-endian u32, followed by `frame_count` packed RGB24
/// frames.
#[derive(Debug, Default)]
pub struct RawRgbDecoder;

impl RawRgbDecoder {
    /// Creates a new raw decoder
    pub fn new() -> Self {
        Self
    }

    /// Encodes a decoded video back into the raw frame-stream format
    pub fn encode(video: &DecodedVideo) -> Vec<u8> {
        let frame_len = video.width as usize * video.height as usize * 3;
        let mut out = Vec::with_capacity(RAW_HEADER_LEN + frame_len * video.frames.len());
        out.extend_from_slice(RAW_MAGIC);
        out.extend_from_slice(&video.width.to_le_bytes());
        out.extend_from_slice(&video.height.to_le_bytes());
        out.extend_from_slice(&((video.fps * 1000.0).round() as u32).to_le_bytes());
        out.extend_from_slice(&(video.frames.len() as u32).to_le_bytes());
        for frame in &video.frames {
            out.extend_from_slice(&frame.data);
        }
        out
    }
}

impl VideoDecoder for RawRgbDecoder {
    fn decode(&self, data: &[u8]) -> QaResult<DecodedVideo> {
        if data.len() < RAW_HEADER_LEN {
            return Err(QaError::Decode(format!(
                "buffer too short for header: {} bytes",
                data.len()
            )));
        }
        if &data[0..4] != RAW_MAGIC {
            return Err(QaError::Decode("bad magic, not a raw frame stream".to_string()));
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };
        let width = read_u32(4);
        let height = read_u32(8);
        let fps = read_u32(12) as f64 / 1000.0;
        let frame_count = read_u32(16) as usize;

        if width == 0 || height == 0 {
            return Err(QaError::Decode(format!(
                "invalid frame dimensions {}x{}",
                width, height
            )));
        }

        let frame_len = width as usize * height as usize * 3;
        let expected = RAW_HEADER_LEN + frame_len * frame_count;
        if data.len() < expected {
            return Err(QaError::Decode(format!(
                "truncated stream: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }

        let mut frames = Vec::with_capacity(frame_count);
        for i in 0..frame_count {
            let start = RAW_HEADER_LEN + i * frame_len;
            frames.push(Frame::new(
                width,
                height,
                data[start..start + frame_len].to_vec(),
            )?);
        }

        Ok(DecodedVideo {
            width,
            height,
            fps,
            frames,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> DecodedVideo {
        DecodedVideo {
            width: 4,
            height: 2,
            fps: 24.0,
            frames: vec![
                Frame::filled(4, 2, [255, 0, 0]),
                Frame::filled(4, 2, [0, 255, 0]),
            ],
        }
    }

    #[test]
    fn test_raw_roundtrip() {
        let video = sample_video();
        let bytes = RawRgbDecoder::encode(&video);
        let decoded = RawRgbDecoder::new().decode(&bytes).unwrap();

        assert_eq!(decoded.width, 4);
        assert_eq!(decoded.height, 2);
        assert!((decoded.fps - 24.0).abs() < 1e-9);
        assert_eq!(decoded.frame_count(), 2);
        assert_eq!(decoded.frames[0].rgb_at(0, 0), [255, 0, 0]);
        assert_eq!(decoded.frames[1].rgb_at(3, 1), [0, 255, 0]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let decoder = RawRgbDecoder::new();
        assert!(decoder.decode(b"not a video").is_err());
        assert!(decoder.decode(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = RawRgbDecoder::encode(&sample_video());
        bytes[0] = b'X';
        assert!(RawRgbDecoder::new().decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_stream() {
        let bytes = RawRgbDecoder::encode(&sample_video());
        let truncated = &bytes[..bytes.len() - 5];
        assert!(RawRgbDecoder::new().decode(truncated).is_err());
    }

    #[test]
    fn test_decode_zero_frames_is_valid_stream() {
        // A structurally valid stream with no frames decodes; the engine
        // maps the empty stream to the corrupted-file path.
        let video = DecodedVideo {
            width: 4,
            height: 2,
            fps: 24.0,
            frames: vec![],
        };
        let bytes = RawRgbDecoder::encode(&video);
        let decoded = RawRgbDecoder::new().decode(&bytes).unwrap();
        assert_eq!(decoded.frame_count(), 0);
    }
}
