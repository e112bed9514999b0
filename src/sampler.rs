//! Frame Sampler
//!
//! Selects an evenly spaced subset of frame indices for analysis so
//! checks never have to touch every frame of a long video.

use crate::error::{QaError, QaResult};

/// Returns `min(requested, total_frames)` evenly spaced, ascending,
/// deduplicated frame indices over `[0, total_frames - 1]`.
///
/// The first and last frame are always included when at least two
/// indices are returned. Fails with `InvalidInput` when the video has
/// no frames; the caller maps this to the corrupted-file path.
pub fn sample_indices(total_frames: usize, requested: usize) -> QaResult<Vec<usize>> {
    if total_frames == 0 {
        return Err(QaError::InvalidInput(
            "cannot sample frames from a zero-frame video".to_string(),
        ));
    }

    let count = requested.min(total_frames);
    match count {
        0 => Ok(Vec::new()),
        1 => Ok(vec![0]),
        _ => {
            let last = (total_frames - 1) as f64;
            let step = last / (count - 1) as f64;
            let mut indices = Vec::with_capacity(count);
            for i in 0..count {
                let idx = (i as f64 * step).round() as usize;
                // Rounding can collapse neighbors when total is small
                if indices.last() != Some(&idx) {
                    indices.push(idx);
                }
            }
            Ok(indices)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frames_is_invalid_input() {
        let err = sample_indices(0, 5).unwrap_err();
        assert!(matches!(err, QaError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_requested_is_empty() {
        assert!(sample_indices(100, 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(sample_indices(100, 1).unwrap(), vec![0]);
        assert_eq!(sample_indices(1, 5).unwrap(), vec![0]);
    }

    #[test]
    fn test_even_spacing_includes_endpoints() {
        let indices = sample_indices(900, 5).unwrap();
        assert_eq!(indices, vec![0, 225, 450, 674, 899]);
    }

    #[test]
    fn test_requested_exceeding_total_returns_all() {
        let indices = sample_indices(4, 10).unwrap();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_indices_ascending_and_deduplicated() {
        for total in [1usize, 2, 3, 5, 7, 30, 899] {
            let indices = sample_indices(total, 5).unwrap();
            assert!(indices.windows(2).all(|w| w[0] < w[1]), "total={total}");
            assert!(indices.iter().all(|&i| i < total), "total={total}");
            assert!(indices.len() <= 5.min(total));
        }
    }
}
