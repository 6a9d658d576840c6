use crate::shared::constants::DECAY_TIME_FRAMES;

/// Colour of a box that was just confirmed by a detection (red).
pub const HOT_COLOR: [f64; 3] = [255.0, 0.0, 0.0];

/// Colour of a box that has gone unconfirmed for the whole decay window (yellow).
pub const COLD_COLOR: [f64; 3] = [255.0, 255.0, 0.0];

/// RGB box colour for a face last confirmed `frames_since_update` frames ago.
///
/// Linear blend from [`HOT_COLOR`] to [`COLD_COLOR`] over
/// [`DECAY_TIME_FRAMES`] frames, clamped afterwards.
pub fn box_color(frames_since_update: usize) -> [f64; 3] {
    let cold = frames_since_update.min(DECAY_TIME_FRAMES) as f64 / DECAY_TIME_FRAMES as f64;
    let hot = 1.0 - cold;
    [
        hot * HOT_COLOR[0] + cold * COLD_COLOR[0],
        hot * HOT_COLOR[1] + cold * COLD_COLOR[1],
        hot * HOT_COLOR[2] + cold * COLD_COLOR[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_fresh_box_is_hot() {
        assert_eq!(box_color(0), HOT_COLOR);
    }

    #[test]
    fn test_halfway_is_even_blend() {
        let c = box_color(5);
        assert_relative_eq!(c[0], 255.0);
        assert_relative_eq!(c[1], 127.5);
        assert_relative_eq!(c[2], 0.0);
    }

    #[rstest]
    #[case::at_window(10)]
    #[case::past_window(11)]
    #[case::long_stale(1_000)]
    fn test_stale_box_is_cold(#[case] frames: usize) {
        assert_eq!(box_color(frames), COLD_COLOR);
    }

    #[test]
    fn test_green_rises_monotonically() {
        let greens: Vec<f64> = (0..=10).map(|n| box_color(n)[1]).collect();
        assert!(greens.windows(2).all(|w| w[0] < w[1]));
    }
}
