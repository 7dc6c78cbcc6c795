//! Time management utilities

/// Turns presentation timestamps into per-frame deltas
///
/// Timestamps are milliseconds on the host's presentation clock, as delivered
/// to an animation-frame callback.
#[derive(Debug, Default)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Create a new clock that has not seen a frame yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `timestamp_ms` and return the delta in seconds
    ///
    /// The first tick and any tick going backwards report a zero delta.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        self.delta_time = match self.last_timestamp {
            Some(last) if timestamp_ms >= last => ((timestamp_ms - last) / 1000.0) as f32,
            _ => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time in seconds
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_tick_has_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(1234.0), 0.0);
        assert_relative_eq!(clock.tick(1250.0), 0.016, epsilon = 1e-6);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_backwards_timestamp_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick(100.0);
        assert_eq!(clock.tick(50.0), 0.0);
        assert_relative_eq!(clock.tick(150.0), 0.1, epsilon = 1e-6);
        assert_relative_eq!(clock.total_time(), 0.1, epsilon = 1e-6);
    }
}
