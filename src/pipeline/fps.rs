use std::time::Instant;

/// Frames-per-second estimate refreshed once every `window` frames.
#[derive(Debug)]
pub struct FrameRateMeter {
    window: u32,
    frames: u32,
    window_start: Instant,
    fps: f32,
}

impl FrameRateMeter {
    pub fn new(window: u32, now: Instant) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            window_start: now,
            fps: 0.0,
        }
    }

    /// Counts one processed frame and returns the current estimate.
    pub fn tick(&mut self, now: Instant) -> f32 {
        self.frames += 1;
        if self.frames >= self.window {
            let elapsed = now.saturating_duration_since(self.window_start).as_secs_f32();
            if elapsed > 0.0 {
                self.fps = self.frames as f32 / elapsed;
            }
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn estimate_only_changes_at_window_boundary() {
        let start = Instant::now();
        let mut meter = FrameRateMeter::new(30, start);
        for i in 1..30 {
            let fps = meter.tick(start + Duration::from_millis(i * 10));
            assert_eq!(fps, 0.0);
        }
        // 30 frames over one second.
        let fps = meter.tick(start + Duration::from_secs(1));
        assert_relative_eq!(fps, 30.0, epsilon = 1e-3);
    }

    #[test]
    fn each_window_measures_from_previous_boundary() {
        let start = Instant::now();
        let mut meter = FrameRateMeter::new(30, start);
        for _ in 0..30 {
            meter.tick(start + Duration::from_secs(1));
        }
        let second_window = start + Duration::from_secs(3);
        for _ in 0..30 {
            meter.tick(second_window);
        }
        assert_relative_eq!(meter.fps(), 15.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_elapsed_keeps_previous_estimate() {
        let start = Instant::now();
        let mut meter = FrameRateMeter::new(2, start);
        let boundary = start + Duration::from_secs(1);
        meter.tick(boundary);
        assert_relative_eq!(meter.tick(boundary), 2.0, epsilon = 1e-3);
        // A second window closing at the same instant has no elapsed time to divide by.
        meter.tick(boundary);
        assert_relative_eq!(meter.tick(boundary), 2.0, epsilon = 1e-3);
    }
}
