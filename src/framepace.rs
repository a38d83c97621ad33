use std::time::{Duration, Instant};

use log::{debug, warn};

/// Measures frame times and periodically logs them with the live count
pub struct FrameStats {
    last_frame: Instant,
    window_start: Instant,
    frames: u32,
    slowest: Duration,
    interval: Option<Duration>,
}

impl FrameStats {
    pub fn new(interval_secs: f32) -> Self {
        let now = Instant::now();
        let interval = if interval_secs > f32::EPSILON {
            match Duration::try_from_secs_f32(interval_secs) {
                Ok(interval) => Some(interval),
                Err(err) => {
                    warn!("Frame statistics disabled, bad interval {interval_secs}: {err}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            last_frame: now,
            window_start: now,
            frames: 0,
            slowest: Duration::ZERO,
            interval,
        }
    }

    /// Forget time spent stopped so it doesn't count as one long frame
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.window_start = now;
        self.frames = 0;
        self.slowest = Duration::ZERO;
    }

    pub fn end_frame(&mut self, live_particles: usize) {
        let now = Instant::now();
        self.slowest = self.slowest.max(now - self.last_frame);
        self.last_frame = now;
        self.frames += 1;

        let Some(interval) = self.interval else {
            return;
        };
        let elapsed = now - self.window_start;
        if elapsed >= interval {
            debug!(
                "FPS {:.1}, slowest frame {:.2}ms, {} live particles",
                self.frames as f32 / elapsed.as_secs_f32(),
                self.slowest.as_secs_f32() * 1000.0,
                live_particles,
            );
            self.window_start = now;
            self.frames = 0;
            self.slowest = Duration::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parsing() {
        assert_eq!(FrameStats::new(5.0).interval, Some(Duration::from_secs(5)));
        assert_eq!(FrameStats::new(0.0).interval, None);
        assert_eq!(FrameStats::new(-1.0).interval, None);
        assert_eq!(FrameStats::new(1e20).interval, None);
        assert_eq!(FrameStats::new(f32::INFINITY).interval, None);
        assert_eq!(FrameStats::new(f32::NAN).interval, None);
    }

    #[test]
    fn frames_are_counted_until_the_interval_elapses() {
        let mut stats = FrameStats::new(3600.0);
        stats.end_frame(10);
        stats.end_frame(10);
        assert_eq!(stats.frames, 2);

        stats.reset();
        assert_eq!(stats.frames, 0);
        assert_eq!(stats.slowest, Duration::ZERO);
    }
}
