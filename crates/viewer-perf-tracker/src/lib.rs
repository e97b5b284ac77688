use std::{collections::VecDeque, time::Duration};
use web_time::Instant;

/// Rolling window of the most recent frame times.
#[derive(Debug)]
pub struct PerformanceTracker {
    frame_time_samples: usize,
    frame_time: VecDeque<Duration>,
    frame_time_sum: Duration,
    frame_count: u64,
}

impl PerformanceTracker {
    pub fn new(frame_time_samples: usize) -> Self {
        Self {
            frame_time_samples: frame_time_samples.max(1),
            frame_time: VecDeque::new(),
            frame_time_sum: Duration::ZERO,
            frame_count: 0,
        }
    }

    pub fn frame_time(&self) -> &VecDeque<Duration> {
        &self.frame_time
    }

    /// Frames recorded since creation, including those out of the window.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn avg_frame_time(&self) -> Option<Duration> {
        if self.frame_time.is_empty() {
            None
        } else {
            Some(self.frame_time_sum / self.frame_time.len() as u32)
        }
    }

    pub fn last_frame_time(&self) -> Option<&Duration> {
        self.frame_time.back()
    }

    pub fn add_sample(&mut self, frame_time: Duration) {
        self.frame_time.push_back(frame_time);
        self.frame_time_sum += frame_time;
        while self.frame_time.len() > self.frame_time_samples {
            if let Some(first_frame_time) = self.frame_time.pop_front() {
                self.frame_time_sum -= first_frame_time;
            }
        }
        self.frame_count += 1;
    }

    pub fn fps(&self) -> Option<f32> {
        self.avg_frame_time()
            .filter(|avg| !avg.is_zero())
            .map(|avg| 1.0 / avg.as_secs_f32())
    }
}

/// Measures wall time between consecutive frames.
#[derive(Debug)]
pub struct FrameTimer {
    last: Instant,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time since the previous call, or since creation.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

/// Fires once every `interval` of accumulated time.
#[derive(Debug)]
pub struct ReportInterval {
    interval: Duration,
    elapsed: Duration,
}

impl ReportInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
        }
    }

    /// Accumulate `delta`. Returns true when a full interval has passed; the
    /// remainder carries over to the next one.
    pub fn advance(&mut self, delta: Duration) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return false;
        }
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
        }
        true
    }
}
