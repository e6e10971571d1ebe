//! Time management utilities

use std::time::{Duration, Instant};

/// Frame timer with a fixed-timestep gate
///
/// Wall-clock time is accumulated into a budget; [`Timer::consume_frame`]
/// spends one fixed frame from it at a time. The engine runs simulation ticks
/// while the gate stays open and renders once afterwards.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    passed_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            passed_time: 0.0,
            frame_count: 0,
        }
    }

    /// Measure the wall-clock time since the previous call and accumulate it
    pub fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed.as_secs_f32());
    }

    /// Accumulate an externally measured `elapsed` time in seconds
    pub fn advance(&mut self, elapsed: f32) {
        let elapsed = elapsed.max(0.0);
        self.delta_time = elapsed;
        self.total_time += elapsed;
        self.passed_time += elapsed;
    }

    /// Spend one frame of `frame_time` seconds from the accumulated budget.
    ///
    /// Returns `true` when enough time had accumulated.
    pub fn consume_frame(&mut self, frame_time: f32) -> bool {
        if self.passed_time >= frame_time {
            self.passed_time -= frame_time;
            self.frame_count += 1;
            true
        } else {
            false
        }
    }

    /// [`Timer::tick`] followed by [`Timer::consume_frame`]
    pub fn can_render_frame(&mut self, frame_time: f32) -> bool {
        self.tick();
        self.consume_frame(frame_time)
    }

    /// Drop the accumulated budget and restart the wall clock.
    ///
    /// Used while paused so that resuming does not replay the paused time.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.passed_time = 0.0;
        self.delta_time = 0.0;
    }

    /// Get the time measured by the last tick in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total accumulated time
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Unspent time in the frame budget
    pub fn passed_time(&self) -> f32 {
        self.passed_time
    }

    /// Number of frames consumed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average simulation rate since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Reset the stopwatch and start it again
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}
