// cl_timing.rs -- frame clock and outgoing command pacing
//
// Every time comparison in the camera code reads cls.realtime, which the
// session sets from a Clock once per frame. Live sessions use SystemClock;
// tests and the scripted simulation step a ManualClock.
//
// - cl_maxfps: input/command rate (default 72)

use std::cell::Cell;
use std::time::Instant;

/// Source of the session's notion of "now", in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock, seconds since construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, t: f64) {
        self.now.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Decides when the next user command is due.
#[derive(Debug, Default)]
pub struct ClientTiming {
    /// Time of the previous frame, None before the first one.
    pub last_frame_time: Option<f64>,
    /// Accumulated time towards the next command (seconds).
    pub command_accumulator: f64,
}

impl ClientTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `now`; returns the frame delta in seconds.
    pub fn update(&mut self, now: f64) -> f64 {
        let delta = match self.last_frame_time {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_frame_time = Some(now);
        self.command_accumulator += delta;
        delta
    }

    /// Check if a user command should be built this frame.
    /// cl_maxfps of 0 means one command per frame.
    pub fn should_send_command(&mut self, cl_maxfps: f32) -> bool {
        if cl_maxfps <= 0.0 {
            self.command_accumulator = 0.0;
            return true;
        }

        let frame_time = 1.0 / cl_maxfps as f64;
        if self.command_accumulator >= frame_time {
            self.command_accumulator -= frame_time;
            // Prevent accumulator from growing too large
            if self.command_accumulator > frame_time * 2.0 {
                self.command_accumulator = frame_time;
            }
            return true;
        }

        false
    }

    /// Reset pacing (used on map change).
    pub fn reset(&mut self) {
        self.last_frame_time = None;
        self.command_accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1.5);
        assert_eq!(clock.now(), 1.5);
        clock.advance(0.25);
        assert_eq!(clock.now(), 1.75);
        clock.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_first_update_has_zero_delta() {
        let mut timing = ClientTiming::new();
        assert_eq!(timing.update(5.0), 0.0);
        assert!((timing.update(5.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_should_send_command_capped() {
        let mut timing = ClientTiming::new();
        timing.update(0.0);
        timing.update(0.01);
        assert!(!timing.should_send_command(50.0));
        timing.update(0.025);
        assert!(timing.should_send_command(50.0));
        assert!(!timing.should_send_command(50.0));
    }

    #[test]
    fn test_should_send_command_unlimited() {
        let mut timing = ClientTiming::new();
        timing.update(0.0);
        assert!(timing.should_send_command(0.0));
        assert!(timing.should_send_command(0.0));
    }

    #[test]
    fn test_reset_clears_accumulator() {
        let mut timing = ClientTiming::new();
        timing.update(0.0);
        timing.update(1.0);
        timing.reset();
        assert_eq!(timing.command_accumulator, 0.0);
        assert_eq!(timing.last_frame_time, None);
    }
}
