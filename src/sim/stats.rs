//! Frame timing and collision counters for the driver

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use super::contract_violation;
use super::world::StepReport;

/// Mean over the most recent `capacity` samples
#[derive(Debug, Clone, Serialize)]
pub struct RollingAverage {
    capacity: usize,
    samples: VecDeque<f64>,
    sum: f64,
}

impl RollingAverage {
    /// A window of one sample is no average at all, so `capacity` must exceed 1
    #[track_caller]
    pub fn new(capacity: usize) -> Self {
        if capacity <= 1 {
            contract_violation("rolling average window must hold more than one sample");
        }
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                self.sum -= oldest;
            }
        }
        self.samples.push_back(value);
        self.sum += value;
    }

    /// Zero until the first sample arrives
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Running totals kept by the physics thread
#[derive(Debug, Clone, Serialize)]
pub struct FrameStats {
    pub frames: u64,
    pub collisions: u64,
    pub resolved: u64,
    pub rejected: u64,
    /// Frames whose stepping took longer than the frame period
    pub overruns: u64,
    /// Wall-clock stepping time per frame (microseconds)
    pub step_micros: RollingAverage,
}

impl FrameStats {
    pub fn new(window: usize) -> Self {
        Self {
            frames: 0,
            collisions: 0,
            resolved: 0,
            rejected: 0,
            overruns: 0,
            step_micros: RollingAverage::new(window),
        }
    }

    pub fn record(&mut self, report: &StepReport, elapsed: Duration, period: Duration) {
        self.frames += 1;
        self.collisions += u64::from(report.collisions);
        self.resolved += u64::from(report.resolved);
        self.rejected += u64::from(report.rejected);
        if elapsed > period {
            self.overruns += 1;
        }
        self.step_micros.push(elapsed.as_secs_f64() * 1e6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_average_window() {
        let mut avg = RollingAverage::new(3);
        assert_eq!(avg.average(), 0.0);
        avg.push(1.0);
        avg.push(2.0);
        assert!((avg.average() - 1.5).abs() < 1e-12);
        avg.push(3.0);
        avg.push(10.0);
        // Oldest sample (1.0) has dropped out
        assert_eq!(avg.len(), 3);
        assert!((avg.average() - 5.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "more than one sample")]
    fn test_rolling_average_rejects_tiny_window() {
        let _ = RollingAverage::new(1);
    }

    #[test]
    fn test_frame_stats_record() {
        let mut stats = FrameStats::new(4);
        let report = StepReport {
            collisions: 2,
            resolved: 1,
            rejected: 3,
            iterations: 3,
        };
        let period = Duration::from_millis(17);
        stats.record(&report, Duration::from_millis(2), period);
        stats.record(&StepReport::default(), Duration::from_millis(20), period);

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.collisions, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.rejected, 3);
        assert_eq!(stats.overruns, 1);
        assert!((stats.step_micros.average() - 11_000.0).abs() < 1e-6);
    }
}
