//! Eased transition of readings toward step targets

use std::time::Duration;

use tokio::time::Instant;

use crate::models::sensor::SensorData;

/// Cubic ease-out: fast initial movement, slow settle
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Frame ticker for one step entry
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frame: u32,
    total_frames: u32,
    frame_interval: Duration,
    eases_efficiency: bool,
    next_at: Instant,
}

impl Animation {
    /// Create an animation whose first frame is due at `start`
    pub fn new(start: Instant, total_frames: u32, frame_interval: Duration, eases_efficiency: bool) -> Self {
        Self {
            frame: 0,
            total_frames,
            frame_interval,
            eases_efficiency,
            next_at: start,
        }
    }

    /// When the next frame is due
    pub fn next_at(&self) -> Instant {
        self.next_at
    }

    /// Frames applied so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.total_frames
    }

    /// Apply the next frame to `data`, moving each animated field by the
    /// eased fraction of its remaining gap to `targets`
    ///
    /// Returns `false` once every frame has been applied.
    pub fn step(&mut self, data: &mut SensorData, targets: &SensorData) -> bool {
        if self.is_finished() {
            return false;
        }

        self.frame += 1;
        let eased = ease_out_cubic(f64::from(self.frame) / f64::from(self.total_frames));

        data.light_intensity += (targets.light_intensity - data.light_intensity) * eased;
        data.voltage += (targets.voltage - data.voltage) * eased;
        data.current += (targets.current - data.current) * eased;
        data.recompute_power();
        if self.eases_efficiency {
            data.efficiency += (targets.efficiency - data.efficiency) * eased;
        }

        self.next_at += self.frame_interval;
        !self.is_finished()
    }
}
