//! Platform abstraction layer
//!
//! Frame pacing shared by the browser loop and the native demo: real frame
//! deltas go in, fixed simulation steps come out.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FrameClock {
    accumulator: f32,
    last_time: Option<f64>,
    max_frame_dt: f32,
}

impl FrameClock {
    pub fn new(max_frame_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            last_time: None,
            max_frame_dt,
        }
    }

    /// Feed a timestamp in milliseconds, returns the elapsed seconds (clamped)
    pub fn delta_from_timestamp(&mut self, time_ms: f64) -> f32 {
        let dt = match self.last_time {
            Some(last) => ((time_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_time = Some(time_ms);
        dt.clamp(0.0, self.max_frame_dt)
    }

    /// Accumulate a frame delta and return how many fixed steps to run
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, self.max_frame_dt);

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        // Drop backlog we refused to simulate
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }
}
