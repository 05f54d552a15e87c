// attitude_sim/src/simulation/playback.rs

use attitude_core::prelude::{HeadingProvider, HeadingRateProvider, TimeProvider};

use crate::simulation::scenarios::SensorSample;

/// Replays a pre-generated run one sample at a time.
///
/// The player is the data source for a `FilteredCompass`: it answers all three
/// provider traits with the reading under its cursor. Past the end of the data
/// every reading is NaN, which the estimator refuses.
#[derive(Debug, Clone)]
pub struct ScenarioPlayer {
    samples: Vec<SensorSample>,
    cursor: usize,
}

impl ScenarioPlayer {
    pub fn new(samples: Vec<SensorSample>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// The sample under the cursor, if any are left.
    pub fn current(&self) -> Option<&SensorSample> {
        self.samples.get(self.cursor)
    }

    /// Moves to the next sample. Returns `false` once the data is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.samples.len() {
            self.cursor += 1;
        }
        self.has_more_data()
    }

    pub fn has_more_data(&self) -> bool {
        self.cursor < self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl HeadingProvider for ScenarioPlayer {
    fn heading(&self) -> f64 {
        self.current().map_or(f64::NAN, |s| s.heading)
    }
}

impl HeadingRateProvider for ScenarioPlayer {
    fn angular_rate(&self) -> f64 {
        self.current().map_or(f64::NAN, |s| s.angular_rate)
    }
}

impl TimeProvider for ScenarioPlayer {
    fn time(&self) -> f64 {
        self.current().map_or(f64::NAN, |s| s.time)
    }
}
