//! Ambient noise around step targets

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::sensor::{SensorData, SensorField};
use crate::models::workflow::WorkflowStep;

/// Full width of the symmetric noise band per field
///
/// A value of `m` yields offsets in `[-m/2, m/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseAmplitudes {
    /// Lux
    pub light_intensity: f64,

    /// Volts
    pub voltage: f64,

    /// Amperes
    pub current: f64,

    /// Percentage points
    pub efficiency: f64,
}

impl Default for NoiseAmplitudes {
    fn default() -> Self {
        Self {
            light_intensity: 15.0,
            voltage: 0.1,
            current: 0.05,
            efficiency: 0.5,
        }
    }
}

impl NoiseAmplitudes {
    pub fn for_field(&self, field: SensorField) -> f64 {
        match field {
            SensorField::LightIntensity => self.light_intensity,
            SensorField::Voltage => self.voltage,
            SensorField::Current => self.current,
            SensorField::Efficiency => self.efficiency,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.light_intensity, self.voltage, self.current, self.efficiency]
            .iter()
            .all(|m| m.is_finite() && *m >= 0.0)
    }
}

fn noise<R: Rng>(rng: &mut R, magnitude: f64) -> f64 {
    (rng.random::<f64>() - 0.5) * magnitude
}

/// Compute one fluctuation tick
///
/// Live fields are re-centred on their target, not on the current animated
/// value, so noise never compounds with transition drift. Fields not yet live
/// for `step` keep their current value.
pub fn fluctuate<R: Rng>(
    step: WorkflowStep,
    current: &SensorData,
    targets: &SensorData,
    amplitudes: &NoiseAmplitudes,
    rng: &mut R,
) -> SensorData {
    let mut next = *current;

    let mut jitter = |field: SensorField, target: f64, value: &mut f64| {
        if field.is_live(step) {
            *value = target + noise(&mut *rng, amplitudes.for_field(field));
        }
    };

    jitter(SensorField::LightIntensity, targets.light_intensity, &mut next.light_intensity);
    jitter(SensorField::Voltage, targets.voltage, &mut next.voltage);
    jitter(SensorField::Current, targets.current, &mut next.current);
    jitter(SensorField::Efficiency, targets.efficiency, &mut next.efficiency);

    next.clamp();
    next
}
