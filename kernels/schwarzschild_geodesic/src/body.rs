// Named body record for batch runs and serialized output

use serde::Serialize;

use crate::trajectory::Trajectory;
use crate::types::IntervalNorm;

// One traced body: its configuration plus the integrated worldline
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    pub name: String,
    // Central mass the body orbits, in geometric units
    pub central_mass: f64,
    pub norm: IntervalNorm,
    pub trajectory: Trajectory,
}

impl Body {
    pub fn new(
        name: impl Into<String>,
        central_mass: f64,
        norm: IntervalNorm,
        trajectory: Trajectory,
    ) -> Self {
        Self {
            name: name.into(),
            central_mass,
            norm,
            trajectory,
        }
    }
}
