// Trajectory integration: drive the adaptive stepper over a proper-time
// span and emit samples on a uniform grid

use serde::Serialize;

use crate::error::{FailureReason, GeodesicError, IntegrationFailure};
use crate::geodesic::{GeodesicField, Spacetime};
use crate::solver::{hermite_interpolate, OdeSystem, Rkf78, Tolerances};

// ============================================================================
// OUTPUT TYPES
// ============================================================================

// One point of a worldline: coordinates and 4-velocity at a proper time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrajectorySample {
    pub proper_time: f64,
    pub t: f64,
    pub r: f64,
    pub theta: f64,
    pub phi: f64,
    pub velocities: [f64; 4],
}

impl TrajectorySample {
    // Unpack an 8-dim integration state (x, v) at proper time s
    pub fn from_state(proper_time: f64, y: &[f64; 8]) -> Self {
        Self {
            proper_time,
            t: y[0],
            r: y[1],
            theta: y[2],
            phi: y[3],
            velocities: [y[4], y[5], y[6], y[7]],
        }
    }

    pub fn state(&self) -> [f64; 8] {
        [
            self.t,
            self.r,
            self.theta,
            self.phi,
            self.velocities[0],
            self.velocities[1],
            self.velocities[2],
            self.velocities[3],
        ]
    }

    pub fn position(&self) -> [f64; 4] {
        [self.t, self.r, self.theta, self.phi]
    }
}

// An integrated worldline, sampled on the requested proper-time grid
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }
}

// ============================================================================
// INTEGRATOR
// ============================================================================

// Knobs for the adaptive run
#[derive(Debug, Clone, Copy)]
pub struct IntegratorConfig {
    pub atol: f64,
    pub rtol: f64,
    pub initial_step: f64,
    pub max_steps: u64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            atol: 1e-10,
            rtol: 1e-10,
            initial_step: 1e-3,
            max_steps: 1_000_000,
        }
    }
}

// Integrates the geodesic equation through one spacetime
//
// The worldline is the solution of dy/ds = (v, a) with a from the derived
// connection. The stepper picks its own internal step sizes; output samples
// land on the uniform grid via Hermite interpolation across whichever
// internal step contains them, so tight sampling never forces tiny steps.
pub struct TrajectoryIntegrator {
    spacetime: Spacetime,
    config: IntegratorConfig,
}

impl TrajectoryIntegrator {
    pub fn new(spacetime: Spacetime) -> Self {
        Self::with_config(spacetime, IntegratorConfig::default())
    }

    pub fn with_config(spacetime: Spacetime, config: IntegratorConfig) -> Self {
        assert!(config.atol > 0.0 && config.atol.is_finite());
        assert!(config.rtol >= 0.0 && config.rtol.is_finite());
        assert!(config.initial_step > 0.0 && config.initial_step.is_finite());
        Self { spacetime, config }
    }

    pub fn spacetime(&self) -> &Spacetime {
        &self.spacetime
    }

    // Integrate from the 8-dim state `start` over `span` of proper time,
    // emitting `samples` points uniformly spaced over [0, span]
    //
    // On early termination the partial trajectory (every sample that was
    // reached) rides along inside the error.
    pub fn integrate(
        &self,
        start: [f64; 8],
        span: f64,
        samples: usize,
    ) -> Result<Trajectory, GeodesicError> {
        assert!(span > 0.0 && span.is_finite(), "span must be positive");
        assert!(samples >= 1, "at least one sample required");

        let x0 = [start[0], start[1], start[2], start[3]];
        self.spacetime.metric().check_point(&x0)?;
        if !self.spacetime.mass().is_outside_horizon(x0[1]) {
            return Err(GeodesicError::DegenerateMetric {
                r: x0[1],
                theta: x0[2],
            });
        }

        let field = GeodesicField::new(&self.spacetime);
        let mut solver: Rkf78<8> =
            Rkf78::new(Tolerances::new(self.config.atol, self.config.rtol));
        solver.max_steps = self.config.max_steps;

        let mut trajectory = Trajectory::default();
        trajectory.samples.reserve(samples);
        trajectory.samples.push(TrajectorySample::from_state(0.0, &start));

        // Grid of requested proper times; index 0 is already emitted
        let grid = |k: usize| {
            if samples == 1 {
                0.0
            } else {
                span * k as f64 / (samples - 1) as f64
            }
        };
        let grid_eps = 1e-12 * span;

        let mut s = 0.0;
        let mut y = start;
        let mut h = self.config.initial_step;
        let mut next = 1;
        let mut steps = 0u64;

        while next < samples {
            if s + h > span {
                h = span - s;
            }

            let result = solver.step(&field, s, &y, h);

            if result.accepted {
                if !result.y.iter().all(|v| v.is_finite()) {
                    return Err(self.fail(trajectory, s, FailureReason::NonFiniteState));
                }
                if !self.spacetime.mass().is_outside_horizon(result.y[1]) {
                    return Err(self.fail(trajectory, s, FailureReason::HorizonReached));
                }

                // Emit every grid point this step swept past. The endpoint
                // derivatives for the interpolant cost two extra evaluations
                // and only when a step actually contains samples.
                let mut endpoint_rhs: Option<([f64; 8], [f64; 8])> = None;
                while next < samples && grid(next) <= result.s + grid_eps {
                    let target = grid(next);
                    let sample = if target >= result.s - grid_eps {
                        TrajectorySample::from_state(target, &result.y)
                    } else {
                        let (f_a, f_b) = *endpoint_rhs.get_or_insert_with(|| {
                            let mut f_a = [0.0; 8];
                            let mut f_b = [0.0; 8];
                            field.rhs(s, &y, &mut f_a);
                            field.rhs(result.s, &result.y, &mut f_b);
                            (f_a, f_b)
                        });
                        let y_interp = hermite_interpolate(
                            target, s, &y, &f_a, result.s, &result.y, &f_b,
                        );
                        TrajectorySample::from_state(target, &y_interp)
                    };
                    trajectory.samples.push(sample);
                    next += 1;
                }

                s = result.s;
                y = result.y;
            } else if result.h_next <= solver.h_min {
                return Err(self.fail(trajectory, s, FailureReason::StepSizeUnderflow));
            }

            h = result.h_next;

            steps += 1;
            if steps > self.config.max_steps {
                return Err(self.fail(trajectory, s, FailureReason::MaxStepsExceeded));
            }
        }

        Ok(trajectory)
    }

    fn fail(&self, partial: Trajectory, reached: f64, reason: FailureReason) -> GeodesicError {
        GeodesicError::Integration(IntegrationFailure {
            partial,
            reached,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntervalNorm;
    use crate::velocity::normalize_velocity;
    use std::f64::consts::PI;

    fn state(x: [f64; 4], v: [f64; 4]) -> [f64; 8] {
        [x[0], x[1], x[2], x[3], v[0], v[1], v[2], v[3]]
    }

    #[test]
    fn test_sample_grid_is_uniform() {
        let integrator = TrajectoryIntegrator::new(Spacetime::new(0.0));
        let v_t = 1.0; // flat space, at rest: g_tt (v^t)² = -1
        let trajectory = integrator
            .integrate(state([0.0, 5.0, PI / 2.0, 0.0], [v_t, 0.0, 0.0, 0.0]), 10.0, 11)
            .unwrap();

        assert_eq!(trajectory.len(), 11);
        for (k, sample) in trajectory.samples.iter().enumerate() {
            assert!((sample.proper_time - k as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_flat_space_radial_line_is_straight() {
        // M = 0 with purely radial velocity: r advances linearly in proper
        // time, coordinate time advances with v^t, angles frozen.
        let spacetime = Spacetime::new(0.0);
        let x0 = [0.0, 5.0, PI / 2.0, 0.0];
        let v = normalize_velocity(&spacetime, &x0, [0.2, 0.0, 0.0], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime);
        let trajectory = integrator.integrate(state(x0, v), 20.0, 21).unwrap();

        for sample in &trajectory.samples {
            let expected_r = 5.0 + 0.2 * sample.proper_time;
            assert!(
                (sample.r - expected_r).abs() < 1e-8,
                "r({}) = {}, expected {}",
                sample.proper_time,
                sample.r,
                expected_r
            );
            assert!((sample.theta - PI / 2.0).abs() < 1e-10);
            assert!(sample.phi.abs() < 1e-10);
        }
    }

    #[test]
    fn test_circular_orbit_radius_constant_over_period() {
        // r = 6M, M = 1: Ω = sqrt(M/r³), v^t = sqrt(2), one full revolution
        // in Δφ = 2π which is Δs = 2π / (Ω v^t) of proper time.
        let m = 1.0;
        let r: f64 = 6.0;
        let spacetime = Spacetime::new(m);
        let omega = (m / r.powi(3)).sqrt();
        let v_t = 2.0_f64.sqrt();
        let v_phi = omega * v_t;
        let x0 = [0.0, r, PI / 2.0, 0.0];

        let period = 2.0 * PI / v_phi;
        let integrator = TrajectoryIntegrator::new(spacetime);
        let trajectory = integrator
            .integrate(state(x0, [v_t, 0.0, 0.0, v_phi]), period, 100)
            .unwrap();

        for sample in &trajectory.samples {
            assert!(
                (sample.r - r).abs() < 1e-6,
                "orbit drifted to r = {} at s = {}",
                sample.r,
                sample.proper_time
            );
        }
        let last = trajectory.last().unwrap();
        assert!((last.phi - 2.0 * PI).abs() < 1e-6, "phi = {}", last.phi);
    }

    #[test]
    fn test_time_reversal_returns_to_start() {
        // Integrate forward, flip the 4-velocity, integrate the same span:
        // the geodesic equation is quadratic in v so the path retraces.
        let spacetime = Spacetime::new(1.0);
        let x0 = [0.0, 10.0, PI / 2.0, 0.0];
        let v0 = normalize_velocity(&spacetime, &x0, [0.0, 0.0, 0.03], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime);
        let forward = integrator.integrate(state(x0, v0), 30.0, 2).unwrap();
        let end = forward.last().unwrap();

        let mut back_state = end.state();
        for v in &mut back_state[4..] {
            *v = -*v;
        }
        let back = integrator.integrate(back_state, 30.0, 2).unwrap();
        let home = back.last().unwrap();

        assert!((home.r - x0[1]).abs() < 1e-6, "r came back to {}", home.r);
        assert!((home.theta - x0[2]).abs() < 1e-8);
        assert!((home.phi - x0[3]).abs() < 1e-6, "phi came back to {}", home.phi);
    }

    #[test]
    fn test_infall_terminates_at_horizon_with_partial() {
        // Radial free fall from rest at r = 10, M = 1 reaches the horizon
        // in finite proper time; the run must end in an explicit horizon
        // failure carrying the samples collected on the way down.
        let spacetime = Spacetime::new(1.0);
        let x0 = [0.0, 10.0, PI / 2.0, 0.0];
        let v0 = normalize_velocity(&spacetime, &x0, [0.0, 0.0, 0.0], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime);
        // Proper infall time from rest is π sqrt(r³/8M) ≈ 35.1; span well past it
        let err = integrator.integrate(state(x0, v0), 60.0, 100).unwrap_err();

        match err {
            GeodesicError::Integration(failure) => {
                assert!(
                    matches!(
                        failure.reason,
                        FailureReason::HorizonReached | FailureReason::StepSizeUnderflow
                    ),
                    "unexpected reason: {}",
                    failure.reason
                );
                assert!(!failure.partial.is_empty());
                // Every preserved sample is still outside the horizon
                for sample in &failure.partial.samples {
                    assert!(sample.r > 2.0);
                }
                // r decreases monotonically on the way down
                for pair in failure.partial.samples.windows(2) {
                    assert!(pair[1].r < pair[0].r);
                }
            }
            other => panic!("expected Integration failure, got {other}"),
        }
    }

    #[test]
    fn test_interval_norm_preserved_along_orbit() {
        // g_μν v^μ v^ν is a constant of geodesic motion; drift over the run
        // measures integration quality end to end.
        let spacetime = Spacetime::new(1.0);
        let x0 = [0.0, 8.0, PI / 2.0, 0.0];
        let v0 = normalize_velocity(&spacetime, &x0, [0.01, 0.0, 0.04], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime.clone());
        let trajectory = integrator.integrate(state(x0, v0), 50.0, 50).unwrap();

        for sample in &trajectory.samples {
            let g = spacetime.metric().evaluate(&sample.position()).unwrap();
            let norm: f64 = (0..4)
                .map(|i| g.g_diag[i] * sample.velocities[i] * sample.velocities[i])
                .sum();
            assert!(
                (norm + 1.0).abs() < 1e-8,
                "norm drifted to {} at s = {}",
                norm,
                sample.proper_time
            );
        }
    }

    #[test]
    fn test_close_orbit_small_mass() {
        // Mild central mass, close start: either completes with the full
        // grid or reports an explicit failure with partial samples. NaN in
        // output is the one forbidden outcome.
        let spacetime = Spacetime::new(0.5);
        let x0 = [0.0, 1.5, PI / 2.0, 0.0];
        let v0 = normalize_velocity(&spacetime, &x0, [0.0, 0.0, 0.1], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime);
        match integrator.integrate(state(x0, v0), 60.0, 100) {
            Ok(trajectory) => {
                assert_eq!(trajectory.len(), 100);
                for pair in trajectory.samples.windows(2) {
                    assert!(pair[1].proper_time > pair[0].proper_time);
                }
                for sample in &trajectory.samples {
                    assert!(sample.state().iter().all(|v| v.is_finite()));
                }
            }
            Err(GeodesicError::Integration(failure)) => {
                for sample in &failure.partial.samples {
                    assert!(sample.state().iter().all(|v| v.is_finite()));
                }
            }
            Err(other) => panic!("unexpected error kind: {other}"),
        }
    }

    #[test]
    fn test_sample_serializes_with_named_fields() {
        let sample =
            TrajectorySample::from_state(1.5, &[0.1, 10.0, 1.2, 0.3, 1.1, 0.0, 0.0, 0.02]);
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["proper_time"], 1.5);
        assert_eq!(json["r"], 10.0);
        assert_eq!(json["velocities"][3], 0.02);
    }

    #[test]
    fn test_start_on_horizon_rejected() {
        let integrator = TrajectoryIntegrator::new(Spacetime::new(1.0));
        let err = integrator
            .integrate(state([0.0, 2.0, PI / 2.0, 0.0], [1.0, 0.0, 0.0, 0.0]), 1.0, 10)
            .unwrap_err();
        assert!(matches!(err, GeodesicError::DegenerateMetric { .. }));
    }
}
