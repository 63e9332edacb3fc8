// Post-run validation: interval-norm reconstruction and drift accounting

use crate::error::GeodesicError;
use crate::metric::SchwarzschildMetric;
use crate::trajectory::Trajectory;
use crate::types::IntervalNorm;

// Reconstruct g_μν v^μ v^ν at one point
//
// For an exact geodesic this is a constant of motion equal to the norm the
// velocity was prepared with; numerically it drifts with accumulated
// integration error, which makes it the cheapest end-to-end quality probe
// the pipeline has.
pub fn interval_norm(
    metric: &SchwarzschildMetric,
    x: &[f64; 4],
    v: &[f64; 4],
) -> Result<f64, GeodesicError> {
    let point = metric.evaluate(x)?;
    Ok((0..4).map(|i| point.g_diag[i] * v[i] * v[i]).sum())
}

// Running drift statistics over the samples of one or more trajectories
#[derive(Debug, Clone, Copy)]
pub struct ValidationStats {
    expected: f64,
    pub count: u64,
    pub max_drift: f64,
    sum_drift: f64,
}

impl ValidationStats {
    pub fn new(norm: IntervalNorm) -> Self {
        Self {
            expected: norm.epsilon(),
            count: 0,
            max_drift: 0.0,
            sum_drift: 0.0,
        }
    }

    pub fn update(&mut self, drift: f64) {
        self.count += 1;
        self.max_drift = self.max_drift.max(drift);
        self.sum_drift += drift;
    }

    // Fold every sample of a trajectory into the stats
    pub fn update_trajectory(
        &mut self,
        metric: &SchwarzschildMetric,
        trajectory: &Trajectory,
    ) -> Result<(), GeodesicError> {
        for sample in &trajectory.samples {
            let norm = interval_norm(metric, &sample.position(), &sample.velocities)?;
            self.update((norm - self.expected).abs());
        }
        Ok(())
    }

    pub fn mean_drift(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_drift / self.count as f64
        }
    }

    pub fn report(&self) -> String {
        format!(
            "interval norm drift over {} samples: max {:.3e}, mean {:.3e}",
            self.count,
            self.max_drift,
            self.mean_drift()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesic::Spacetime;
    use crate::trajectory::TrajectoryIntegrator;
    use crate::velocity::normalize_velocity;
    use std::f64::consts::PI;

    #[test]
    fn test_normalizer_round_trip() {
        // Whatever the normalizer hands back must reconstruct the norm it
        // was asked for, to roundoff.
        let spacetime = Spacetime::new(1.0);
        let x = [0.0, 12.0, PI / 3.0, 0.4];

        for (norm, spatial) in [
            (IntervalNorm::Timelike, [0.02, 0.001, 0.01]),
            (IntervalNorm::Null, [0.1, 0.0, 0.05]),
        ] {
            let v = normalize_velocity(&spacetime, &x, spatial, norm).unwrap();
            let reconstructed = interval_norm(spacetime.metric(), &x, &v).unwrap();
            assert!(
                (reconstructed - norm.epsilon()).abs() < 1e-13,
                "{} norm reconstructed as {}",
                norm.name(),
                reconstructed
            );
        }
    }

    #[test]
    fn test_stats_over_integrated_orbit() {
        let spacetime = Spacetime::new(1.0);
        let x0 = [0.0, 10.0, PI / 2.0, 0.0];
        let v0 = normalize_velocity(&spacetime, &x0, [0.0, 0.0, 0.03], IntervalNorm::Timelike)
            .unwrap();

        let integrator = TrajectoryIntegrator::new(spacetime.clone());
        let trajectory = integrator
            .integrate(
                [x0[0], x0[1], x0[2], x0[3], v0[0], v0[1], v0[2], v0[3]],
                40.0,
                40,
            )
            .unwrap();

        let mut stats = ValidationStats::new(IntervalNorm::Timelike);
        stats.update_trajectory(spacetime.metric(), &trajectory).unwrap();

        assert_eq!(stats.count, 40);
        assert!(stats.max_drift < 1e-8, "max drift {}", stats.max_drift);
        assert!(stats.mean_drift() <= stats.max_drift);
    }

    #[test]
    fn test_empty_stats_report() {
        let stats = ValidationStats::new(IntervalNorm::Null);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean_drift(), 0.0);
        assert!(stats.report().contains("0 samples"));
    }
}
