// Time-component completion of an initial 4-velocity

use crate::error::GeodesicError;
use crate::geodesic::Spacetime;
use crate::types::IntervalNorm;

// Complete a spatial 3-velocity into a 4-velocity with the requested norm
//
// Physics: The metric fixes the squared interval of any 4-velocity,
//
//   g_tt (v^t)² + g_rr (v^r)² + g_θθ (v^θ)² + g_φφ (v^φ)² = ε
//
// with ε = -1 for massive bodies, 0 for light, +1 for spacelike probes.
// Given the spatial components (v^r, v^θ, v^φ), the only unknown is v^t:
//
//   (v^t)² = (ε - Σ spatial) / g_tt
//
// We take the future-directed root, v^t > 0. The quotient is non-negative
// for every timelike or null request outside the horizon (g_tt < 0 there),
// so the failure path is reachable only for spacelike norms with spatial
// parts too small to carry the requested interval.
pub fn normalize_velocity(
    spacetime: &Spacetime,
    position: &[f64; 4],
    spatial: [f64; 3],
    norm: IntervalNorm,
) -> Result<[f64; 4], GeodesicError> {
    let metric = spacetime.metric();
    // The construction below assumes g_tt < 0, which only holds in the
    // exterior chart; reject anything at or inside the horizon outright
    if !spacetime.mass().is_outside_horizon(position[1]) {
        return Err(GeodesicError::DegenerateMetric {
            r: position[1],
            theta: position[2],
        });
    }
    let point = metric.evaluate(position)?;
    let g = point.g_diag;

    let quadratic = g[1] * spatial[0] * spatial[0]
        + g[2] * spatial[1] * spatial[1]
        + g[3] * spatial[2] * spatial[2];

    let radicand = (norm.epsilon() - quadratic) / g[0];
    if radicand < 0.0 {
        return Err(GeodesicError::InvalidVelocity {
            r: position[1],
            epsilon: norm.epsilon(),
            radicand,
        });
    }

    Ok([radicand.sqrt(), spatial[0], spatial[1], spatial[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_static_observer_time_component() {
        // Spatially at rest at r = 10, M = 1: (v^t)² = 1/f = 1/0.8
        let spacetime = Spacetime::new(1.0);
        let v = normalize_velocity(
            &spacetime,
            &[0.0, 10.0, PI / 2.0, 0.0],
            [0.0, 0.0, 0.0],
            IntervalNorm::Timelike,
        )
        .unwrap();
        assert!((v[0] - (1.0 / 0.8_f64).sqrt()).abs() < 1e-15);
        assert_eq!(&v[1..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_circular_orbit_time_component() {
        // r = 6M equatorial circular orbit with v^φ = Ω v^t, Ω² = M/r³,
        // which works out to v^t = 1/sqrt(1 - 3M/r) = sqrt(2) at r = 6M.
        let m = 1.0;
        let r: f64 = 6.0;
        let spacetime = Spacetime::new(m);
        let v_t_expected = 2.0_f64.sqrt();
        let v_phi = (m / r.powi(3)).sqrt() * v_t_expected;

        let v = normalize_velocity(
            &spacetime,
            &[0.0, r, PI / 2.0, 0.0],
            [0.0, 0.0, v_phi],
            IntervalNorm::Timelike,
        )
        .unwrap();
        assert!((v[0] - v_t_expected).abs() < 1e-14, "v^t = {}", v[0]);
    }

    #[test]
    fn test_flat_space_null_ray() {
        // M = 0, r = 3, purely azimuthal photon: g_φφ (v^φ)² = (v^t)²
        // so v^t = r sin(θ) v^φ.
        let spacetime = Spacetime::new(0.0);
        let v_phi = 3.0_f64.sqrt() / 9.0;
        let v = normalize_velocity(
            &spacetime,
            &[0.0, 3.0, PI / 2.0, 0.0],
            [0.0, 0.0, v_phi],
            IntervalNorm::Null,
        )
        .unwrap();
        assert!((v[0] - 3.0 * v_phi).abs() < 1e-15);
    }

    #[test]
    fn test_spacelike_request_at_rest_is_invalid() {
        // ε = +1 with zero spatial velocity forces (v^t)² < 0
        let spacetime = Spacetime::new(1.0);
        let err = normalize_velocity(
            &spacetime,
            &[0.0, 10.0, PI / 2.0, 0.0],
            [0.0, 0.0, 0.0],
            IntervalNorm::Spacelike,
        )
        .unwrap_err();
        match err {
            GeodesicError::InvalidVelocity { radicand, .. } => assert!(radicand < 0.0),
            other => panic!("expected InvalidVelocity, got {other}"),
        }
    }

    #[test]
    fn test_horizon_and_interior_positions_rejected() {
        let spacetime = Spacetime::new(1.0);
        for r in [2.0, 1.5, 0.5] {
            let err = normalize_velocity(
                &spacetime,
                &[0.0, r, PI / 2.0, 0.0],
                [0.0, 0.0, 0.1],
                IntervalNorm::Timelike,
            )
            .unwrap_err();
            assert!(
                matches!(err, GeodesicError::DegenerateMetric { .. }),
                "r = {r} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalized_velocity_reproduces_interval() {
        let spacetime = Spacetime::new(1.0);
        let x = [0.0, 8.0, PI / 3.0, 1.0];
        let v = normalize_velocity(
            &spacetime,
            &x,
            [0.05, 0.01, 0.02],
            IntervalNorm::Timelike,
        )
        .unwrap();

        let g = spacetime.metric().evaluate(&x).unwrap();
        let norm: f64 = (0..4).map(|i| g.g_diag[i] * v[i] * v[i]).sum();
        assert!((norm + 1.0).abs() < 1e-14, "interval = {norm}");
    }
}
