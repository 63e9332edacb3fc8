// Schwarzschild metric tensor, its inverse, and its coordinate derivatives
//
// This is the build phase of the pipeline: everything here is derived
// symbolically, once per mass value, and the resulting expression trees are
// immutable afterwards. Numeric values only appear when a caller evaluates
// the tensors at a concrete coordinate point.

use crate::error::GeodesicError;
use crate::expr::Expr;
use crate::types::{CentralMass, Coordinate};

// Evaluating exactly at the horizon or the polar axis divides by zero; the
// window around them where we refuse to evaluate
const SINGULAR_TOL: f64 = 1e-12;

// ============================================================================
// SYMBOLIC METRIC MODEL
// ============================================================================

// The Schwarzschild metric for a given central mass
//
// Physics: The unique static, spherically symmetric vacuum solution. In
// Schwarzschild coordinates the line element is
//
//   ds² = -(1 - 2M/r) dt² + dr²/(1 - 2M/r) + r² dθ² + r² sin²θ dφ²
//
// The metric matrix is diagonal, so its inverse is the entry-wise
// reciprocal of the diagonal. We still store full 4×4 arrays (off-diagonal
// entries are exact zeros) so the connection derivation below can use the
// general index formula unchanged.
#[derive(Debug, Clone)]
pub struct SchwarzschildMetric {
    mass: CentralMass,
    // Covariant components g[i][j]
    g: [[Expr; 4]; 4],
    // Contravariant components g⁻¹[i][j]
    g_inv: [[Expr; 4]; 4],
    // Partial derivatives dg[i][j][k] = ∂g[i][j]/∂x^k
    dg: [[[Expr; 4]; 4]; 4],
}

// The metric evaluated at one coordinate point
//
// Only the diagonal survives for this family, so we hand back the four
// diagonal entries of g and g⁻¹ rather than full matrices.
#[derive(Debug, Clone, Copy)]
pub struct MetricPoint {
    // Diagonal of g_μν: [g_tt, g_rr, g_θθ, g_φφ]
    pub g_diag: [f64; 4],
    // Diagonal of g^μν
    pub g_inv_diag: [f64; 4],
}

impl SchwarzschildMetric {
    // Build the symbolic metric for a central mass
    //
    // The mass is folded into the expression trees as a numeric constant,
    // so at M = 0 the time and radial components collapse to the flat
    // constants -1 and +1 at build time.
    pub fn new(mass: CentralMass) -> Self {
        let r = Expr::coord(Coordinate::R);
        let theta = Expr::coord(Coordinate::Theta);

        // f(r) = 1 - 2M/r, the Schwarzschild factor
        let factor = Expr::sub(
            Expr::constant(1.0),
            Expr::mul(
                Expr::constant(mass.schwarzschild_radius()),
                Expr::recip(r.clone()),
            ),
        );

        // Diagonal entries in coordinate order
        let diag = [
            Expr::neg(factor.clone()),                       // g_tt
            Expr::recip(factor),                             // g_rr
            Expr::pow(r.clone(), 2),                         // g_θθ
            Expr::mul(Expr::pow(r, 2), Expr::pow(Expr::sin(theta), 2)), // g_φφ
        ];

        let g: [[Expr; 4]; 4] = std::array::from_fn(|i| {
            std::array::from_fn(|j| {
                if i == j {
                    diag[i].clone()
                } else {
                    Expr::constant(0.0)
                }
            })
        });

        // Diagonal inverse: entry-wise reciprocal
        let g_inv: [[Expr; 4]; 4] = std::array::from_fn(|i| {
            std::array::from_fn(|j| {
                if i == j {
                    Expr::recip(diag[i].clone())
                } else {
                    Expr::constant(0.0)
                }
            })
        });

        // Exact partial derivatives of every component
        let dg: [[[Expr; 4]; 4]; 4] = std::array::from_fn(|i| {
            std::array::from_fn(|j| {
                std::array::from_fn(|k| g[i][j].diff(Coordinate::ALL[k]))
            })
        });

        Self { mass, g, g_inv, dg }
    }

    pub fn mass(&self) -> CentralMass {
        self.mass
    }

    // Covariant metric components (symbolic)
    pub fn components(&self) -> &[[Expr; 4]; 4] {
        &self.g
    }

    // Contravariant metric components (symbolic)
    pub fn inverse(&self) -> &[[Expr; 4]; 4] {
        &self.g_inv
    }

    // Partial-derivative tensor ∂g[i][j]/∂x^k (symbolic)
    pub fn derivatives(&self) -> &[[[Expr; 4]; 4]; 4] {
        &self.dg
    }

    // Check a coordinate point against the chart's singular set
    //
    // Detection is lazy by design: the symbolic tensors are perfectly happy
    // at any point, and only numeric substitution can hit the horizon
    // (r = 2M), the center (r = 0), or the polar axis (sin θ = 0).
    pub fn check_point(&self, x: &[f64; 4]) -> Result<(), GeodesicError> {
        let r = x[Coordinate::R.index()];
        let theta = x[Coordinate::Theta.index()];

        let degenerate = r.abs() < SINGULAR_TOL
            || (r - self.mass.schwarzschild_radius()).abs() < SINGULAR_TOL
            || theta.sin().abs() < SINGULAR_TOL;

        if degenerate {
            return Err(GeodesicError::DegenerateMetric { r, theta });
        }
        Ok(())
    }

    // Evaluate the metric and its inverse at a coordinate point
    pub fn evaluate(&self, x: &[f64; 4]) -> Result<MetricPoint, GeodesicError> {
        self.check_point(x)?;

        let g_diag = std::array::from_fn(|i| self.g[i][i].eval(x));
        let g_inv_diag = std::array::from_fn(|i| self.g_inv[i][i].eval(x));

        Ok(MetricPoint { g_diag, g_inv_diag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn point(r: f64, theta: f64) -> [f64; 4] {
        [0.0, r, theta, 0.0]
    }

    #[test]
    fn test_schwarzschild_components() {
        let metric = SchwarzschildMetric::new(CentralMass::new(1.0));
        let p = metric.evaluate(&point(10.0, PI / 2.0)).unwrap();

        assert!((p.g_diag[0] - (-0.8)).abs() < 1e-15); // -(1 - 2/10)
        assert!((p.g_diag[1] - 1.25).abs() < 1e-15); // 1/(1 - 2/10)
        assert!((p.g_diag[2] - 100.0).abs() < 1e-12); // r²
        assert!((p.g_diag[3] - 100.0).abs() < 1e-12); // r² sin²(π/2)
    }

    #[test]
    fn test_inverse_is_reciprocal_diagonal() {
        let metric = SchwarzschildMetric::new(CentralMass::new(1.0));
        let p = metric.evaluate(&point(7.3, 1.1)).unwrap();

        // g · g⁻¹ = identity, checked numerically on the diagonal
        for i in 0..4 {
            assert!(
                (p.g_diag[i] * p.g_inv_diag[i] - 1.0).abs() < 1e-12,
                "g[{i}]·g⁻¹[{i}] should be 1"
            );
        }
    }

    #[test]
    fn test_off_diagonal_entries_are_exact_zero() {
        let metric = SchwarzschildMetric::new(CentralMass::new(2.5));
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    assert!(metric.components()[i][j].is_zero());
                    assert!(metric.inverse()[i][j].is_zero());
                }
            }
        }
    }

    #[test]
    fn test_derivative_tensor_known_entries() {
        let metric = SchwarzschildMetric::new(CentralMass::new(1.0));
        let x = point(10.0, PI / 3.0);
        let dg = metric.derivatives();
        let r_idx = Coordinate::R.index();
        let th_idx = Coordinate::Theta.index();

        // ∂g_tt/∂r = -2M/r²
        assert!((dg[0][0][r_idx].eval(&x) - (-0.02)).abs() < 1e-15);
        // ∂g_θθ/∂r = 2r
        assert!((dg[2][2][r_idx].eval(&x) - 20.0).abs() < 1e-12);
        // ∂g_φφ/∂θ = 2r² sinθ cosθ
        let expected = 2.0 * 100.0 * (PI / 3.0).sin() * (PI / 3.0).cos();
        assert!((dg[3][3][th_idx].eval(&x) - expected).abs() < 1e-12);
        // Nothing depends on t or φ (static, axisymmetric)
        for i in 0..4 {
            for j in 0..4 {
                assert!(dg[i][j][0].is_zero(), "∂g[{i}][{j}]/∂t must vanish");
                assert!(dg[i][j][3].is_zero(), "∂g[{i}][{j}]/∂φ must vanish");
            }
        }
    }

    #[test]
    fn test_degenerate_at_horizon() {
        let metric = SchwarzschildMetric::new(CentralMass::new(1.0));
        let err = metric.evaluate(&point(2.0, PI / 2.0)).unwrap_err();
        assert!(matches!(err, GeodesicError::DegenerateMetric { .. }));
    }

    #[test]
    fn test_degenerate_on_polar_axis() {
        let metric = SchwarzschildMetric::new(CentralMass::new(1.0));
        for theta in [0.0, PI] {
            let err = metric.evaluate(&point(10.0, theta)).unwrap_err();
            assert!(matches!(err, GeodesicError::DegenerateMetric { .. }));
        }
    }

    #[test]
    fn test_flat_limit_components_fold() {
        let metric = SchwarzschildMetric::new(CentralMass::new(0.0));
        // With M = 0 the build-time folding leaves Minkowski constants
        assert_eq!(metric.components()[0][0], Expr::Const(-1.0));
        assert_eq!(metric.components()[1][1], Expr::Const(1.0));
        // and their derivatives vanish exactly
        for k in 0..4 {
            assert!(metric.derivatives()[0][0][k].is_zero());
            assert!(metric.derivatives()[1][1][k].is_zero());
        }
    }
}
