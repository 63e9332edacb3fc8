// Embedded Runge-Kutta-Fehlberg 7(8) stepper with adaptive step control
//
// The 13-stage pair from Fehlberg's NASA TR R-287 (Table X): the 8th-order
// solution advances the state, the embedded 7th-order solution prices each
// step. Geodesics near a horizon have wildly varying curvature along the
// worldline, so a fixed step either wastes work far out or blows up close
// in; the embedded pair lets the controller ride the local error estimate.

use crate::error::FailureReason;

// ============================================================================
// BUTCHER TABLEAU (Fehlberg 1968, Table X)
// ============================================================================

pub const STAGES: usize = 13;

// Nodes c_i: stage i samples the right-hand side at s + c_i * h
const C: [f64; STAGES] = [
    0.0,
    2.0 / 27.0,
    1.0 / 9.0,
    1.0 / 6.0,
    5.0 / 12.0,
    1.0 / 2.0,
    5.0 / 6.0,
    1.0 / 6.0,
    2.0 / 3.0,
    1.0 / 3.0,
    1.0,
    0.0,
    1.0,
];

// Stage coupling a_ij (lower triangular, row i uses columns j < i)
#[rustfmt::skip]
const A: [[f64; 12]; STAGES] = [
    [0.0; 12],
    [2.0/27.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0/36.0, 1.0/12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0/24.0, 0.0, 1.0/8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [5.0/12.0, 0.0, -25.0/16.0, 25.0/16.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0/20.0, 0.0, 0.0, 1.0/4.0, 1.0/5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-25.0/108.0, 0.0, 0.0, 125.0/108.0, -65.0/27.0, 125.0/54.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [31.0/300.0, 0.0, 0.0, 0.0, 61.0/225.0, -2.0/9.0, 13.0/900.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [2.0, 0.0, 0.0, -53.0/6.0, 704.0/45.0, -107.0/9.0, 67.0/90.0, 3.0, 0.0, 0.0, 0.0, 0.0],
    [-91.0/108.0, 0.0, 0.0, 23.0/108.0, -976.0/135.0, 311.0/54.0, -19.0/60.0, 17.0/6.0, -1.0/12.0, 0.0, 0.0, 0.0],
    [2383.0/4100.0, 0.0, 0.0, -341.0/164.0, 4496.0/1025.0, -301.0/82.0, 2133.0/4100.0, 45.0/82.0, 45.0/164.0, 18.0/41.0, 0.0, 0.0],
    [3.0/205.0, 0.0, 0.0, 0.0, 0.0, -6.0/41.0, -3.0/205.0, -3.0/41.0, 3.0/41.0, 6.0/41.0, 0.0, 0.0],
    [-1777.0/4100.0, 0.0, 0.0, -341.0/164.0, 4496.0/1025.0, -289.0/82.0, 2193.0/4100.0, 51.0/82.0, 33.0/164.0, 12.0/41.0, 0.0, 1.0],
];

// 8th-order weights b_i. Stages 11 and 12 contribute only to the error
// estimate, so their weights are zero here.
#[rustfmt::skip]
const B: [f64; STAGES] = [
    41.0/840.0, 0.0, 0.0, 0.0, 0.0,
    34.0/105.0, 9.0/35.0, 9.0/35.0, 9.0/280.0, 9.0/280.0,
    41.0/840.0, 0.0, 0.0,
];

// The 7th-order weights differ from B only at stages 0, 10, 11, 12, all by
// the same magnitude, so the truncation error collapses to
//
//   TE = (41/840) * h * (k_0 + k_10 - k_11 - k_12)
//
const ERR_WEIGHT: f64 = 41.0 / 840.0;

// ============================================================================
// ODE SYSTEM INTERFACE
// ============================================================================

// A first-order system dy/ds = f(s, y) of fixed dimension N
pub trait OdeSystem<const N: usize> {
    // Write f(s, y) into dyds
    fn rhs(&self, s: f64, y: &[f64; N], dyds: &mut [f64; N]);
}

// ============================================================================
// STEP CONTROL
// ============================================================================

// Per-component absolute and relative error tolerances
//
// A step is accepted when every component satisfies
// |y8 - y7| <= atol + rtol * |y8|.
#[derive(Debug, Clone)]
pub struct Tolerances<const N: usize> {
    pub atol: [f64; N],
    pub rtol: [f64; N],
}

impl<const N: usize> Tolerances<N> {
    // Uniform tolerances across all components
    pub fn new(atol: f64, rtol: f64) -> Self {
        assert!(atol > 0.0 && atol.is_finite(), "atol must be positive");
        assert!(rtol >= 0.0 && rtol.is_finite(), "rtol must be non-negative");
        Self {
            atol: [atol; N],
            rtol: [rtol; N],
        }
    }

    pub fn with_components(atol: [f64; N], rtol: [f64; N]) -> Self {
        Self { atol, rtol }
    }
}

// I-controller: h_new = safety * h * error^(-1/8)
//
// Exponent is 1/(p+1) with p = 7, the order of the error estimate. Growth
// and shrink factors are clamped so one freak error estimate can't swing
// the step size by orders of magnitude.
#[derive(Debug, Clone)]
pub struct StepController {
    pub safety: f64,
    pub max_factor: f64,
    pub min_factor: f64,
    exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
            exponent: 1.0 / 8.0,
        }
    }
}

impl StepController {
    pub fn factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        // NaN error falls through powf as NaN; clamp pins it to min_factor
        let raw = self.safety * error.powf(-self.exponent);
        if raw.is_nan() {
            return self.min_factor;
        }
        raw.clamp(self.min_factor, self.max_factor)
    }
}

// ============================================================================
// STEPPER
// ============================================================================

// One attempted step: the candidate state, its normalized error, and the
// controller's suggestion for the next step size.
#[derive(Debug, Clone)]
pub struct StepResult<const N: usize> {
    pub y: [f64; N],
    pub s: f64,
    pub error: f64,
    pub h_next: f64,
    pub accepted: bool,
}

// Work counters for diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverStats {
    pub rhs_evals: u64,
    pub accepted_steps: u64,
    pub rejected_steps: u64,
}

pub struct Rkf78<const N: usize> {
    tol: Tolerances<N>,
    controller: StepController,
    pub h_min: f64,
    pub h_max: f64,
    pub max_steps: u64,
    // Stage workspace, reused across steps
    k: [[f64; N]; STAGES],
    pub stats: SolverStats,
}

impl<const N: usize> Rkf78<N> {
    pub fn new(tol: Tolerances<N>) -> Self {
        Self {
            tol,
            controller: StepController::default(),
            h_min: 1e-14,
            h_max: f64::INFINITY,
            max_steps: 1_000_000,
            k: [[0.0; N]; STAGES],
            stats: SolverStats::default(),
        }
    }

    // Attempt one step of size h from (s, y)
    //
    // Runs all 13 stages, forms the 8th-order candidate, and prices it with
    // the embedded estimate. Rejection is the caller's signal to retry from
    // the same state with h_next.
    pub fn step<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        s: f64,
        y: &[f64; N],
        h: f64,
    ) -> StepResult<N> {
        let h = h.signum() * h.abs().clamp(self.h_min, self.h_max);

        self.compute_stages(sys, s, y, h);
        let y8 = self.advance(y, h);
        let error = self.normalized_error(&y8, h);

        // NaN never compares <= 1.0, so a poisoned estimate rejects the step
        let accepted = error <= 1.0;
        let h_next = (h.abs() * self.controller.factor(error)).clamp(self.h_min, self.h_max);

        self.stats.rhs_evals += STAGES as u64;
        if accepted {
            self.stats.accepted_steps += 1;
        } else {
            self.stats.rejected_steps += 1;
        }

        StepResult {
            y: y8,
            s: s + h,
            error,
            h_next,
            accepted,
        }
    }

    // Drive steps from s0 to sf, returning the final state
    pub fn integrate<S: OdeSystem<N>>(
        &mut self,
        sys: &S,
        s0: f64,
        y0: &[f64; N],
        sf: f64,
        h0: f64,
    ) -> Result<(f64, [f64; N]), FailureReason> {
        if s0 == sf {
            return Ok((s0, *y0));
        }

        let direction = (sf - s0).signum();
        let mut s = s0;
        let mut y = *y0;
        let mut h = h0.abs() * direction;
        let mut steps = 0u64;

        while (sf - s) * direction > self.h_min {
            // Clamp the final step to land exactly on sf
            if (s + h - sf) * direction > 0.0 {
                h = sf - s;
            }

            let result = self.step(sys, s, &y, h);

            if result.accepted {
                s = result.s;
                y = result.y;
                if !y.iter().all(|v| v.is_finite()) {
                    return Err(FailureReason::NonFiniteState);
                }
            } else if result.h_next <= self.h_min {
                return Err(FailureReason::StepSizeUnderflow);
            }

            h = result.h_next * direction;

            steps += 1;
            if steps > self.max_steps {
                return Err(FailureReason::MaxStepsExceeded);
            }
        }

        Ok((s, y))
    }

    fn compute_stages<S: OdeSystem<N>>(&mut self, sys: &S, s: f64, y: &[f64; N], h: f64) {
        sys.rhs(s, y, &mut self.k[0]);

        let mut y_stage = [0.0; N];
        for i in 1..STAGES {
            for n in 0..N {
                let mut sum = 0.0;
                for (j, k_j) in self.k.iter().enumerate().take(i) {
                    sum += A[i][j] * k_j[n];
                }
                y_stage[n] = y[n] + h * sum;
            }
            sys.rhs(s + C[i] * h, &y_stage, &mut self.k[i]);
        }
    }

    fn advance(&self, y: &[f64; N], h: f64) -> [f64; N] {
        std::array::from_fn(|n| {
            let mut sum = 0.0;
            for i in 0..STAGES {
                sum += B[i] * self.k[i][n];
            }
            y[n] + h * sum
        })
    }

    // Infinity norm of the truncation error scaled per component by
    // atol + rtol * |y8|; values <= 1.0 mean every component is within
    // tolerance.
    fn normalized_error(&self, y8: &[f64; N], h: f64) -> f64 {
        let mut worst: f64 = 0.0;
        for n in 0..N {
            let te = ERR_WEIGHT
                * h
                * (self.k[0][n] + self.k[10][n] - self.k[11][n] - self.k[12][n]);
            let scale = self.tol.atol[n] + self.tol.rtol[n] * y8[n].abs();
            worst = worst.max(te.abs() / scale);
        }
        worst
    }
}

// Hermite cubic interpolation across one accepted step
//
// Given the states and right-hand sides at both endpoints, reconstructs
// y(s) for s in [s_a, s_b] with O(h⁴) accuracy. Used to place trajectory
// samples inside steps without shrinking the step size to the sample grid.
pub fn hermite_interpolate<const N: usize>(
    s: f64,
    s_a: f64,
    y_a: &[f64; N],
    f_a: &[f64; N],
    s_b: f64,
    y_b: &[f64; N],
    f_b: &[f64; N],
) -> [f64; N] {
    let dt = s_b - s_a;
    let alpha = (s - s_a) / dt;
    let a2 = alpha * alpha;
    let a3 = a2 * alpha;

    let h00 = 1.0 - 3.0 * a2 + 2.0 * a3;
    let h10 = alpha - 2.0 * a2 + a3;
    let h01 = 3.0 * a2 - 2.0 * a3;
    let h11 = a3 - a2;

    std::array::from_fn(|i| {
        h00 * y_a[i] + h10 * dt * f_a[i] + h01 * y_b[i] + h11 * dt * f_b[i]
    })
}
