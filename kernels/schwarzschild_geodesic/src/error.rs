// Error taxonomy for the geodesic pipeline
//
// Three caller-visible kinds, none swallowed, no automatic retry:
// - DegenerateMetric: a true coordinate singularity (horizon, polar axis);
//   no numeric trick repairs it, so it surfaces immediately.
// - InvalidVelocity: the requested interval norm is unreachable at the
//   given position; caught before integration ever starts.
// - Integration: the adaptive solver gave up mid-run. Partial results up to
//   the last valid sample ride along with the failure.

use thiserror::Error;

use crate::trajectory::Trajectory;

// Top-level error surface of the crate
#[derive(Debug, Error)]
pub enum GeodesicError {
    // Metric (or its inverse) evaluated where it is singular
    #[error("metric is degenerate at r = {r}, theta = {theta} (horizon or polar axis)")]
    DegenerateMetric { r: f64, theta: f64 },

    // The interval constraint has no real solution for the time component
    #[error(
        "interval norm {epsilon} unreachable at r = {r}: radicand for v_t is {radicand}"
    )]
    InvalidVelocity { r: f64, epsilon: f64, radicand: f64 },

    // Adaptive integration stopped before the end of the span
    #[error(transparent)]
    Integration(#[from] IntegrationFailure),
}

// Why the adaptive solver stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureReason {
    // The error-controlled step size shrank below the solver's floor
    #[error("adaptive step size underflowed")]
    StepSizeUnderflow,

    // Safety limit on the number of internal steps
    #[error("maximum number of integration steps exceeded")]
    MaxStepsExceeded,

    // The trajectory crossed into the singular domain r <= r_s
    #[error("trajectory crossed the Schwarzschild radius")]
    HorizonReached,

    // NaN or infinity appeared in the integrated state
    #[error("non-finite state detected")]
    NonFiniteState,
}

// An integration that ended early, with everything computed so far
//
// This is a recoverable, reportable condition rather than a crash: the
// samples up to the last valid internal step are preserved in `partial`,
// and `reached` is the proper time of the last accepted state.
#[derive(Debug, Error)]
#[error("integration failed at s = {reached}: {reason}")]
pub struct IntegrationFailure {
    pub partial: Trajectory,
    pub reached: f64,
    pub reason: FailureReason,
}
