// kernels/schwarzschild_geodesic/src/lib.rs

// Schwarzschild Geodesic Integration Core
//
// This library traces timelike and null geodesics through Schwarzschild
// spacetime. The metric, its derivatives, and the Christoffel symbols are
// derived symbolically once per mass configuration; the adaptive integrator
// then evaluates them numerically along the worldline. All computations use
// f64 for maximum precision near the horizon.

pub mod body;
pub mod christoffel;
pub mod error;
pub mod expr;
pub mod geodesic;
pub mod metric;
pub mod solver;
pub mod trajectory;
pub mod types;
pub mod validation;
pub mod velocity;

pub use body::Body;
pub use christoffel::ChristoffelTensor;
pub use error::{FailureReason, GeodesicError, IntegrationFailure};
pub use expr::Expr;
pub use geodesic::{GeodesicField, Spacetime, SpacetimeCache};
pub use metric::{MetricPoint, SchwarzschildMetric};
pub use solver::{OdeSystem, Rkf78, SolverStats, StepController, StepResult, Tolerances};
pub use trajectory::{IntegratorConfig, Trajectory, TrajectoryIntegrator, TrajectorySample};
pub use types::{CentralMass, Coordinate, IntervalNorm};
pub use validation::{interval_norm, ValidationStats};
pub use velocity::normalize_velocity;
