// Geodesic acceleration field and the per-mass spacetime bundle

use std::collections::HashMap;
use std::sync::Arc;

use crate::christoffel::ChristoffelTensor;
use crate::metric::SchwarzschildMetric;
use crate::solver::OdeSystem;
use crate::types::CentralMass;

// ============================================================================
// SPACETIME BUNDLE
// ============================================================================

// Everything derived from one mass configuration, built once and immutable
//
// The Christoffel tensor is the only computation worth memoizing in this
// crate, and it lives behind an Arc: cloning a Spacetime (or handing it to
// another thread) shares the derived connection instead of re-deriving it.
#[derive(Debug, Clone)]
pub struct Spacetime {
    mass: CentralMass,
    metric: Arc<SchwarzschildMetric>,
    connection: Arc<ChristoffelTensor>,
}

impl Spacetime {
    // Derive metric, inverse, derivatives, and connection for a mass
    pub fn new(mass: f64) -> Self {
        let mass = CentralMass::new(mass);
        let metric = SchwarzschildMetric::new(mass);
        let connection = ChristoffelTensor::derive(&metric);
        Self {
            mass,
            metric: Arc::new(metric),
            connection: Arc::new(connection),
        }
    }

    pub fn mass(&self) -> CentralMass {
        self.mass
    }

    pub fn metric(&self) -> &SchwarzschildMetric {
        &self.metric
    }

    pub fn connection(&self) -> &ChristoffelTensor {
        &self.connection
    }

    // Shared handle to the cached connection
    pub fn connection_handle(&self) -> Arc<ChristoffelTensor> {
        Arc::clone(&self.connection)
    }
}

// Cache of derived spacetimes keyed by mass
//
// Batch runs (several bodies orbiting the same central mass) must share one
// derived connection rather than re-deriving it per body. Keyed by the bit
// pattern of the mass so distinct but equal f64 values hit the same entry.
#[derive(Debug, Default)]
pub struct SpacetimeCache {
    entries: HashMap<u64, Spacetime>,
}

impl SpacetimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Fetch the spacetime for a mass, deriving it on first use
    pub fn get_or_derive(&mut self, mass: f64) -> &Spacetime {
        self.entries
            .entry(mass.to_bits())
            .or_insert_with(|| Spacetime::new(mass))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// GEODESIC ACCELERATION FIELD
// ============================================================================

// The right-hand side of the geodesic equation
//
// Physics: A freely falling body follows
//
//   d²x^μ/ds² = -Γ^μ_αβ (dx^α/ds)(dx^β/ds)
//
// Treating position and velocity jointly as an 8-vector y = (x, v) reduces
// this to the first-order system dy/ds = (v, a). The field holds a shared
// handle to the cached connection; nothing symbolic happens per call, only
// numeric substitution of the current point (exactly once per evaluation)
// followed by the double contraction against the velocity.
#[derive(Debug, Clone)]
pub struct GeodesicField {
    connection: Arc<ChristoffelTensor>,
}

impl GeodesicField {
    pub fn new(spacetime: &Spacetime) -> Self {
        Self {
            connection: spacetime.connection_handle(),
        }
    }

    // The 4-vector acceleration a^μ = -Γ^μ_αβ v^α v^β at (x, v)
    pub fn acceleration(&self, x: &[f64; 4], v: &[f64; 4]) -> [f64; 4] {
        let mut gamma = [[[0.0; 4]; 4]; 4];
        self.connection.evaluate(x, &mut gamma);

        let mut a = [0.0; 4];
        for mu in 0..4 {
            let mut sum = 0.0;
            for alpha in 0..4 {
                for beta in 0..4 {
                    sum += gamma[mu][alpha][beta] * v[alpha] * v[beta];
                }
            }
            a[mu] = -sum;
        }
        a
    }
}

impl OdeSystem<8> for GeodesicField {
    fn rhs(&self, _s: f64, y: &[f64; 8], dyds: &mut [f64; 8]) {
        let x = [y[0], y[1], y[2], y[3]];
        let v = [y[4], y[5], y[6], y[7]];
        let a = self.acceleration(&x, &v);
        dyds[..4].copy_from_slice(&v);
        dyds[4..].copy_from_slice(&a);
    }
}
