// Core type definitions for the Schwarzschild geodesic kernel

// ============================================================================
// SPACETIME COORDINATES
// ============================================================================

// The Schwarzschild coordinate chart (t, r, θ, φ)
//
// Physics: These are the natural coordinates for a static, spherically
// symmetric spacetime:
// - t: coordinate time measured by a distant static observer
// - r: areal radius (spheres at fixed r have area 4πr², but r is NOT
//   physical distance from the center)
// - θ: polar angle ∈ [0, π]
// - φ: azimuthal angle ∈ [0, 2π)
//
// The ordering is fixed; every tensor index in this crate is a position
// into this 4-tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coordinate {
    // Coordinate time
    T,
    // Areal radius
    R,
    // Polar angle
    Theta,
    // Azimuthal angle
    Phi,
}

impl Coordinate {
    // All four coordinates in index order
    pub const ALL: [Coordinate; 4] = [
        Coordinate::T,
        Coordinate::R,
        Coordinate::Theta,
        Coordinate::Phi,
    ];

    // Tensor index of this coordinate (position in the ordered 4-tuple)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Coordinate::T => 0,
            Coordinate::R => 1,
            Coordinate::Theta => 2,
            Coordinate::Phi => 3,
        }
    }

    // Human-readable symbol for diagnostics
    pub fn symbol(self) -> &'static str {
        match self {
            Coordinate::T => "t",
            Coordinate::R => "r",
            Coordinate::Theta => "theta",
            Coordinate::Phi => "phi",
        }
    }
}

// ============================================================================
// CENTRAL MASS
// ============================================================================

// The central gravitating body, in geometric units (G = c = 1)
//
// Physics concepts:
// - Mass (M): the single parameter of the Schwarzschild family. We usually
//   work with M = 1 so lengths and times are measured in units of M.
// - Schwarzschild radius r_s = 2M: the event horizon. The coordinate chart
//   degenerates there (g_rr blows up) even though nothing is locally special
//   about that surface.
// - M = 0 is allowed: it gives flat Minkowski spacetime written in
//   spherical coordinates, a useful sanity limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralMass {
    // Mass in geometric units
    pub mass: f64,
}

impl CentralMass {
    // Create a new central mass
    pub fn new(mass: f64) -> Self {
        assert!(mass >= 0.0, "Mass must be non-negative");
        assert!(mass.is_finite(), "Mass must be finite");
        Self { mass }
    }

    // The Schwarzschild radius r_s = 2M (event horizon location)
    #[inline]
    pub fn schwarzschild_radius(&self) -> f64 {
        2.0 * self.mass
    }

    // Check whether a radial coordinate lies strictly outside the horizon
    //
    // The exterior chart (and everything this crate integrates) is only
    // valid for r > r_s.
    #[inline]
    pub fn is_outside_horizon(&self, r: f64) -> bool {
        r > self.schwarzschild_radius()
    }
}

// ============================================================================
// INTERVAL NORM
// ============================================================================

// Target value ε of the spacetime interval g_μν v^μ v^ν for a 4-velocity
//
// Physics: The kind of worldline is encoded in the sign of the interval:
// - Timelike (ε = -1): massive bodies, parameterized by proper time
// - Null (ε = 0): light rays, parameterized by an affine parameter
// - Spacelike (ε = +1): not traversable by any physical signal, but the
//   constraint equation still has solutions when the spatial velocity is
//   large enough (useful for testing the failure path)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalNorm {
    // Massive body: g_μν v^μ v^ν = -1
    Timelike,
    // Light ray: g_μν v^μ v^ν = 0
    Null,
    // Spacelike curve: g_μν v^μ v^ν = +1
    Spacelike,
}

impl Default for IntervalNorm {
    fn default() -> Self {
        Self::Timelike
    }
}

impl IntervalNorm {
    // The target interval value ε
    #[inline]
    pub fn epsilon(self) -> f64 {
        match self {
            IntervalNorm::Timelike => -1.0,
            IntervalNorm::Null => 0.0,
            IntervalNorm::Spacelike => 1.0,
        }
    }

    // Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            IntervalNorm::Timelike => "timelike",
            IntervalNorm::Null => "null",
            IntervalNorm::Spacelike => "spacelike",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ordering() {
        for (i, c) in Coordinate::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_schwarzschild_radius() {
        let m = CentralMass::new(1.0);
        assert_eq!(m.schwarzschild_radius(), 2.0);
        assert!(m.is_outside_horizon(2.0 + 1e-9));
        assert!(!m.is_outside_horizon(2.0));
        assert!(!m.is_outside_horizon(1.5));
    }

    #[test]
    fn test_flat_space_mass_allowed() {
        let m = CentralMass::new(0.0);
        assert_eq!(m.schwarzschild_radius(), 0.0);
        assert!(m.is_outside_horizon(1e-12));
    }

    #[test]
    fn test_interval_norm_values() {
        assert_eq!(IntervalNorm::Timelike.epsilon(), -1.0);
        assert_eq!(IntervalNorm::Null.epsilon(), 0.0);
        assert_eq!(IntervalNorm::Spacelike.epsilon(), 1.0);
        assert_eq!(IntervalNorm::default(), IntervalNorm::Timelike);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_negative_mass_rejected() {
        CentralMass::new(-1.0);
    }
}
