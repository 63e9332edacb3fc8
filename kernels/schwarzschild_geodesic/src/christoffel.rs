// Christoffel symbols of the Levi-Civita connection
//
// This module performs the single expensive symbolic step of the pipeline:
// contracting the inverse metric against the metric derivatives to produce
// the 64 connection coefficients
//
//   Γ^μ_αβ = ½ Σ_λ g^μλ ( ∂g_λα/∂x^β + ∂g_λβ/∂x^α - ∂g_αβ/∂x^λ )
//
// The derivation happens exactly once per mass configuration and the result
// is cached; the integration loop only ever performs numeric substitution
// into the cached expressions. The contraction index λ runs over the four
// coordinates in ascending order; since the build is exact symbolic
// arithmetic, the summation order cannot affect the result.

use crate::expr::Expr;
use crate::metric::SchwarzschildMetric;

// ============================================================================
// CHRISTOFFEL TENSOR
// ============================================================================

// The rank-3 array of connection coefficients for one mass configuration
//
// Symmetric under exchange of the two lower indices by construction:
// Γ^μ_αβ = Γ^μ_βα. For the Schwarzschild family most entries are
// identically zero; the smart constructors in the expression engine fold
// them to exact Const(0.0), and `nonzero` lists the survivors (with α ≤ β)
// so numeric evaluation touches only those.
#[derive(Debug, Clone)]
pub struct ChristoffelTensor {
    mass: f64,
    symbols: [[[Expr; 4]; 4]; 4],
    // Indices (μ, α, β) with α ≤ β of entries that did not fold to zero
    nonzero: Vec<(usize, usize, usize)>,
}

impl ChristoffelTensor {
    // Derive the connection from a metric model
    //
    // This walks the general index formula; the diagonal structure of the
    // Schwarzschild metric is exploited only implicitly, through the
    // constant folding that erases every term multiplied by a zero
    // component.
    pub fn derive(metric: &SchwarzschildMetric) -> Self {
        let g_inv = metric.inverse();
        let dg = metric.derivatives();

        let mut symbols: [[[Expr; 4]; 4]; 4] = std::array::from_fn(|_| {
            std::array::from_fn(|_| std::array::from_fn(|_| Expr::constant(0.0)))
        });

        for mu in 0..4 {
            for alpha in 0..4 {
                // Only α ≤ β is derived; the mirror entry is a clone
                for beta in alpha..4 {
                    let mut sum = Expr::constant(0.0);
                    for lambda in 0..4 {
                        let term = Expr::sub(
                            Expr::add(
                                dg[lambda][alpha][beta].clone(),
                                dg[lambda][beta][alpha].clone(),
                            ),
                            dg[alpha][beta][lambda].clone(),
                        );
                        sum = Expr::add(sum, Expr::mul(g_inv[mu][lambda].clone(), term));
                    }
                    let gamma = Expr::mul(Expr::constant(0.5), sum);
                    symbols[mu][beta][alpha] = gamma.clone();
                    symbols[mu][alpha][beta] = gamma;
                }
            }
        }

        let mut nonzero = Vec::new();
        for mu in 0..4 {
            for alpha in 0..4 {
                for beta in alpha..4 {
                    if !symbols[mu][alpha][beta].is_zero() {
                        nonzero.push((mu, alpha, beta));
                    }
                }
            }
        }

        Self {
            mass: metric.mass().mass,
            symbols,
            nonzero,
        }
    }

    // Mass configuration this tensor was derived for
    pub fn mass(&self) -> f64 {
        self.mass
    }

    // Symbolic entry Γ^μ_αβ
    pub fn symbol(&self, mu: usize, alpha: usize, beta: usize) -> &Expr {
        &self.symbols[mu][alpha][beta]
    }

    // Number of entries (α ≤ β) that survived folding
    pub fn nonzero_count(&self) -> usize {
        self.nonzero.len()
    }

    // Numeric evaluation at a coordinate point
    //
    // Substitution happens exactly once per call: each surviving entry is
    // evaluated a single time and mirrored into its symmetric partner, and
    // folded-away entries cost nothing.
    pub fn evaluate(&self, x: &[f64; 4], out: &mut [[[f64; 4]; 4]; 4]) {
        *out = [[[0.0; 4]; 4]; 4];
        for &(mu, alpha, beta) in &self.nonzero {
            let value = self.symbols[mu][alpha][beta].eval(x);
            out[mu][alpha][beta] = value;
            if alpha != beta {
                out[mu][beta][alpha] = value;
            }
        }
    }
}
