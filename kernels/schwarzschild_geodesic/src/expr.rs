// Symbolic coordinate expressions for the one-time derivation phase
//
// The connection coefficients are derived from the metric exactly once per
// mass configuration, by exact symbolic differentiation and contraction.
// Afterwards the cached expressions are evaluated numerically at each
// coordinate point inside the integration hot loop.
//
// The engine is deliberately tiny: it only needs the operations that appear
// in a static diagonal metric family (rational functions of r plus sin/cos
// of θ). The smart constructors fold constants eagerly, so any entry that is
// identically zero collapses to an exact Const(0.0) rather than surviving as
// a dead subtree. That is what makes the flat-space and zero-entry
// invariants exact instead of approximate.

use crate::types::Coordinate;

// A scalar expression in the four coordinates
//
// The mass parameter is folded in as a numeric constant at build time, so a
// tree is specific to one metric configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Numeric constant
    Const(f64),
    // One of the four coordinates
    Coord(Coordinate),
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    // Multiplicative inverse 1/x
    Recip(Box<Expr>),
    // Integer power x^n
    Pow(Box<Expr>, i32),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
}

impl Expr {
    #[inline]
    pub fn constant(c: f64) -> Expr {
        Expr::Const(c)
    }

    #[inline]
    pub fn coord(c: Coordinate) -> Expr {
        Expr::Coord(c)
    }

    // Sum with constant folding (x + 0 = x)
    pub fn add(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Const(x), Expr::Const(y)) => Expr::Const(x + y),
            (Expr::Const(x), b) if x == 0.0 => b,
            (a, Expr::Const(y)) if y == 0.0 => a,
            (a, b) => Expr::Add(Box::new(a), Box::new(b)),
        }
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::add(a, Expr::neg(b))
    }

    // Product with constant folding (x·0 = 0, x·1 = x)
    pub fn mul(a: Expr, b: Expr) -> Expr {
        match (a, b) {
            (Expr::Const(x), Expr::Const(y)) => Expr::Const(x * y),
            (Expr::Const(x), _) | (_, Expr::Const(x)) if x == 0.0 => Expr::Const(0.0),
            (Expr::Const(x), b) if x == 1.0 => b,
            (a, Expr::Const(y)) if y == 1.0 => a,
            (a, b) => Expr::Mul(Box::new(a), Box::new(b)),
        }
    }

    pub fn neg(a: Expr) -> Expr {
        match a {
            Expr::Const(x) => Expr::Const(-x),
            Expr::Neg(inner) => *inner,
            a => Expr::Neg(Box::new(a)),
        }
    }

    pub fn recip(a: Expr) -> Expr {
        match a {
            // Constant fold only away from zero; 1/0 stays symbolic and
            // evaluates to inf, which the callers detect
            Expr::Const(x) if x != 0.0 => Expr::Const(x.recip()),
            Expr::Recip(inner) => *inner,
            a => Expr::Recip(Box::new(a)),
        }
    }

    pub fn pow(a: Expr, n: i32) -> Expr {
        match (a, n) {
            (_, 0) => Expr::Const(1.0),
            (a, 1) => a,
            (Expr::Const(x), n) => Expr::Const(x.powi(n)),
            (a, n) => Expr::Pow(Box::new(a), n),
        }
    }

    pub fn sin(a: Expr) -> Expr {
        match a {
            Expr::Const(x) => Expr::Const(x.sin()),
            a => Expr::Sin(Box::new(a)),
        }
    }

    pub fn cos(a: Expr) -> Expr {
        match a {
            Expr::Const(x) => Expr::Const(x.cos()),
            a => Expr::Cos(Box::new(a)),
        }
    }

    // Exact partial derivative ∂/∂var
    //
    // The result goes through the same smart constructors, so derivatives of
    // constant or unrelated subtrees fold straight to Const(0.0).
    pub fn diff(&self, var: Coordinate) -> Expr {
        match self {
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Coord(c) => Expr::Const(if *c == var { 1.0 } else { 0.0 }),
            Expr::Add(a, b) => Expr::add(a.diff(var), b.diff(var)),
            // Product rule
            Expr::Mul(a, b) => Expr::add(
                Expr::mul(a.diff(var), (**b).clone()),
                Expr::mul((**a).clone(), b.diff(var)),
            ),
            Expr::Neg(a) => Expr::neg(a.diff(var)),
            // d(1/u) = -u' / u²
            Expr::Recip(a) => Expr::neg(Expr::mul(
                a.diff(var),
                Expr::pow(Expr::recip((**a).clone()), 2),
            )),
            // d(u^n) = n·u^(n-1)·u'
            Expr::Pow(a, n) => Expr::mul(
                Expr::constant(*n as f64),
                Expr::mul(Expr::pow((**a).clone(), n - 1), a.diff(var)),
            ),
            Expr::Sin(a) => Expr::mul(Expr::cos((**a).clone()), a.diff(var)),
            Expr::Cos(a) => Expr::neg(Expr::mul(Expr::sin((**a).clone()), a.diff(var))),
        }
    }

    // Numeric evaluation at a coordinate point [t, r, θ, φ]
    pub fn eval(&self, x: &[f64; 4]) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Coord(c) => x[c.index()],
            Expr::Add(a, b) => a.eval(x) + b.eval(x),
            Expr::Mul(a, b) => a.eval(x) * b.eval(x),
            Expr::Neg(a) => -a.eval(x),
            Expr::Recip(a) => a.eval(x).recip(),
            Expr::Pow(a, n) => a.eval(x).powi(*n),
            Expr::Sin(a) => a.eval(x).sin(),
            Expr::Cos(a) => a.eval(x).cos(),
        }
    }

    // True if the expression folded to an exact zero constant
    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(c) if *c == 0.0)
    }
}
