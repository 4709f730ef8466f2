//! Closed-form real roots of scalar quadratics and of the 2x2 symmetric
//! generalized eigenvalue pencil.


use crate::moments::Covariance2;

/// Real roots of a quadratic, ordered ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Roots {
    /// Negative discriminant, or a degenerate equation without a finite root.
    None,
    /// Leading coefficient is zero; the linear remainder has one root. The
    /// quadratic's other root has moved to infinity.
    Single(f64),
    /// Zero discriminant.
    Double(f64),
    Two(f64, f64),
}

impl Roots {
    pub fn is_empty(&self) -> bool {
        matches!(self, Roots::None)
    }

    /// Roots with multiplicity: a double root is yielded twice.
    pub fn values(self) -> impl Iterator<Item = f64> {
        let pair = match self {
            Roots::None => [None, None],
            Roots::Single(x) => [Some(x), None],
            Roots::Double(x) => [Some(x), Some(x)],
            Roots::Two(x0, x1) => [Some(x0), Some(x1)],
        };
        pair.into_iter().flatten()
    }
}

/// Real roots of `a·x² + b·x + c = 0`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    roots_with_discriminant(a, b, c, b * b - 4.0 * a * c)
}

/// Generalized eigenvalues of the pencil formed by the test and reference
/// chrominance covariances, as the roots of
/// `det(M)·λ² − (a·br + b·ar − 2·c·cr)·λ + det(R) = 0`.
///
/// Both matrices are first scaled by a common power of two, which leaves the
/// eigenvalues unchanged and keeps the products below finite for any input
/// magnitude.
///
/// The discriminant is evaluated as
/// `(a·br − b·ar)² + 4·(a·cr − c·ar)·(b·cr − c·br)`, which is algebraically
/// `B² − 4AC` but vanishes exactly for identical matrices and is bitwise
/// invariant under swapping `test` and `reference`.
///
/// A singular `test` matrix gives [`Roots::Single`]: one eigenvalue is at
/// infinity. A singular `reference` matrix gives an exact zero root.
pub fn generalized_eigenvalues(test: &Covariance2, reference: &Covariance2) -> Roots {
    let (m, r) = normalize_pair(test, reference);

    let a = m.determinant();
    let b = -(m.a * r.b + r.a * m.b - 2.0 * m.c * r.c);
    let c = r.determinant();

    let cross = m.a * r.b - m.b * r.a;
    let discriminant = cross * cross + 4.0 * (m.a * r.c - m.c * r.a) * (m.b * r.c - m.c * r.b);

    roots_with_discriminant(a, b, c, discriminant)
}

/// Scales both matrices by `2^-e` so the largest entry is in `[1, 2)`.
/// Power-of-two factors are exact, so identical inputs stay identical.
fn normalize_pair(test: &Covariance2, reference: &Covariance2) -> (Covariance2, Covariance2) {
    let largest = [
        test.a, test.b, test.c, reference.a, reference.b, reference.c,
    ]
    .iter()
    .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if largest == 0.0 || !largest.is_finite() {
        return (*test, *reference);
    }

    let exponent = largest.log2().floor().clamp(-1000.0, 1000.0) as i32;
    let factor = 2.0f64.powi(-exponent);
    (test.scaled(factor), reference.scaled(factor))
}

fn roots_with_discriminant(a: f64, b: f64, c: f64, discriminant: f64) -> Roots {
    if a == 0.0 {
        // Linear remainder b·x + c = 0.
        return if b == 0.0 {
            Roots::None
        } else {
            Roots::Single(-c / b)
        };
    }
    if discriminant < 0.0 || discriminant.is_nan() {
        return Roots::None;
    }
    if discriminant == 0.0 {
        return Roots::Double(-b / (2.0 * a));
    }

    // q never vanishes here: b == 0 with d > 0 still leaves sqrt(d).
    // Dividing c by q keeps the small root accurate and exactly 0 when c == 0.
    let sqrt_d = discriminant.sqrt();
    let q = -0.5 * (b + b.signum() * sqrt_d);
    let x0 = q / a;
    let x1 = c / q;
    Roots::Two(x0.min(x1), x0.max(x1))
}
