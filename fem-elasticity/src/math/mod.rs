//! Scalar abstraction and small dense linear algebra used by the kernel

pub mod dual;

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::{Matrix3, SMatrix, Vector3};
use num_traits::{One, Zero};

pub use dual::Dual;

pub type Mat3<T> = Matrix3<T>;
pub type Vec3<T> = Vector3<T>;

/// ∂P/∂F as a 9x9 matrix. Entry `(i + 3j, k + 3l)` holds ∂P_ij/∂F_kl, which
/// is the column-major flattening nalgebra uses for 3x3 storage.
pub type StressDerivative<T> = SMatrix<T, 9, 9>;

/// Numeric capability the kernel is written against.
///
/// Implemented by `f64` for plain evaluation and by [`Dual`] for exact
/// forward-mode sensitivities, so the same code path serves both.
pub trait FemScalar:
    nalgebra::Scalar
    + Copy
    + Debug
    + Send
    + Sync
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// Lift a constant into this scalar type
    fn from_f64(value: f64) -> Self;

    /// The plain value, dropping any derivative part
    fn value(&self) -> f64;

    fn sqrt(self) -> Self;

    /// Natural logarithm
    fn ln(self) -> Self;

    fn abs(self) -> Self {
        if self.value() < 0.0 {
            -self
        } else {
            self
        }
    }
}

impl FemScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn value(&self) -> f64 {
        *self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}

/// Determinant of a 3x3 matrix by cofactor expansion
pub fn determinant<T: FemScalar>(m: &Mat3<T>) -> T {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

/// Cofactor matrix, `cof(M) = det(M) M⁻ᵀ`. Defined for singular matrices too.
pub fn cofactor<T: FemScalar>(m: &Mat3<T>) -> Mat3<T> {
    let c = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
    };
    Mat3::new(
        c(1, 2, 1, 2),
        -c(1, 2, 0, 2),
        c(1, 2, 0, 1),
        -c(0, 2, 1, 2),
        c(0, 2, 0, 2),
        -c(0, 2, 0, 1),
        c(0, 1, 1, 2),
        -c(0, 1, 0, 2),
        c(0, 1, 0, 1),
    )
}

/// Inverse of a 3x3 matrix, `None` when the determinant is exactly zero
pub fn try_inverse<T: FemScalar>(m: &Mat3<T>) -> Option<Mat3<T>> {
    let det = determinant(m);
    if det.value() == 0.0 || !det.value().is_finite() {
        return None;
    }
    Some(cofactor(m).transpose() / det)
}

/// Largest absolute entry, used as a length scale for singularity checks
pub fn max_abs_entry<T: FemScalar>(m: &Mat3<T>) -> f64 {
    m.iter().fold(0.0_f64, |acc, x| acc.max(x.value().abs()))
}

/// Build ∂P/∂F column by column from the directional derivative `dP(dF)`,
/// evaluated at every unit direction `dF = e_k e_lᵀ`.
pub fn stress_derivative_from_directions<T, D>(directional: D) -> StressDerivative<T>
where
    T: FemScalar,
    D: Fn(&Mat3<T>) -> Mat3<T>,
{
    let mut dpdf = StressDerivative::<T>::zeros();
    for l in 0..3 {
        for k in 0..3 {
            let mut df = Mat3::<T>::zeros();
            df[(k, l)] = T::one();
            let dp = directional(&df);
            for j in 0..3 {
                for i in 0..3 {
                    dpdf[(i + 3 * j, k + 3 * l)] = dp[(i, j)];
                }
            }
        }
    }
    dpdf
}

/// Contract ∂P/∂F with a perturbation: `dP_ij = Σ_kl ∂P_ij/∂F_kl dF_kl`
pub fn contract_stress_derivative<T: FemScalar>(
    dpdf: &StressDerivative<T>,
    df: &Mat3<T>,
) -> Mat3<T> {
    let mut dp = Mat3::<T>::zeros();
    for j in 0..3 {
        for i in 0..3 {
            let mut sum = T::zero();
            for l in 0..3 {
                for k in 0..3 {
                    sum += dpdf[(i + 3 * j, k + 3 * l)] * df[(k, l)];
                }
            }
            dp[(i, j)] = sum;
        }
    }
    dp
}

/// Rotation about a unit axis by `angle` radians (Rodrigues)
pub fn rotation_matrix(axis: &Vec3<f64>, angle: f64) -> Mat3<f64> {
    let n = axis.normalize();
    let k = Mat3::new(0.0, -n.z, n.y, n.z, 0.0, -n.x, -n.y, n.x, 0.0);
    Mat3::identity() + k * angle.sin() + k * k * (1.0 - angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Mat3<f64> {
        Mat3::new(2.0, 1.0, 3.0, 4.0, 6.0, 5.0, 2.0, 8.0, 9.0)
    }

    #[test]
    fn test_determinant_matches_nalgebra() {
        let m = sample();
        assert_relative_eq!(determinant(&m), m.determinant(), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse() {
        let m = sample();
        let inv = try_inverse(&m).unwrap();
        assert_relative_eq!(m * inv, Mat3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Mat3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        assert!(try_inverse(&m).is_none());
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = rotation_matrix(&Vec3::new(1.0, 2.0, -0.5), 0.7);
        assert_relative_eq!(r.transpose() * r, Mat3::identity(), epsilon = 1e-12);
        assert_relative_eq!(determinant(&r), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_contract_round_trips_directions() {
        // dP = 2 dF + tr(dF) I
        let dpdf = stress_derivative_from_directions(|df: &Mat3<f64>| {
            df * 2.0 + Mat3::identity() * df.trace()
        });
        let df = sample();
        let expected = df * 2.0 + Mat3::identity() * df.trace();
        assert_relative_eq!(contract_stress_derivative(&dpdf, &df), expected, epsilon = 1e-12);
    }
}
