//! Fixed corotated material

use super::{positive_determinant, ConstitutiveKind, ConstitutiveModel, LameParameters};
use crate::error::{FemError, FemResult};
use crate::math::{cofactor, max_abs_entry, try_inverse, FemScalar, Mat3};

const POLAR_MAX_ITERATIONS: usize = 100;
const POLAR_TOLERANCE: f64 = 1e-14;

/// Corotated linear elasticity with the volumetric term taken in J.
///
/// ```text
/// F = RS (polar decomposition)
/// Ψ = μ‖F - R‖² + ½λ(J - 1)²
/// P = 2μ(F - R) + λ(J - 1) J F⁻ᵀ
/// ```
///
/// Provides no stress derivative; elements using this model get their force
/// derivatives from dual-number evaluation instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorotatedModel<T> {
    lame: LameParameters<T>,
}

impl<T: FemScalar> CorotatedModel<T> {
    pub fn new(youngs_modulus: T, poisson_ratio: T) -> FemResult<Self> {
        Ok(Self {
            lame: LameParameters::from_youngs_poisson(youngs_modulus, poisson_ratio)?,
        })
    }

    pub fn lame_parameters(&self) -> LameParameters<T> {
        self.lame
    }
}

/// Rotation factor `R` of `F = RS`, by the Newton iteration
/// `R ← ½(R + R⁻ᵀ)`. Only arithmetic is used, so derivatives carried by
/// dual numbers propagate through the iteration.
pub fn polar_rotation<T: FemScalar>(f: &Mat3<T>) -> FemResult<Mat3<T>> {
    positive_determinant(f)?;
    let half = T::from_f64(0.5);
    let mut r = *f;
    let mut converged = false;
    for _ in 0..POLAR_MAX_ITERATIONS {
        let r_inv = try_inverse(&r).ok_or(FemError::NonPositiveDeterminant(0.0))?;
        let next = (r + r_inv.transpose()) * half;
        let change = max_abs_entry(&(next - r));
        r = next;
        if converged {
            // One extra step after the values settle lets the derivative
            // part settle as well.
            break;
        }
        converged = change <= POLAR_TOLERANCE;
    }
    Ok(r)
}

impl<T: FemScalar> ConstitutiveModel<T> for CorotatedModel<T> {
    fn kind(&self) -> ConstitutiveKind {
        ConstitutiveKind::Corotated
    }

    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T> {
        let r = polar_rotation(f)?;
        let j_minus_one = crate::math::determinant(f) - T::one();
        let diff = f - r;
        Ok(self.lame.mu * diff.dot(&diff)
            + T::from_f64(0.5) * self.lame.lambda * j_minus_one * j_minus_one)
    }

    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>> {
        let r = polar_rotation(f)?;
        let j_minus_one = crate::math::determinant(f) - T::one();
        Ok((f - r) * (T::from_f64(2.0) * self.lame.mu) + cofactor(f) * (self.lame.lambda * j_minus_one))
    }
}
