//! Compressible neo-Hookean material

use super::{positive_determinant, ConstitutiveKind, ConstitutiveModel, LameParameters};
use crate::error::FemResult;
use crate::math::{cofactor, stress_derivative_from_directions, FemScalar, Mat3, StressDerivative};

/// ```text
/// Ψ = ½μ(tr(FᵀF) - 3) - μ ln J + ½λ (ln J)²
/// P = μ(F - F⁻ᵀ) + λ ln J F⁻ᵀ
/// ```
///
/// Undefined for `J = det(F) ≤ 0`; such inputs return
/// [`FemError::NonPositiveDeterminant`](crate::error::FemError::NonPositiveDeterminant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeoHookeanModel<T> {
    lame: LameParameters<T>,
}

impl<T: FemScalar> NeoHookeanModel<T> {
    pub fn new(youngs_modulus: T, poisson_ratio: T) -> FemResult<Self> {
        Ok(Self {
            lame: LameParameters::from_youngs_poisson(youngs_modulus, poisson_ratio)?,
        })
    }

    pub fn lame_parameters(&self) -> LameParameters<T> {
        self.lame
    }

    /// (ln J, F⁻ᵀ)
    fn volumetric_terms(f: &Mat3<T>) -> FemResult<(T, Mat3<T>)> {
        let j = positive_determinant(f)?;
        Ok((j.ln(), cofactor(f) / j))
    }
}

impl<T: FemScalar> ConstitutiveModel<T> for NeoHookeanModel<T> {
    fn kind(&self) -> ConstitutiveKind {
        ConstitutiveKind::NeoHookean
    }

    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T> {
        let j = positive_determinant(f)?;
        let ln_j = j.ln();
        let half = T::from_f64(0.5);
        let LameParameters { mu, lambda } = self.lame;
        Ok(half * mu * (f.dot(f) - T::from_f64(3.0)) - mu * ln_j + half * lambda * ln_j * ln_j)
    }

    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>> {
        let (ln_j, f_inv_t) = Self::volumetric_terms(f)?;
        let LameParameters { mu, lambda } = self.lame;
        Ok((f - f_inv_t) * mu + f_inv_t * (lambda * ln_j))
    }

    fn first_piola_stress_derivative(&self, f: &Mat3<T>) -> Option<FemResult<StressDerivative<T>>> {
        // dP = μ dF + (μ - λ ln J) F⁻ᵀ dFᵀ F⁻ᵀ + λ tr(F⁻¹ dF) F⁻ᵀ
        let (ln_j, f_inv_t) = match Self::volumetric_terms(f) {
            Ok(terms) => terms,
            Err(e) => return Some(Err(e)),
        };
        let LameParameters { mu, lambda } = self.lame;
        Some(Ok(stress_derivative_from_directions(|df: &Mat3<T>| {
            let d_ln_j = f_inv_t.dot(df);
            df * mu
                + f_inv_t * df.transpose() * f_inv_t * (mu - lambda * ln_j)
                + f_inv_t * (lambda * d_ln_j)
        })))
    }
}
