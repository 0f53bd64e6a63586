//! Small-strain linear elasticity

use super::{ConstitutiveKind, ConstitutiveModel, LameParameters};
use crate::error::FemResult;
use crate::math::{stress_derivative_from_directions, FemScalar, Mat3, StressDerivative};

/// Isotropic linear elasticity written in terms of F.
///
/// ```text
/// ε = ½(F + Fᵀ) - I
/// Ψ = μ ε:ε + ½λ tr(ε)²
/// P = 2με + λ tr(ε) I
/// ```
///
/// Not invariant under rotation of the current configuration; use one of the
/// finite-strain models when large rotations occur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearElasticModel<T> {
    youngs_modulus: T,
    poisson_ratio: T,
    lame: LameParameters<T>,
}

impl<T: FemScalar> LinearElasticModel<T> {
    pub fn new(youngs_modulus: T, poisson_ratio: T) -> FemResult<Self> {
        Ok(Self {
            youngs_modulus,
            poisson_ratio,
            lame: LameParameters::from_youngs_poisson(youngs_modulus, poisson_ratio)?,
        })
    }

    pub fn youngs_modulus(&self) -> T {
        self.youngs_modulus
    }

    pub fn poisson_ratio(&self) -> T {
        self.poisson_ratio
    }

    pub fn lame_parameters(&self) -> LameParameters<T> {
        self.lame
    }

    fn strain(f: &Mat3<T>) -> Mat3<T> {
        (f + f.transpose()) * T::from_f64(0.5) - Mat3::identity()
    }
}

impl<T: FemScalar> ConstitutiveModel<T> for LinearElasticModel<T> {
    fn kind(&self) -> ConstitutiveKind {
        ConstitutiveKind::LinearElastic
    }

    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T> {
        let eps = Self::strain(f);
        let tr = eps.trace();
        Ok(self.lame.mu * eps.dot(&eps) + T::from_f64(0.5) * self.lame.lambda * tr * tr)
    }

    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>> {
        let eps = Self::strain(f);
        Ok(eps * (T::from_f64(2.0) * self.lame.mu) + Mat3::identity() * (self.lame.lambda * eps.trace()))
    }

    fn first_piola_stress_derivative(&self, _f: &Mat3<T>) -> Option<FemResult<StressDerivative<T>>> {
        // Constant: dP = μ(dF + dFᵀ) + λ tr(dF) I
        let Self { lame, .. } = *self;
        Some(Ok(stress_derivative_from_directions(|df: &Mat3<T>| {
            (df + df.transpose()) * lame.mu + Mat3::identity() * (lame.lambda * df.trace())
        })))
    }
}
