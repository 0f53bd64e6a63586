//! Saint-Venant-Kirchhoff material

use super::{green_strain, ConstitutiveKind, ConstitutiveModel, LameParameters};
use crate::error::FemResult;
use crate::math::{stress_derivative_from_directions, FemScalar, Mat3, StressDerivative};

/// Linear stress-strain law in Green strain.
///
/// ```text
/// E = ½(FᵀF - I)
/// Ψ = μ E:E + ½λ tr(E)²
/// P = F (2μE + λ tr(E) I)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StVenantKirchhoffModel<T> {
    lame: LameParameters<T>,
}

impl<T: FemScalar> StVenantKirchhoffModel<T> {
    pub fn new(youngs_modulus: T, poisson_ratio: T) -> FemResult<Self> {
        Ok(Self {
            lame: LameParameters::from_youngs_poisson(youngs_modulus, poisson_ratio)?,
        })
    }

    pub fn lame_parameters(&self) -> LameParameters<T> {
        self.lame
    }

    /// Second Piola-Kirchhoff stress for a Green strain
    fn second_piola_stress(&self, e: &Mat3<T>) -> Mat3<T> {
        e * (T::from_f64(2.0) * self.lame.mu) + Mat3::identity() * (self.lame.lambda * e.trace())
    }
}

impl<T: FemScalar> ConstitutiveModel<T> for StVenantKirchhoffModel<T> {
    fn kind(&self) -> ConstitutiveKind {
        ConstitutiveKind::StVenantKirchhoff
    }

    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T> {
        let e = green_strain(f);
        let tr = e.trace();
        Ok(self.lame.mu * e.dot(&e) + T::from_f64(0.5) * self.lame.lambda * tr * tr)
    }

    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>> {
        Ok(f * self.second_piola_stress(&green_strain(f)))
    }

    fn first_piola_stress_derivative(&self, f: &Mat3<T>) -> Option<FemResult<StressDerivative<T>>> {
        // dP = dF S + F dS,  dS = S(dE),  dE = ½(dFᵀF + FᵀdF)
        let s = self.second_piola_stress(&green_strain(f));
        let half = T::from_f64(0.5);
        Some(Ok(stress_derivative_from_directions(|df: &Mat3<T>| {
            let de = (df.transpose() * f + f.transpose() * df) * half;
            df * s + f * self.second_piola_stress(&de)
        })))
    }
}
