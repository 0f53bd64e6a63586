//! Constitutive models: stress-strain relationships for hyperelastic solids
//!
//! Every model maps a deformation gradient `F` to an energy density Ψ (J/m³)
//! and the first Piola-Kirchhoff stress `P = ∂Ψ/∂F` (Pa). Some models also
//! provide `∂P/∂F`, which implicit solvers need for the element stiffness.
//!
//! References:
//! - Sifakis & Barbič, "FEM Simulation of 3D Deformable Solids", SIGGRAPH 2012
//!   course notes, §3 (energy densities and Piola stresses used here)

mod any;
mod corotated;
mod linear_elastic;
mod neo_hookean;
mod st_venant_kirchhoff;

use crate::error::{FemError, FemResult};
use crate::math::{FemScalar, Mat3, StressDerivative};

pub use any::{AnyConstitutiveModel, MaterialConfig};
pub use corotated::CorotatedModel;
pub use linear_elastic::LinearElasticModel;
pub use neo_hookean::NeoHookeanModel;
pub use st_venant_kirchhoff::StVenantKirchhoffModel;

/// Capability tag identifying a material law.
///
/// Cache entries carry the tag of the model they were built for, and are
/// rejected when paired with an element bound to a different law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstitutiveKind {
    LinearElastic,
    StVenantKirchhoff,
    Corotated,
    NeoHookean,
    /// User-supplied model; the string is a name chosen by its author
    Custom(&'static str),
}

/// A hyperelastic material law.
///
/// The batched `calc_*` methods are what elements call. They receive the
/// deformation gradients of all quadrature points at once, so a model behind
/// an enum or trait object is dispatched once per evaluation rather than once
/// per quadrature point.
pub trait ConstitutiveModel<T: FemScalar>: Send + Sync {
    fn kind(&self) -> ConstitutiveKind;

    /// Energy density Ψ(F). Ψ(I) = 0.
    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T>;

    /// First Piola-Kirchhoff stress P(F) = ∂Ψ/∂F
    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>>;

    /// ∂P/∂F, or `None` when the model does not provide it
    fn first_piola_stress_derivative(&self, _f: &Mat3<T>) -> Option<FemResult<StressDerivative<T>>> {
        None
    }

    fn calc_energy_density(&self, fs: &[Mat3<T>]) -> FemResult<Vec<T>> {
        fs.iter().map(|f| self.energy_density(f)).collect()
    }

    fn calc_first_piola_stress(&self, fs: &[Mat3<T>]) -> FemResult<Vec<Mat3<T>>> {
        fs.iter().map(|f| self.first_piola_stress(f)).collect()
    }

    fn calc_first_piola_stress_derivative(
        &self,
        fs: &[Mat3<T>],
    ) -> FemResult<Vec<StressDerivative<T>>> {
        fs.iter()
            .map(|f| {
                self.first_piola_stress_derivative(f)
                    .unwrap_or_else(|| Err(FemError::MissingStressDerivative(self.kind())))
            })
            .collect()
    }
}

/// Lamé parameters of an isotropic material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LameParameters<T> {
    /// Shear modulus μ in Pa
    pub mu: T,
    /// First Lamé parameter λ in Pa
    pub lambda: T,
}

impl<T: FemScalar> LameParameters<T> {
    /// Convert Young's modulus and Poisson's ratio.
    ///
    /// μ = E / (2(1 + ν)), λ = Eν / ((1 + ν)(1 - 2ν))
    pub fn from_youngs_poisson(youngs_modulus: T, poisson_ratio: T) -> FemResult<Self> {
        let e = youngs_modulus.value();
        let nu = poisson_ratio.value();
        if !(e > 0.0 && e.is_finite()) {
            return Err(FemError::InvalidMaterial(format!(
                "Young's modulus must be positive, got {e}"
            )));
        }
        if !(nu > -1.0 && nu < 0.5) {
            return Err(FemError::InvalidMaterial(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {nu}"
            )));
        }
        let one = T::one();
        let two = T::from_f64(2.0);
        Ok(Self {
            mu: youngs_modulus / (two * (one + poisson_ratio)),
            lambda: youngs_modulus * poisson_ratio
                / ((one + poisson_ratio) * (one - two * poisson_ratio)),
        })
    }
}

/// Green strain `E = ½(FᵀF - I)`
pub(crate) fn green_strain<T: FemScalar>(f: &Mat3<T>) -> Mat3<T> {
    (f.transpose() * f - Mat3::identity()) * T::from_f64(0.5)
}

/// Rejects deformation gradients with `det(F) ≤ 0`
pub(crate) fn positive_determinant<T: FemScalar>(f: &Mat3<T>) -> FemResult<T> {
    let j = crate::math::determinant(f);
    if j.value() <= 0.0 {
        return Err(FemError::NonPositiveDeterminant(j.value()));
    }
    Ok(j)
}
