//! Run-time selection of a material law

use serde::{Deserialize, Serialize};

use super::{
    ConstitutiveKind, ConstitutiveModel, CorotatedModel, LinearElasticModel, NeoHookeanModel,
    StVenantKirchhoffModel,
};
use crate::error::FemResult;
use crate::math::{FemScalar, Mat3, StressDerivative};

/// Material law and its elastic constants, as found in option files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum MaterialConfig {
    LinearElastic { youngs_modulus: f64, poisson_ratio: f64 },
    StVenantKirchhoff { youngs_modulus: f64, poisson_ratio: f64 },
    Corotated { youngs_modulus: f64, poisson_ratio: f64 },
    NeoHookean { youngs_modulus: f64, poisson_ratio: f64 },
}

impl Default for MaterialConfig {
    fn default() -> Self {
        // Soft rubber-like solid: 1 MPa, ν = 0.4
        Self::NeoHookean {
            youngs_modulus: 1e6,
            poisson_ratio: 0.4,
        }
    }
}

impl MaterialConfig {
    pub fn kind(&self) -> ConstitutiveKind {
        match self {
            Self::LinearElastic { .. } => ConstitutiveKind::LinearElastic,
            Self::StVenantKirchhoff { .. } => ConstitutiveKind::StVenantKirchhoff,
            Self::Corotated { .. } => ConstitutiveKind::Corotated,
            Self::NeoHookean { .. } => ConstitutiveKind::NeoHookean,
        }
    }

    /// Instantiate the model for scalar type `T`
    pub fn build<T: FemScalar>(&self) -> FemResult<AnyConstitutiveModel<T>> {
        let lift = T::from_f64;
        Ok(match *self {
            Self::LinearElastic { youngs_modulus, poisson_ratio } => AnyConstitutiveModel::LinearElastic(
                LinearElasticModel::new(lift(youngs_modulus), lift(poisson_ratio))?,
            ),
            Self::StVenantKirchhoff { youngs_modulus, poisson_ratio } => {
                AnyConstitutiveModel::StVenantKirchhoff(StVenantKirchhoffModel::new(
                    lift(youngs_modulus),
                    lift(poisson_ratio),
                )?)
            }
            Self::Corotated { youngs_modulus, poisson_ratio } => AnyConstitutiveModel::Corotated(
                CorotatedModel::new(lift(youngs_modulus), lift(poisson_ratio))?,
            ),
            Self::NeoHookean { youngs_modulus, poisson_ratio } => AnyConstitutiveModel::NeoHookean(
                NeoHookeanModel::new(lift(youngs_modulus), lift(poisson_ratio))?,
            ),
        })
    }
}

/// Closed set of the built-in models.
///
/// The batched methods match once and hand the whole batch to the concrete
/// model, keeping the per-quadrature-point loop free of branching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyConstitutiveModel<T> {
    LinearElastic(LinearElasticModel<T>),
    StVenantKirchhoff(StVenantKirchhoffModel<T>),
    Corotated(CorotatedModel<T>),
    NeoHookean(NeoHookeanModel<T>),
}

macro_rules! dispatch {
    ($self:expr, $model:ident => $body:expr) => {
        match $self {
            AnyConstitutiveModel::LinearElastic($model) => $body,
            AnyConstitutiveModel::StVenantKirchhoff($model) => $body,
            AnyConstitutiveModel::Corotated($model) => $body,
            AnyConstitutiveModel::NeoHookean($model) => $body,
        }
    };
}

impl<T: FemScalar> ConstitutiveModel<T> for AnyConstitutiveModel<T> {
    fn kind(&self) -> ConstitutiveKind {
        dispatch!(self, m => m.kind())
    }

    fn energy_density(&self, f: &Mat3<T>) -> FemResult<T> {
        dispatch!(self, m => m.energy_density(f))
    }

    fn first_piola_stress(&self, f: &Mat3<T>) -> FemResult<Mat3<T>> {
        dispatch!(self, m => m.first_piola_stress(f))
    }

    fn first_piola_stress_derivative(&self, f: &Mat3<T>) -> Option<FemResult<StressDerivative<T>>> {
        dispatch!(self, m => m.first_piola_stress_derivative(f))
    }

    fn calc_energy_density(&self, fs: &[Mat3<T>]) -> FemResult<Vec<T>> {
        dispatch!(self, m => m.calc_energy_density(fs))
    }

    fn calc_first_piola_stress(&self, fs: &[Mat3<T>]) -> FemResult<Vec<Mat3<T>>> {
        dispatch!(self, m => m.calc_first_piola_stress(fs))
    }

    fn calc_first_piola_stress_derivative(
        &self,
        fs: &[Mat3<T>],
    ) -> FemResult<Vec<StressDerivative<T>>> {
        dispatch!(self, m => m.calc_first_piola_stress_derivative(fs))
    }
}
