//! Per-element cache of deformation-dependent quantities
//!
//! An entry holds F, Ψ and P at every quadrature point of one element, stamped
//! with the [`StateVersion`] they were computed from. Refreshing against a
//! state with the same version is a no-op, so energy and residual evaluated
//! back to back share a single constitutive evaluation.

use log::{debug, trace};

use crate::constitutive::{ConstitutiveKind, ConstitutiveModel};
use crate::element::{ElasticityElement, ElementInstance};
use crate::error::{FemError, FemResult};
use crate::math::{FemScalar, Mat3};
use crate::quadrature::Quadrature;
use crate::shape::IsoparametricElement;
use crate::state::{ElementIndex, FemState, StateVersion};

/// Cached quantities of one element, valid for one state version
#[derive(Debug, Clone)]
pub struct DeformationGradientCacheEntry<T: FemScalar> {
    instance: ElementInstance,
    element_index: ElementIndex,
    kind: ConstitutiveKind,
    num_quadrature_points: usize,
    version: Option<StateVersion>,
    deformation_gradient: Vec<Mat3<T>>,
    energy_density: Vec<T>,
    first_piola_stress: Vec<Mat3<T>>,
}

/// Borrowed view of a refreshed entry
#[derive(Debug, Clone, Copy)]
pub struct CachedDeformation<'a, T> {
    pub version: StateVersion,
    pub deformation_gradient: &'a [Mat3<T>],
    pub energy_density: &'a [T],
    pub first_piola_stress: &'a [Mat3<T>],
}

impl<T: FemScalar> DeformationGradientCacheEntry<T> {
    /// Entry for `element`, tagged with the kind of material it is meant for.
    ///
    /// Fails with `IncompatibleCacheEntry` when `kind` is not the kind of the
    /// element's model.
    pub fn new<M, S, Q>(element: &ElasticityElement<T, M, S, Q>, kind: ConstitutiveKind) -> FemResult<Self>
    where
        M: ConstitutiveModel<T>,
        S: IsoparametricElement,
        Q: Quadrature,
    {
        let model_kind = element.constitutive_model().kind();
        if kind != model_kind {
            return Err(FemError::IncompatibleCacheEntry {
                element: element.element_index(),
                model_kind,
                entry_element: element.element_index(),
                entry_kind: kind,
            });
        }
        Ok(Self::for_element(element))
    }

    pub(crate) fn for_element<M, S, Q>(element: &ElasticityElement<T, M, S, Q>) -> Self
    where
        M: ConstitutiveModel<T>,
        S: IsoparametricElement,
        Q: Quadrature,
    {
        let nq = element.num_quadrature_points();
        Self {
            instance: element.instance(),
            element_index: element.element_index(),
            kind: element.constitutive_model().kind(),
            num_quadrature_points: nq,
            version: None,
            deformation_gradient: Vec::with_capacity(nq),
            energy_density: Vec::with_capacity(nq),
            first_piola_stress: Vec::with_capacity(nq),
        }
    }

    /// Element the entry was made for
    pub fn instance(&self) -> ElementInstance {
        self.instance
    }

    pub fn element_index(&self) -> ElementIndex {
        self.element_index
    }

    pub fn kind(&self) -> ConstitutiveKind {
        self.kind
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.num_quadrature_points
    }

    /// Version of the state the entry was last computed from
    pub fn version(&self) -> Option<StateVersion> {
        self.version
    }

    pub fn is_current(&self, state: &FemState<T>) -> bool {
        self.version == Some(state.version())
    }

    /// Bring the entry up to date with `state`.
    ///
    /// Returns `true` when the quantities were recomputed and `false` when the
    /// entry already matched the state's version. On failure the entry is left
    /// invalidated.
    pub fn refresh<M, S, Q>(&mut self, element: &ElasticityElement<T, M, S, Q>, state: &FemState<T>) -> FemResult<bool>
    where
        M: ConstitutiveModel<T>,
        S: IsoparametricElement,
        Q: Quadrature,
    {
        element.check_cache_entry(self)?;
        if self.is_current(state) {
            trace!("Element {}: cache hit for state {:?}", self.element_index, state.version());
            return Ok(false);
        }

        self.invalidate();
        let model = element.constitutive_model();
        let f = element.calc_deformation_gradient(state)?;
        let psi = model.calc_energy_density(&f)?;
        let p = model.calc_first_piola_stress(&f)?;

        self.deformation_gradient = f;
        self.energy_density = psi;
        self.first_piola_stress = p;
        self.version = Some(state.version());
        debug!("Element {}: cache refreshed for state {:?}", self.element_index, state.version());
        Ok(true)
    }

    /// Cached quantities; fails with `CacheNotRefreshed` before the first
    /// successful refresh
    pub fn get(&self) -> FemResult<CachedDeformation<'_, T>> {
        let version = self.version.ok_or(FemError::CacheNotRefreshed)?;
        Ok(CachedDeformation {
            version,
            deformation_gradient: &self.deformation_gradient,
            energy_density: &self.energy_density,
            first_piola_stress: &self.first_piola_stress,
        })
    }

    /// Drop the cached quantities; the next refresh recomputes them
    pub fn invalidate(&mut self) {
        self.version = None;
        self.deformation_gradient.clear();
        self.energy_density.clear();
        self.first_piola_stress.clear();
    }
}
