//! Elasticity element: energy, residual and stiffness of one finite element
//!
//! Reference-configuration quantities (the inverse element Jacobian `dξ/dX`
//! and the volume attached to each quadrature point) are computed once at
//! construction. Everything that depends on the current node positions is
//! recomputed on every call, unless the caller routes evaluation through a
//! [`DeformationGradientCacheEntry`].

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use nalgebra::{DMatrix, DVector, Matrix3xX, Vector3};

use crate::cache::DeformationGradientCacheEntry;
use crate::constitutive::{AnyConstitutiveModel, ConstitutiveModel};
use crate::error::{FemError, FemResult};
use crate::math::{determinant, max_abs_entry, try_inverse, FemScalar, Mat3};
use crate::options::ElementOptions;
use crate::quadrature::{Quadrature, SimplexGaussianQuadrature};
use crate::shape::{IsoparametricElement, LinearTetrahedron};
use crate::state::{ElementIndex, FemState, NodeIndex};

/// Sign relating the residual to the elastic force: `residual = sign · force`.
///
/// The residual is the gradient of the elastic energy with respect to the node
/// positions, which is the negative of the elastic force on the nodes.
pub const RESIDUAL_FORCE_SIGN: f64 = -1.0;

/// Relative size of `det(dX/dξ)` below which a reference element counts as
/// degenerate
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Identity of one constructed element.
///
/// Drawn from a process-wide counter at construction; clones keep the identity
/// of the element they were cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementInstance(u64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl ElementInstance {
    fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Finite element for static and dynamic 3D elasticity.
///
/// `S` is the shape function set and `Q` the quadrature rule; both must use
/// three natural dimensions. `M` is the constitutive model, owned by the
/// element for its whole lifetime.
#[derive(Debug, Clone)]
pub struct ElasticityElement<T, M, S = LinearTetrahedron, Q = SimplexGaussianQuadrature>
where
    T: FemScalar,
    M: ConstitutiveModel<T>,
    S: IsoparametricElement,
    Q: Quadrature,
{
    instance: ElementInstance,
    element_index: ElementIndex,
    node_indices: Vec<NodeIndex>,
    quadrature: Q,
    shape: S,
    /// Mass density in the reference configuration, kg/m³
    density: T,
    constitutive_model: M,
    /// Inverse element Jacobian `dξ/dX` at each quadrature point
    dxidx: Vec<Mat3<T>>,
    /// Shape function gradients with respect to reference coordinates, one
    /// 3 x num_nodes matrix per quadrature point; column `a` is ∇X N_a
    dsdx: Vec<Matrix3xX<T>>,
    reference_positions: Matrix3xX<T>,
    /// Reference volume attached to each quadrature point. Integrate `f` over
    /// the element as Σ f(q) · reference_volume[q].
    reference_volume: Vec<T>,
}

/// Linear tetrahedron with Gaussian quadrature, the common case
pub type LinearTetElement<T, M> = ElasticityElement<T, M, LinearTetrahedron, SimplexGaussianQuadrature>;

impl<T, M, S, Q> ElasticityElement<T, M, S, Q>
where
    T: FemScalar,
    M: ConstitutiveModel<T>,
    S: IsoparametricElement,
    Q: Quadrature,
{
    /// Create an element.
    ///
    /// # Arguments
    /// * `element_index` - Global index of the element
    /// * `node_indices` - Global indices of the element's nodes; their order
    ///   fixes the layout of every per-node output
    /// * `density` - Mass density in the reference configuration, kg/m³
    /// * `constitutive_model` - Material law of the element
    /// * `reference_positions` - Node positions in the reference
    ///   configuration, one column per node
    /// * `quadrature` - Quadrature rule; the shape functions are evaluated at
    ///   its points
    ///
    /// # Errors
    /// Fails without producing an element when the node counts disagree, the
    /// natural dimensions of shape and quadrature differ or are not 3, the
    /// density is not positive, or the reference element is degenerate.
    pub fn new(
        element_index: ElementIndex,
        node_indices: Vec<NodeIndex>,
        density: T,
        constitutive_model: M,
        reference_positions: Matrix3xX<T>,
        quadrature: Q,
    ) -> FemResult<Self> {
        let shape = S::at_locations(quadrature.points())?;
        if shape.natural_dim() != quadrature.natural_dim() {
            return Err(FemError::DimensionMismatch {
                shape: shape.natural_dim(),
                quadrature: quadrature.natural_dim(),
            });
        }
        if shape.natural_dim() != 3 {
            return Err(FemError::UnsupportedNaturalDimension(shape.natural_dim()));
        }
        if node_indices.len() != shape.num_nodes() {
            return Err(FemError::NodeCountMismatch {
                element: element_index,
                node_indices: node_indices.len(),
                shape_nodes: shape.num_nodes(),
            });
        }
        if reference_positions.ncols() != shape.num_nodes() {
            return Err(FemError::InvalidInput(format!(
                "element {} has {} reference positions for {} nodes",
                element_index,
                reference_positions.ncols(),
                shape.num_nodes()
            )));
        }
        if !(density.value() > 0.0 && density.value().is_finite()) {
            return Err(FemError::InvalidInput(format!(
                "element {} has non-positive density {}",
                element_index,
                density.value()
            )));
        }

        let jacobians = shape.calc_element_jacobian(&reference_positions);
        let mut dxidx = Vec::with_capacity(jacobians.len());
        let mut dsdx = Vec::with_capacity(jacobians.len());
        let mut reference_volume = Vec::with_capacity(jacobians.len());
        for (q, (jacobian, (&weight, ds))) in jacobians
            .iter()
            .zip(quadrature.weights().iter().zip(shape.gradients_in_parent()))
            .enumerate()
        {
            let dxdxi = to_mat3(jacobian);
            let det = determinant(&dxdxi);
            let scale = max_abs_entry(&dxdxi);
            let inverse = try_inverse(&dxdxi)
                .filter(|_| det.value().abs() > DEGENERATE_TOLERANCE * scale.powi(3))
                .ok_or(FemError::DegenerateElement {
                    element: element_index,
                    quadrature_point: q,
                    determinant: det.value(),
                })?;
            dsdx.push(reference_gradients(ds, &inverse));
            dxidx.push(inverse);
            reference_volume.push(det.abs() * T::from_f64(weight));
        }

        let element = Self {
            instance: ElementInstance::next(),
            element_index,
            node_indices,
            quadrature,
            shape,
            density,
            constitutive_model,
            dxidx,
            dsdx,
            reference_positions,
            reference_volume,
        };
        debug!(
            "Element {}: {} nodes, {} quadrature points, reference volume {:e}",
            element.element_index,
            element.num_nodes(),
            element.num_quadrature_points(),
            element.total_reference_volume().value()
        );
        Ok(element)
    }

    // ========================
    // Accessors
    // ========================

    pub fn element_index(&self) -> ElementIndex {
        self.element_index
    }

    pub fn instance(&self) -> ElementInstance {
        self.instance
    }

    pub fn node_indices(&self) -> &[NodeIndex] {
        &self.node_indices
    }

    /// Number of nodes associated with this element
    pub fn num_nodes(&self) -> usize {
        self.shape.num_nodes()
    }

    /// Number of quadrature points at which element-wise quantities are
    /// evaluated
    pub fn num_quadrature_points(&self) -> usize {
        self.quadrature.num_points()
    }

    pub fn density(&self) -> T {
        self.density
    }

    pub fn constitutive_model(&self) -> &M {
        &self.constitutive_model
    }

    pub fn quadrature(&self) -> &Q {
        &self.quadrature
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn reference_positions(&self) -> &Matrix3xX<T> {
        &self.reference_positions
    }

    pub fn reference_volumes(&self) -> &[T] {
        &self.reference_volume
    }

    pub fn total_reference_volume(&self) -> T {
        self.reference_volume
            .iter()
            .fold(T::zero(), |acc, &v| acc + v)
    }

    /// Creates a cache entry compatible with this element
    pub fn make_cache_entry(&self) -> DeformationGradientCacheEntry<T> {
        DeformationGradientCacheEntry::for_element(self)
    }

    // ========================
    // Deformation
    // ========================

    /// Deformation gradient `F = dx/dξ · dξ/dX` at every quadrature point.
    ///
    /// # Errors
    /// `NodeOutOfRange` when the state lacks one of the element's nodes,
    /// `InvertedElement` when `det(F) ≤ 0` at some quadrature point.
    pub fn calc_deformation_gradient(&self, state: &FemState<T>) -> FemResult<Vec<Mat3<T>>> {
        let x = state.gather(&self.node_indices)?;
        self.shape
            .calc_element_jacobian(&x)
            .iter()
            .zip(&self.dxidx)
            .enumerate()
            .map(|(q, (dxdxi, dxidx))| {
                let f = to_mat3(dxdxi) * dxidx;
                let det = determinant(&f).value();
                if det <= 0.0 {
                    debug!("Element {} inverted at quadrature point {q} (det F = {det:e})", self.element_index);
                    return Err(FemError::InvertedElement {
                        element: self.element_index,
                        quadrature_point: q,
                        determinant: det,
                    });
                }
                Ok(f)
            })
            .collect()
    }

    // ========================
    // Energy and residual
    // ========================

    /// Elastic potential energy stored in this element, in J
    pub fn calc_elastic_energy(&self, state: &FemState<T>) -> FemResult<T> {
        let f = self.calc_deformation_gradient(state)?;
        let psi = self.constitutive_model.calc_energy_density(&f)?;
        Ok(self.integrate_energy(&psi))
    }

    /// Element residual, the negative of the elastic forces on the nodes.
    ///
    /// Returns a vector of size `3 * num_nodes()`; entries `3i..3i+3` belong to
    /// the i-th node of this element, in element node order.
    pub fn calc_residual(&self, state: &FemState<T>) -> FemResult<DVector<T>> {
        let f = self.calc_deformation_gradient(state)?;
        let p = self.constitutive_model.calc_first_piola_stress(&f)?;
        Ok(self.assemble_residual(&p))
    }

    /// Elastic forces on the nodes, `RESIDUAL_FORCE_SIGN · residual`
    pub fn calc_elastic_force(&self, state: &FemState<T>) -> FemResult<DVector<T>> {
        Ok(self.calc_residual(state)? * T::from_f64(RESIDUAL_FORCE_SIGN))
    }

    /// Elastic energy from a refreshed cache entry
    pub fn calc_elastic_energy_cached(&self, entry: &DeformationGradientCacheEntry<T>) -> FemResult<T> {
        self.check_cache_entry(entry)?;
        Ok(self.integrate_energy(entry.get()?.energy_density))
    }

    /// Residual from a refreshed cache entry
    pub fn calc_residual_cached(&self, entry: &DeformationGradientCacheEntry<T>) -> FemResult<DVector<T>> {
        self.check_cache_entry(entry)?;
        Ok(self.assemble_residual(entry.get()?.first_piola_stress))
    }

    /// Stiffness matrix `∂residual/∂x` of size `3n x 3n`, from the model's
    /// first Piola stress derivative.
    ///
    /// # Errors
    /// `MissingStressDerivative` when the model provides no ∂P/∂F.
    pub fn calc_stiffness_matrix(&self, state: &FemState<T>) -> FemResult<DMatrix<T>> {
        let f = self.calc_deformation_gradient(state)?;
        let dpdf = self.constitutive_model.calc_first_piola_stress_derivative(&f)?;
        let n = self.num_nodes();
        let mut k = DMatrix::<T>::zeros(3 * n, 3 * n);
        for (q, dpdf_q) in dpdf.iter().enumerate() {
            let g = &self.dsdx[q];
            let volume = self.reference_volume[q];
            for b in 0..n {
                for a in 0..n {
                    for kk in 0..3 {
                        for i in 0..3 {
                            let mut sum = T::zero();
                            for l in 0..3 {
                                for j in 0..3 {
                                    sum += dpdf_q[(i + 3 * j, kk + 3 * l)] * g[(j, a)] * g[(l, b)];
                                }
                            }
                            k[(3 * a + i, 3 * b + kk)] += sum * volume;
                        }
                    }
                }
            }
        }
        Ok(k)
    }

    // ========================
    // Mass
    // ========================

    pub fn total_mass(&self) -> T {
        self.density * self.total_reference_volume()
    }

    /// Consistent mass matrix `ρ ∫ N_a N_b dV ⊗ I₃` of size `3n x 3n`
    pub fn calc_mass_matrix(&self) -> DMatrix<T> {
        let n = self.num_nodes();
        let mut m = DMatrix::<T>::zeros(3 * n, 3 * n);
        for (s, &volume) in self.shape.shape_functions().iter().zip(&self.reference_volume) {
            for b in 0..n {
                for a in 0..n {
                    let entry = self.density * T::from_f64(s[a] * s[b]) * volume;
                    for d in 0..3 {
                        m[(3 * a + d, 3 * b + d)] += entry;
                    }
                }
            }
        }
        m
    }

    /// Nodal forces of a uniform body acceleration `g`, `ρ ∫ N_a g dV`
    pub fn calc_gravity_force(&self, gravity: &Vector3<T>) -> DVector<T> {
        let n = self.num_nodes();
        let mut force = DVector::<T>::zeros(3 * n);
        for (s, &volume) in self.shape.shape_functions().iter().zip(&self.reference_volume) {
            for a in 0..n {
                let weight = self.density * T::from_f64(s[a]) * volume;
                for d in 0..3 {
                    force[3 * a + d] += gravity[d] * weight;
                }
            }
        }
        force
    }

    // ========================
    // Internals
    // ========================

    fn integrate_energy(&self, psi: &[T]) -> T {
        psi.iter()
            .zip(&self.reference_volume)
            .fold(T::zero(), |acc, (&psi_q, &volume)| acc + psi_q * volume)
    }

    /// Σ_q P(q) · ∇X N_a(q) · V_q for every node `a`
    fn assemble_residual(&self, p: &[Mat3<T>]) -> DVector<T> {
        let n = self.num_nodes();
        let mut residual = DVector::<T>::zeros(3 * n);
        for ((p_q, g), &volume) in p.iter().zip(&self.dsdx).zip(&self.reference_volume) {
            for a in 0..n {
                let contribution = p_q * g.column(a) * volume;
                for d in 0..3 {
                    residual[3 * a + d] += contribution[d];
                }
            }
        }
        residual
    }

    pub(crate) fn check_cache_entry(&self, entry: &DeformationGradientCacheEntry<T>) -> FemResult<()> {
        let model_kind = self.constitutive_model.kind();
        if entry.instance() != self.instance
            || entry.element_index() != self.element_index
            || entry.kind() != model_kind
            || entry.num_quadrature_points() != self.num_quadrature_points()
        {
            return Err(FemError::IncompatibleCacheEntry {
                element: self.element_index,
                model_kind,
                entry_element: entry.element_index(),
                entry_kind: entry.kind(),
            });
        }
        Ok(())
    }
}

impl<T: FemScalar> ElasticityElement<T, AnyConstitutiveModel<T>> {
    /// Linear tetrahedron whose material, density and quadrature order come
    /// from `options`
    pub fn from_options(
        element_index: ElementIndex,
        node_indices: Vec<NodeIndex>,
        reference_positions: Matrix3xX<T>,
        options: &ElementOptions,
    ) -> FemResult<Self> {
        Self::new(
            element_index,
            node_indices,
            T::from_f64(options.density),
            options.material.build()?,
            reference_positions,
            SimplexGaussianQuadrature::tetrahedron(options.quadrature_order)?,
        )
    }
}

/// Square 3 x 3 copy of a 3 x N matrix with N = 3
fn to_mat3<T: FemScalar>(m: &Matrix3xX<T>) -> Mat3<T> {
    Mat3::from_fn(|i, j| m[(i, j)])
}

/// ∇X N_a = (dξ/dX)ᵀ ∇ξ N_a, as the columns of a 3 x num_nodes matrix
fn reference_gradients<T: FemScalar>(ds: &DMatrix<f64>, dxidx: &Mat3<T>) -> Matrix3xX<T> {
    let mut g = Matrix3xX::<T>::zeros(ds.nrows());
    for a in 0..ds.nrows() {
        for j in 0..3 {
            let mut sum = T::zero();
            for k in 0..3 {
                sum += dxidx[(k, j)] * T::from_f64(ds[(a, k)]);
            }
            g[(j, a)] = sum;
        }
    }
    g
}
