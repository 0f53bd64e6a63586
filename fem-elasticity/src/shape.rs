//! Isoparametric shape functions evaluated at fixed sample locations

use nalgebra::{DMatrix, DVector, Matrix3xX};

use crate::error::{FemError, FemResult};
use crate::math::FemScalar;

/// Interpolation basis shared by geometry and displacement.
///
/// A shape function set is built once for a fixed list of natural-coordinate
/// locations (normally the quadrature points) and afterwards only hands out
/// precomputed values.
pub trait IsoparametricElement: Sized {
    /// Build the shape function set at the given locations
    fn at_locations(locations: &[DVector<f64>]) -> FemResult<Self>;

    fn natural_dim(&self) -> usize;

    fn num_nodes(&self) -> usize;

    fn num_sample_locations(&self) -> usize;

    /// Shape function values, one vector of length `num_nodes()` per location
    fn shape_functions(&self) -> &[DVector<f64>];

    /// Gradients with respect to natural coordinates, one
    /// `num_nodes() x natural_dim()` matrix per location. Row `a` is ∇ξN_a.
    fn gradients_in_parent(&self) -> &[DMatrix<f64>];

    /// Element Jacobian `dX/dξ = X · ∇ξN` at each location, for nodal positions
    /// given as the columns of `nodal_positions`. Each result is
    /// `3 x natural_dim()`.
    fn calc_element_jacobian<T: FemScalar>(&self, nodal_positions: &Matrix3xX<T>) -> Vec<Matrix3xX<T>> {
        self.gradients_in_parent()
            .iter()
            .map(|ds| {
                let mut jacobian = Matrix3xX::<T>::zeros(self.natural_dim());
                for a in 0..self.num_nodes() {
                    for k in 0..self.natural_dim() {
                        let ds_ak = T::from_f64(ds[(a, k)]);
                        for i in 0..3 {
                            jacobian[(i, k)] += nodal_positions[(i, a)] * ds_ak;
                        }
                    }
                }
                jacobian
            })
            .collect()
    }

}

/// Linear Lagrange element on the unit simplex of dimension `NATURAL_DIM`:
/// a triangle for 2, a tetrahedron for 3.
///
/// ```text
/// N_0 = 1 - Σ ξ_k
/// N_i = ξ_(i-1),   i = 1..=NATURAL_DIM
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSimplexElement<const NATURAL_DIM: usize> {
    shape_functions: Vec<DVector<f64>>,
    gradients: Vec<DMatrix<f64>>,
}

/// Three-node triangle
pub type LinearTriangle = LinearSimplexElement<2>;
/// Four-node tetrahedron
pub type LinearTetrahedron = LinearSimplexElement<3>;

impl<const NATURAL_DIM: usize> LinearSimplexElement<NATURAL_DIM> {
    const NUM_NODES: usize = NATURAL_DIM + 1;

    fn shape_at(xi: &DVector<f64>) -> DVector<f64> {
        let mut s = DVector::zeros(Self::NUM_NODES);
        s[0] = 1.0 - xi.sum();
        for i in 1..Self::NUM_NODES {
            s[i] = xi[i - 1];
        }
        s
    }

    /// Gradients are constant over the element
    fn gradient() -> DMatrix<f64> {
        let mut ds = DMatrix::zeros(Self::NUM_NODES, NATURAL_DIM);
        for k in 0..NATURAL_DIM {
            ds[(0, k)] = -1.0;
            ds[(k + 1, k)] = 1.0;
        }
        ds
    }
}

impl<const NATURAL_DIM: usize> IsoparametricElement for LinearSimplexElement<NATURAL_DIM> {
    fn at_locations(locations: &[DVector<f64>]) -> FemResult<Self> {
        if !(1..=3).contains(&NATURAL_DIM) {
            return Err(FemError::UnsupportedNaturalDimension(NATURAL_DIM));
        }
        if let Some(bad) = locations.iter().find(|xi| xi.len() != NATURAL_DIM) {
            return Err(FemError::DimensionMismatch {
                shape: NATURAL_DIM,
                quadrature: bad.len(),
            });
        }
        Ok(Self {
            shape_functions: locations.iter().map(Self::shape_at).collect(),
            gradients: vec![Self::gradient(); locations.len()],
        })
    }

    fn natural_dim(&self) -> usize {
        NATURAL_DIM
    }

    fn num_nodes(&self) -> usize {
        Self::NUM_NODES
    }

    fn num_sample_locations(&self) -> usize {
        self.shape_functions.len()
    }

    fn shape_functions(&self) -> &[DVector<f64>] {
        &self.shape_functions
    }

    fn gradients_in_parent(&self) -> &[DMatrix<f64>] {
        &self.gradients
    }
}
