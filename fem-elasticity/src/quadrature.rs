//! Quadrature rules over the element's natural coordinate domain
//!
//! References:
//! - Zienkiewicz, Taylor & Zhu, "The Finite Element Method: Its Basis and
//!   Fundamentals", Table 6.3 (triangles) and Table 6.4 (tetrahedra)

use nalgebra::DVector;

use crate::error::{FemError, FemResult};

/// A fixed set of sample points and weights
pub trait Quadrature {
    /// Dimension of the natural coordinates the points live in
    fn natural_dim(&self) -> usize;

    /// Locations of the quadrature points in natural coordinates
    fn points(&self) -> &[DVector<f64>];

    /// Weights, one per point
    fn weights(&self) -> &[f64];

    fn num_points(&self) -> usize {
        self.points().len()
    }
}

/// Gaussian quadrature over the unit simplex
/// `{ξ : ξ_k ≥ 0, Σ ξ_k ≤ 1}`.
///
/// Supported natural dimensions are 2 (triangle) and 3 (tetrahedron), each
/// with polynomial-exactness order 1, 2 or 3. The weights sum to the measure of
/// the unit simplex: 1/2 for the triangle and 1/6 for the tetrahedron.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexGaussianQuadrature {
    natural_dim: usize,
    order: usize,
    points: Vec<DVector<f64>>,
    weights: Vec<f64>,
}

impl SimplexGaussianQuadrature {
    /// Create the rule for a `natural_dim`-simplex integrating polynomials of
    /// degree `order` exactly
    pub fn new(natural_dim: usize, order: usize) -> FemResult<Self> {
        let (points, weights): (Vec<Vec<f64>>, Vec<f64>) = match (natural_dim, order) {
            (2, 1) => (vec![vec![1.0 / 3.0, 1.0 / 3.0]], vec![0.5]),
            (2, 2) => (
                vec![
                    vec![1.0 / 6.0, 1.0 / 6.0],
                    vec![2.0 / 3.0, 1.0 / 6.0],
                    vec![1.0 / 6.0, 2.0 / 3.0],
                ],
                vec![1.0 / 6.0; 3],
            ),
            (2, 3) => (
                vec![
                    vec![1.0 / 3.0, 1.0 / 3.0],
                    vec![0.6, 0.2],
                    vec![0.2, 0.6],
                    vec![0.2, 0.2],
                ],
                vec![-27.0 / 96.0, 25.0 / 96.0, 25.0 / 96.0, 25.0 / 96.0],
            ),
            (3, 1) => (vec![vec![0.25, 0.25, 0.25]], vec![1.0 / 6.0]),
            (3, 2) => {
                let a = (5.0 + 3.0 * 5.0_f64.sqrt()) / 20.0;
                let b = (5.0 - 5.0_f64.sqrt()) / 20.0;
                (
                    vec![vec![b, b, b], vec![a, b, b], vec![b, a, b], vec![b, b, a]],
                    vec![1.0 / 24.0; 4],
                )
            }
            (3, 3) => {
                let (a, b) = (0.5, 1.0 / 6.0);
                (
                    vec![
                        vec![0.25, 0.25, 0.25],
                        vec![b, b, b],
                        vec![a, b, b],
                        vec![b, a, b],
                        vec![b, b, a],
                    ],
                    vec![-2.0 / 15.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0],
                )
            }
            _ => {
                return Err(FemError::UnsupportedQuadrature {
                    order,
                    dim: natural_dim,
                })
            }
        };

        Ok(Self {
            natural_dim,
            order,
            points: points.into_iter().map(DVector::from_vec).collect(),
            weights,
        })
    }

    /// Tetrahedral rule of the given order
    pub fn tetrahedron(order: usize) -> FemResult<Self> {
        Self::new(3, order)
    }

    /// Triangular rule of the given order
    pub fn triangle(order: usize) -> FemResult<Self> {
        Self::new(2, order)
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

impl Quadrature for SimplexGaussianQuadrature {
    fn natural_dim(&self) -> usize {
        self.natural_dim
    }

    fn points(&self) -> &[DVector<f64>] {
        &self.points
    }

    fn weights(&self) -> &[f64] {
        &self.weights
    }
}
