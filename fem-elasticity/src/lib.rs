//! FEM Elasticity - per-element kernel for nonlinear solid mechanics
//!
//! Given a finite element's reference geometry, a material law and the
//! current node positions, this crate evaluates:
//! - Deformation gradient F at every quadrature point
//! - Elastic energy and its gradient, the element residual
//! - Stiffness matrix from an analytic ∂P/∂F, or via dual numbers for any model
//! - Consistent mass matrix and gravity forces
//!
//! Materials: linear elastic, St. Venant-Kirchhoff, corotated, neo-Hookean.
//! Shape functions: linear simplices. Quadrature: Gaussian rules of order 1-3
//! on triangles and tetrahedra.
//!
//! ## Example
//! ```rust
//! use fem_elasticity::prelude::*;
//! use nalgebra::{Matrix3xX, Vector3};
//!
//! let reference = Matrix3xX::from_columns(&[
//!     Vector3::zeros(),
//!     Vector3::x(),
//!     Vector3::y(),
//!     Vector3::z(),
//! ]);
//! let element = LinearTetElement::new(
//!     ElementIndex(0),
//!     (0..4).map(NodeIndex).collect(),
//!     1000.0,
//!     NeoHookeanModel::new(1e6, 0.4).unwrap(),
//!     reference.clone(),
//!     SimplexGaussianQuadrature::tetrahedron(1).unwrap(),
//! )
//! .unwrap();
//!
//! let state = FemState::from_matrix(&reference);
//! assert_eq!(element.calc_elastic_energy(&state).unwrap(), 0.0);
//! assert_eq!(element.calc_residual(&state).unwrap().len(), 12);
//! ```

pub mod cache;
pub mod constitutive;
pub mod element;
pub mod error;
pub mod math;
pub mod options;
pub mod quadrature;
pub mod sensitivity;
pub mod shape;
pub mod state;

// Re-export common types
pub mod prelude {
    pub use crate::cache::{CachedDeformation, DeformationGradientCacheEntry};
    pub use crate::constitutive::{
        AnyConstitutiveModel, ConstitutiveKind, ConstitutiveModel, CorotatedModel, LameParameters,
        LinearElasticModel, MaterialConfig, NeoHookeanModel, StVenantKirchhoffModel,
    };
    pub use crate::element::{ElasticityElement, ElementInstance, LinearTetElement, RESIDUAL_FORCE_SIGN};
    pub use crate::error::{FemError, FemResult};
    pub use crate::math::{Dual, FemScalar, Mat3, StressDerivative, Vec3};
    pub use crate::options::ElementOptions;
    pub use crate::quadrature::{Quadrature, SimplexGaussianQuadrature};
    pub use crate::sensitivity::calc_residual_derivative;
    pub use crate::shape::{IsoparametricElement, LinearSimplexElement, LinearTetrahedron, LinearTriangle};
    pub use crate::state::{ElementIndex, FemState, NodeIndex, StateVersion};
}
