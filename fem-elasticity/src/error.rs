//! Error types for the elasticity kernel

use thiserror::Error;

use crate::constitutive::ConstitutiveKind;
use crate::state::{ElementIndex, NodeIndex};

/// Main error type for element construction and evaluation
#[derive(Error, Debug)]
pub enum FemError {
    #[error("Element {element} has {node_indices} node indices but its shape functions need {shape_nodes}")]
    NodeCountMismatch {
        element: ElementIndex,
        node_indices: usize,
        shape_nodes: usize,
    },

    #[error("Natural dimension mismatch: shape functions use {shape}, quadrature uses {quadrature}")]
    DimensionMismatch { shape: usize, quadrature: usize },

    #[error("Natural dimension {0} is not supported here")]
    UnsupportedNaturalDimension(usize),

    #[error("Gaussian quadrature of order {order} over a {dim}-simplex is not supported")]
    UnsupportedQuadrature { order: usize, dim: usize },

    #[error("Element {element} is degenerate in the reference configuration at quadrature point {quadrature_point} (det = {determinant:e})")]
    DegenerateElement {
        element: ElementIndex,
        quadrature_point: usize,
        determinant: f64,
    },

    #[error("Invalid material parameters: {0}")]
    InvalidMaterial(String),

    #[error("Cache entry for element {entry_element} ({entry_kind:?}) cannot be used with element {element} ({model_kind:?})")]
    IncompatibleCacheEntry {
        element: ElementIndex,
        model_kind: ConstitutiveKind,
        entry_element: ElementIndex,
        entry_kind: ConstitutiveKind,
    },

    #[error("Node {node} is out of range for a state holding {num_nodes} nodes")]
    NodeOutOfRange { node: NodeIndex, num_nodes: usize },

    #[error("Element {element} is inverted at quadrature point {quadrature_point} (det F = {determinant:e})")]
    InvertedElement {
        element: ElementIndex,
        quadrature_point: usize,
        determinant: f64,
    },

    #[error("Deformation gradient has non-positive determinant {0:e}")]
    NonPositiveDeterminant(f64),

    #[error("Cache entry has not been refreshed")]
    CacheNotRefreshed,

    #[error("{0:?} model does not provide a first Piola stress derivative")]
    MissingStressDerivative(ConstitutiveKind),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FemError {
    /// True for errors caused by a physically invalid configuration that a
    /// solver can recover from, e.g. by shrinking its step.
    pub fn is_inversion(&self) -> bool {
        matches!(
            self,
            FemError::InvertedElement { .. } | FemError::NonPositiveDeterminant(_)
        )
    }
}

/// Result type for kernel operations
pub type FemResult<T> = Result<T, FemError>;
