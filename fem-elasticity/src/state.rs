//! Indices and the externally owned nodal state read by elements

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Matrix3xX, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FemError, FemResult};
use crate::math::FemScalar;

/// Global index of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementIndex(pub usize);

/// Global index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stamp identifying one set of nodal positions.
///
/// Stamps are drawn from a process-wide counter, so two states never share a
/// stamp unless one is a clone of the other with no mutation since.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateVersion(u64);

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

impl StateVersion {
    fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Current positions of every node in the model.
///
/// Elements only read from the state; they never hold on to it past a call.
#[derive(Debug, Clone)]
pub struct FemState<T: FemScalar> {
    positions: Vec<Vector3<T>>,
    version: StateVersion,
}

impl<T: FemScalar> FemState<T> {
    /// Create a state from one position per node
    pub fn new(positions: Vec<Vector3<T>>) -> Self {
        Self {
            positions,
            version: StateVersion::next(),
        }
    }

    /// Create a state from a 3 x N matrix whose columns are node positions
    pub fn from_matrix(positions: &Matrix3xX<T>) -> Self {
        Self::new(
            positions
                .column_iter()
                .map(|c| Vector3::new(c[0], c[1], c[2]))
                .collect(),
        )
    }

    pub fn num_nodes(&self) -> usize {
        self.positions.len()
    }

    pub fn version(&self) -> StateVersion {
        self.version
    }

    /// Position of a node
    pub fn position(&self, node: NodeIndex) -> FemResult<&Vector3<T>> {
        self.positions
            .get(node.0)
            .ok_or(FemError::NodeOutOfRange {
                node,
                num_nodes: self.positions.len(),
            })
    }

    pub fn positions(&self) -> &[Vector3<T>] {
        &self.positions
    }

    /// Replace all positions. The state receives a new version.
    pub fn set_positions(&mut self, positions: Vec<Vector3<T>>) {
        self.positions = positions;
        self.version = StateVersion::next();
    }

    /// Move a single node. The state receives a new version.
    pub fn set_position(&mut self, node: NodeIndex, position: Vector3<T>) -> FemResult<()> {
        let num_nodes = self.positions.len();
        let slot = self
            .positions
            .get_mut(node.0)
            .ok_or(FemError::NodeOutOfRange { node, num_nodes })?;
        *slot = position;
        self.version = StateVersion::next();
        Ok(())
    }

    /// Gather the positions of `nodes` as columns of a 3 x N matrix
    pub fn gather(&self, nodes: &[NodeIndex]) -> FemResult<Matrix3xX<T>> {
        let mut x = Matrix3xX::<T>::zeros(nodes.len());
        for (a, &node) in nodes.iter().enumerate() {
            x.set_column(a, self.position(node)?);
        }
        Ok(x)
    }
}
