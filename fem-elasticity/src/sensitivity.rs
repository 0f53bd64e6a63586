//! Residual derivatives by forward-mode dual numbers
//!
//! Works for every constitutive model, including those without an analytic
//! ∂P/∂F. Costs one residual evaluation per element degree of freedom.

use log::debug;
use nalgebra::{DMatrix, Vector3};

use crate::constitutive::ConstitutiveModel;
use crate::element::ElasticityElement;
use crate::error::FemResult;
use crate::math::Dual;
use crate::quadrature::Quadrature;
use crate::shape::IsoparametricElement;
use crate::state::FemState;

/// `∂residual/∂x` of size `3n x 3n`, column `3a + d` being the derivative with
/// respect to coordinate `d` of the element's a-th node.
///
/// `element` must be built over [`Dual`]; `state` holds plain positions.
pub fn calc_residual_derivative<M, S, Q>(
    element: &ElasticityElement<Dual, M, S, Q>,
    state: &FemState<f64>,
) -> FemResult<DMatrix<f64>>
where
    M: ConstitutiveModel<Dual>,
    S: IsoparametricElement,
    Q: Quadrature,
{
    let n = element.num_nodes();
    let mut dual_state = FemState::new(
        state
            .positions()
            .iter()
            .map(|p| p.map(Dual::constant))
            .collect(),
    );
    let mut derivative = DMatrix::<f64>::zeros(3 * n, 3 * n);

    for (a, &node) in element.node_indices().iter().enumerate() {
        let base: Vector3<f64> = *state.position(node)?;
        for d in 0..3 {
            let mut seeded = base.map(Dual::constant);
            seeded[d] = Dual::variable(base[d]);
            dual_state.set_position(node, seeded)?;
            let residual = element.calc_residual(&dual_state)?;
            derivative.set_column(3 * a + d, &residual.map(|r| r.derivative));
        }
        dual_state.set_position(node, base.map(Dual::constant))?;
    }
    debug!(
        "Element {}: residual derivative from {} dual evaluations",
        element.element_index(),
        3 * n
    );
    Ok(derivative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constitutive::{CorotatedModel, NeoHookeanModel};
    use crate::element::LinearTetElement;
    use crate::quadrature::SimplexGaussianQuadrature;
    use crate::state::{ElementIndex, NodeIndex};
    use approx::assert_relative_eq;
    use nalgebra::Matrix3xX;

    #[rustfmt::skip]
    fn reference() -> Matrix3xX<f64> {
        Matrix3xX::from_column_slice(&[
            0.0, 0.0, 0.0,
            1.0, 0.1, 0.0,
            0.2, 1.1, 0.0,
            0.1, 0.3, 0.9,
        ])
    }

    fn state() -> FemState<f64> {
        let mut x = reference();
        x[(0, 1)] += 0.15;
        x[(2, 3)] -= 0.1;
        x[(1, 2)] += 0.05;
        FemState::from_matrix(&x)
    }

    #[test]
    fn test_matches_analytic_stiffness() {
        let nodes: Vec<NodeIndex> = (0..4).map(NodeIndex).collect();
        let quadrature = SimplexGaussianQuadrature::tetrahedron(2).unwrap();
        let plain = LinearTetElement::new(
            ElementIndex(0),
            nodes.clone(),
            1.0,
            NeoHookeanModel::new(5.0, 0.3).unwrap(),
            reference(),
            quadrature.clone(),
        )
        .unwrap();
        let dual = LinearTetElement::new(
            ElementIndex(0),
            nodes,
            Dual::constant(1.0),
            NeoHookeanModel::new(Dual::constant(5.0), Dual::constant(0.3)).unwrap(),
            reference().map(Dual::constant),
            quadrature,
        )
        .unwrap();

        let state = state();
        let k = plain.calc_stiffness_matrix(&state).unwrap();
        let k_dual = calc_residual_derivative(&dual, &state).unwrap();
        assert_relative_eq!(k_dual, k, epsilon = 1e-10, max_relative = 1e-10);
    }

    #[test]
    fn test_model_without_stress_derivative() {
        let dual = LinearTetElement::new(
            ElementIndex(0),
            (0..4).map(NodeIndex).collect(),
            Dual::constant(1.0),
            CorotatedModel::new(Dual::constant(5.0), Dual::constant(0.3)).unwrap(),
            reference().map(Dual::constant),
            SimplexGaussianQuadrature::tetrahedron(1).unwrap(),
        )
        .unwrap();
        let k = calc_residual_derivative(&dual, &state()).unwrap();
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-8);
        // Rigid translations leave the residual unchanged
        for d in 0..3 {
            let mut shift = nalgebra::DVector::zeros(12);
            for a in 0..4 {
                shift[3 * a + d] = 1.0;
            }
            assert_relative_eq!(&k * shift, nalgebra::DVector::zeros(12), epsilon = 1e-10);
        }
    }
}
