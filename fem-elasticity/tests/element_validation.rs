//! Validation of the elasticity element against closed-form results.
//!
//! Unit tetrahedron with nodes at the origin and the three unit points,
//! E = 1 and ν = 0 unless noted otherwise.

use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use fem_elasticity::math::rotation_matrix;
use fem_elasticity::prelude::*;
use nalgebra::{DVector, Matrix3xX, Vector3};

fn unit_tet() -> Matrix3xX<f64> {
    Matrix3xX::from_columns(&[
        Vector3::zeros(),
        Vector3::x(),
        Vector3::y(),
        Vector3::z(),
    ])
}

fn nodes() -> Vec<NodeIndex> {
    (0..4).map(NodeIndex).collect()
}

fn element<M: ConstitutiveModel<f64>>(model: M, order: usize) -> LinearTetElement<f64, M> {
    LinearTetElement::new(
        ElementIndex(0),
        nodes(),
        1.0,
        model,
        unit_tet(),
        SimplexGaussianQuadrature::tetrahedron(order).unwrap(),
    )
    .unwrap()
}

fn stretched(strain: f64) -> FemState<f64> {
    let mut x = unit_tet();
    x[(0, 1)] += strain;
    FemState::from_matrix(&x)
}

fn general_state() -> FemState<f64> {
    FemState::new(vec![
        Vector3::new(0.02, -0.01, 0.0),
        Vector3::new(1.1, 0.05, -0.02),
        Vector3::new(-0.05, 0.95, 0.03),
        Vector3::new(0.04, 0.02, 1.08),
    ])
}

#[test]
fn test_reference_configuration_has_no_energy_or_residual() {
    let configs = [
        MaterialConfig::LinearElastic { youngs_modulus: 1.0, poisson_ratio: 0.0 },
        MaterialConfig::StVenantKirchhoff { youngs_modulus: 1.0, poisson_ratio: 0.3 },
        MaterialConfig::Corotated { youngs_modulus: 1.0, poisson_ratio: 0.3 },
        MaterialConfig::NeoHookean { youngs_modulus: 1.0, poisson_ratio: 0.3 },
    ];
    let state = FemState::from_matrix(&unit_tet());
    for config in configs {
        let element = element(config.build::<f64>().unwrap(), 2);
        assert_relative_eq!(element.calc_elastic_energy(&state).unwrap(), 0.0, epsilon = 1e-15);
        let residual = element.calc_residual(&state).unwrap();
        assert_eq!(residual.len(), 12);
        assert_relative_eq!(residual, DVector::zeros(12), epsilon = 1e-14);
    }
}

#[test]
fn test_reference_volumes_sum_to_tet_volume() {
    for order in 1..=3 {
        let element = element(LinearElasticModel::new(1.0, 0.0).unwrap(), order);
        assert_relative_eq!(element.total_reference_volume(), 1.0 / 6.0, epsilon = 1e-14);
    }
}

#[test]
fn test_uniaxial_stretch_energy() {
    // Linear, ν = 0: Ψ = ½ε², so the element stores ½ε²/6
    let eps = 0.01;
    let linear = element(LinearElasticModel::new(1.0, 0.0).unwrap(), 1);
    assert_relative_eq!(
        linear.calc_elastic_energy(&stretched(eps)).unwrap(),
        0.5 * eps * eps / 6.0,
        max_relative = 1e-12
    );

    // Nonlinear models agree to leading order
    let stvk = element(StVenantKirchhoffModel::new(1.0, 0.0).unwrap(), 1);
    let neo = element(NeoHookeanModel::new(1.0, 0.0).unwrap(), 1);
    let eps = 1e-4;
    let expected = 0.5 * eps * eps / 6.0;
    for energy in [
        stvk.calc_elastic_energy(&stretched(eps)).unwrap(),
        neo.calc_elastic_energy(&stretched(eps)).unwrap(),
    ] {
        assert_relative_eq!(energy, expected, max_relative = 1e-3);
    }
}

#[test]
fn test_uniaxial_stretch_forces() {
    // P = ε e_x e_xᵀ; ∇X N for the unit tet are (-1,-1,-1), e_x, e_y, e_z
    let eps = 0.01;
    let element = element(LinearElasticModel::new(1.0, 0.0).unwrap(), 1);
    let residual = element.calc_residual(&stretched(eps)).unwrap();
    let v = 1.0 / 6.0;
    #[rustfmt::skip]
    let expected = DVector::from_vec(vec![
        -eps * v, 0.0, 0.0,
        eps * v, 0.0, 0.0,
        0.0, 0.0, 0.0,
        0.0, 0.0, 0.0,
    ]);
    assert_relative_eq!(residual, expected, epsilon = 1e-15);

    // The stretched node is pulled back toward the rest length
    let force = element.calc_elastic_force(&stretched(eps)).unwrap();
    assert!(force[3] < 0.0);
    assert_relative_eq!(force, residual * RESIDUAL_FORCE_SIGN);
}

#[test]
fn test_rotation_invariance() {
    let element = element(NeoHookeanModel::new(1.0, 0.3).unwrap(), 2);
    let state = general_state();
    let r = rotation_matrix(&Vector3::new(0.3, 1.0, -0.7), 0.8);
    let rotated = FemState::new(state.positions().iter().map(|p| r * p).collect());

    assert_relative_eq!(
        element.calc_elastic_energy(&rotated).unwrap(),
        element.calc_elastic_energy(&state).unwrap(),
        max_relative = 1e-10
    );
    let residual = element.calc_residual(&state).unwrap();
    let rotated_residual = element.calc_residual(&rotated).unwrap();
    for a in 0..4 {
        let expected = r * Vector3::new(residual[3 * a], residual[3 * a + 1], residual[3 * a + 2]);
        let actual = Vector3::new(rotated_residual[3 * a], rotated_residual[3 * a + 1], rotated_residual[3 * a + 2]);
        assert_relative_eq!(actual, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_residual_is_dual_energy_derivative() {
    let dual_element = LinearTetElement::new(
        ElementIndex(0),
        nodes(),
        Dual::constant(1.0),
        StVenantKirchhoffModel::new(Dual::constant(1.0), Dual::constant(0.3)).unwrap(),
        unit_tet().map(Dual::constant),
        SimplexGaussianQuadrature::tetrahedron(2).unwrap(),
    )
    .unwrap();
    let element = element(StVenantKirchhoffModel::new(1.0, 0.3).unwrap(), 2);
    let state = general_state();
    let residual = element.calc_residual(&state).unwrap();

    for a in 0..4 {
        for d in 0..3 {
            let mut positions: Vec<Vector3<Dual>> =
                state.positions().iter().map(|p| p.map(Dual::constant)).collect();
            positions[a][d] = Dual::variable(positions[a][d].value);
            let energy = dual_element.calc_elastic_energy(&FemState::new(positions)).unwrap();
            assert_relative_eq!(energy.derivative, residual[3 * a + d], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_stiffness_matches_dual_residual_derivative() {
    let element = element(NeoHookeanModel::new(2.0, 0.25).unwrap(), 1);
    let dual_element = LinearTetElement::new(
        ElementIndex(0),
        nodes(),
        Dual::constant(1.0),
        NeoHookeanModel::new(Dual::constant(2.0), Dual::constant(0.25)).unwrap(),
        unit_tet().map(Dual::constant),
        SimplexGaussianQuadrature::tetrahedron(1).unwrap(),
    )
    .unwrap();
    let state = general_state();
    assert_relative_eq!(
        element.calc_stiffness_matrix(&state).unwrap(),
        calc_residual_derivative(&dual_element, &state).unwrap(),
        epsilon = 1e-10
    );
}

#[test]
fn test_corotated_has_no_analytic_stiffness() {
    let element = element(CorotatedModel::new(1.0, 0.3).unwrap(), 1);
    let err = element.calc_stiffness_matrix(&general_state()).unwrap_err();
    assert!(matches!(err, FemError::MissingStressDerivative(ConstitutiveKind::Corotated)));
}

/// Wraps a model and counts its batched stress and energy evaluations
struct CountingModel<M> {
    inner: M,
    calls: AtomicUsize,
}

impl<M: ConstitutiveModel<f64>> ConstitutiveModel<f64> for CountingModel<M> {
    fn kind(&self) -> ConstitutiveKind {
        ConstitutiveKind::Custom("counting")
    }

    fn energy_density(&self, f: &Mat3<f64>) -> FemResult<f64> {
        self.inner.energy_density(f)
    }

    fn first_piola_stress(&self, f: &Mat3<f64>) -> FemResult<Mat3<f64>> {
        self.inner.first_piola_stress(f)
    }

    fn calc_energy_density(&self, fs: &[Mat3<f64>]) -> FemResult<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.calc_energy_density(fs)
    }

    fn calc_first_piola_stress(&self, fs: &[Mat3<f64>]) -> FemResult<Vec<Mat3<f64>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.calc_first_piola_stress(fs)
    }
}

#[test]
fn test_cache_evaluates_model_once_per_state() {
    let element = element(
        CountingModel {
            inner: NeoHookeanModel::new(1.0, 0.3).unwrap(),
            calls: AtomicUsize::new(0),
        },
        2,
    );
    let calls = || element.constitutive_model().calls.load(Ordering::SeqCst);
    let mut state = general_state();
    let mut entry = element.make_cache_entry();

    entry.refresh(&element, &state).unwrap();
    let after_first = calls();
    assert_eq!(after_first, 2);

    // Energy and residual of the same state reuse the entry
    entry.refresh(&element, &state).unwrap();
    let energy = element.calc_elastic_energy_cached(&entry).unwrap();
    let residual = element.calc_residual_cached(&entry).unwrap();
    assert_eq!(calls(), after_first);
    assert_relative_eq!(energy, element.calc_elastic_energy(&state).unwrap());
    assert_relative_eq!(residual, element.calc_residual(&state).unwrap());

    let before_move = calls();
    state.set_position(NodeIndex(2), Vector3::new(0.0, 1.05, 0.0)).unwrap();
    assert!(entry.refresh(&element, &state).unwrap());
    assert_eq!(calls(), before_move + 2);
}

#[test]
fn test_invalid_geometry_and_state() {
    let mut flat = unit_tet();
    flat[(2, 3)] = 0.0;
    let err = LinearTetElement::new(
        ElementIndex(7),
        nodes(),
        1.0,
        LinearElasticModel::new(1.0, 0.0).unwrap(),
        flat,
        SimplexGaussianQuadrature::tetrahedron(1).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, FemError::DegenerateElement { element: ElementIndex(7), .. }));

    let element = element(NeoHookeanModel::new(1.0, 0.3).unwrap(), 1);
    let mut inverted = unit_tet();
    inverted[(2, 3)] = -0.5;
    assert!(element
        .calc_elastic_energy(&FemState::from_matrix(&inverted))
        .unwrap_err()
        .is_inversion());

    let short = FemState::new(vec![Vector3::zeros(); 2]);
    assert!(matches!(
        element.calc_residual(&short),
        Err(FemError::NodeOutOfRange { node: NodeIndex(2), num_nodes: 2 })
    ));
}

#[test]
fn test_elements_share_state_across_threads() {
    // Two tets sharing a face, evaluated concurrently against one state
    let positions = vec![
        Vector3::zeros(),
        Vector3::x(),
        Vector3::y(),
        Vector3::z(),
        Vector3::new(1.0, 1.0, 1.0),
    ];
    let reference = FemState::new(positions.clone());
    let build = |index: usize, node_ids: [usize; 4]| {
        let nodes: Vec<NodeIndex> = node_ids.iter().copied().map(NodeIndex).collect();
        let x = reference.gather(&nodes).unwrap();
        LinearTetElement::new(
            ElementIndex(index),
            nodes,
            1.0,
            NeoHookeanModel::new(1.0, 0.3).unwrap(),
            x,
            SimplexGaussianQuadrature::tetrahedron(2).unwrap(),
        )
        .unwrap()
    };
    let elements = [build(0, [0, 1, 2, 3]), build(1, [1, 2, 3, 4])];
    let mut moved = positions;
    moved[4] += Vector3::new(0.1, 0.0, 0.05);
    let state = FemState::new(moved);
    let shared = &state;

    let parallel: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = elements
            .iter()
            .map(|element| s.spawn(move || element.calc_elastic_energy(shared).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_relative_eq!(parallel[0], 0.0, epsilon = 1e-15);
    assert!(parallel[1] > 0.0);
    assert_relative_eq!(parallel[1], elements[1].calc_elastic_energy(&state).unwrap());
}

#[test]
fn test_element_from_options() {
    let options = ElementOptions::from_json(
        r#"{ "quadrature_order": 2, "density": 600.0,
             "material": { "model": "linear_elastic", "youngs_modulus": 1.0, "poisson_ratio": 0.0 } }"#,
    )
    .unwrap();
    let element = ElasticityElement::<f64, AnyConstitutiveModel<f64>>::from_options(
        ElementIndex(0),
        nodes(),
        unit_tet(),
        &options,
    )
    .unwrap();
    assert_eq!(element.num_quadrature_points(), 4);
    assert_relative_eq!(element.total_mass(), 100.0, max_relative = 1e-12);
    assert_relative_eq!(
        element.calc_elastic_energy(&stretched(0.01)).unwrap(),
        0.5 * 0.01 * 0.01 / 6.0,
        max_relative = 1e-12
    );
}
