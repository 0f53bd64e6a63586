//! Uniaxial stretch of a single tetrahedron
//!
//! Stretches the unit tetrahedron along x and compares the element energy of
//! each material with the small-strain estimate ½Eε²V₀.
//!
//! Usage: `tet-stretch [options.json]`. With `RUST_LOG=debug` the element and
//! cache report what they compute.

use std::env;
use std::fs;

use anyhow::Context;
use fem_elasticity::prelude::*;
use log::info;
use nalgebra::{Matrix3xX, Vector3};

const YOUNGS_MODULUS: f64 = 1.0e6;
const POISSON_RATIO: f64 = 0.0;

fn unit_tet() -> Matrix3xX<f64> {
    Matrix3xX::from_columns(&[
        Vector3::zeros(),
        Vector3::x(),
        Vector3::y(),
        Vector3::z(),
    ])
}

fn stretched(strain: f64) -> FemState<f64> {
    let mut x = unit_tet();
    x[(0, 1)] *= 1.0 + strain;
    FemState::from_matrix(&x)
}

fn materials() -> Vec<(&'static str, MaterialConfig)> {
    let (youngs_modulus, poisson_ratio) = (YOUNGS_MODULUS, POISSON_RATIO);
    vec![
        ("linear", MaterialConfig::LinearElastic { youngs_modulus, poisson_ratio }),
        ("stvk", MaterialConfig::StVenantKirchhoff { youngs_modulus, poisson_ratio }),
        ("corotated", MaterialConfig::Corotated { youngs_modulus, poisson_ratio }),
        ("neo-hookean", MaterialConfig::NeoHookean { youngs_modulus, poisson_ratio }),
    ]
}

fn load_options() -> anyhow::Result<ElementOptions> {
    match env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            Ok(ElementOptions::from_json(&json).with_context(|| format!("parsing {path}"))?)
        }
        None => Ok(ElementOptions::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = load_options()?;
    info!("Element options: {options:?}");

    let nodes: Vec<NodeIndex> = (0..4).map(NodeIndex).collect();
    let volume = 1.0 / 6.0;

    println!("=== Single tetrahedron, uniaxial stretch (E = {YOUNGS_MODULUS:e}, nu = {POISSON_RATIO}) ===\n");
    println!("{:>8} {:>14} {:>14} {:>14} {:>14} {:>14}", "strain", "1/2 E e^2 V", "linear", "stvk", "corotated", "neo-hookean");

    let elements = materials()
        .into_iter()
        .map(|(name, material)| {
            ElasticityElement::<f64, AnyConstitutiveModel<f64>>::from_options(
                ElementIndex(0),
                nodes.clone(),
                unit_tet(),
                &options.with_material(material),
            )
            .with_context(|| format!("building {name} element"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for strain in [1e-4, 1e-3, 1e-2, 0.1, 0.3] {
        let state = stretched(strain);
        let estimate = 0.5 * YOUNGS_MODULUS * strain * strain * volume;
        print!("{strain:>8.0e} {estimate:>14.6e}");
        for element in &elements {
            print!(" {:>14.6e}", element.calc_elastic_energy(&state)?);
        }
        println!();
    }

    // Forces on the stretched element, for the configured material
    let element = ElasticityElement::<f64, AnyConstitutiveModel<f64>>::from_options(
        ElementIndex(0),
        nodes,
        unit_tet(),
        &options,
    )?;
    let state = stretched(0.01);
    let force = element.calc_elastic_force(&state)?;
    println!("\nElastic forces at 1% strain ({:?}):", element.constitutive_model().kind());
    for a in 0..element.num_nodes() {
        println!(
            "  node {a}: ({:>12.4e}, {:>12.4e}, {:>12.4e})",
            force[3 * a],
            force[3 * a + 1],
            force[3 * a + 2]
        );
    }
    println!("Total mass: {:.4} kg", element.total_mass());

    Ok(())
}
