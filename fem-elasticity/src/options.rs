//! Element construction options

use serde::{Deserialize, Serialize};

use crate::constitutive::MaterialConfig;
use crate::error::{FemError, FemResult};

/// Options for building elasticity elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementOptions {
    /// Order of the Gaussian quadrature rule (1, 2 or 3)
    pub quadrature_order: usize,
    /// Mass density in the reference configuration, kg/m³
    pub density: f64,
    /// Material law and constants
    pub material: MaterialConfig,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            quadrature_order: 1,
            density: 1000.0,
            material: MaterialConfig::default(),
        }
    }
}

impl ElementOptions {
    /// Parse options from JSON; missing fields take their default values
    pub fn from_json(json: &str) -> FemResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        if options.density <= 0.0 {
            return Err(FemError::InvalidInput(format!(
                "density must be positive, got {}",
                options.density
            )));
        }
        Ok(options)
    }

    /// Set quadrature order
    pub fn with_quadrature_order(mut self, order: usize) -> Self {
        self.quadrature_order = order;
        self
    }

    /// Set density
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_material(mut self, material: MaterialConfig) -> Self {
        self.material = material;
        self
    }
}
