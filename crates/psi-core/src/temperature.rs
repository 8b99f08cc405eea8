// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Temperature Operator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Temperature variants: constant, surface/bulk gradient, tabulated depth
//! profile, and a heat-equation field advanced explicitly by the handler.

use log::warn;
use psi_types::config::TemperatureConfig;
use psi_types::constants::{
    IRON_HEAT_COEFFICIENT, IRON_HEAT_CONDUCTIVITY, TUNGSTEN_HEAT_COEFFICIENT,
    TUNGSTEN_HEAT_CONDUCTIVITY, UO2_HEAT_COEFFICIENT, UO2_HEAT_CONDUCTIVITY,
};
use psi_types::error::{PsiError, PsiResult};
use psi_types::grid::DepthGrid;

/// Fallback when no temperature information is configured.
const DEFAULT_TEMPERATURE: f64 = 1000.0;

pub enum TemperatureModel {
    Constant(f64),
    /// Linear ramp from the surface value to the bulk value across the grid.
    Gradient { surface: f64, bulk: f64, depth_extent: f64 },
    /// Piecewise-linear (depth, temperature) table.
    Profile(Vec<(f64, f64)>),
    HeatEquation(HeatEquation1D),
}

impl TemperatureModel {
    /// Select the variant from configuration. Contradictory options abort;
    /// missing options warn on rank 0 and default to a constant field.
    pub fn from_config(cfg: &TemperatureConfig, material: &str, grid: &DepthGrid) -> PsiResult<Self> {
        if cfg.const_temperature.is_some() && !cfg.profile.is_empty() {
            return Err(PsiError::ConfigError(
                "a constant temperature value and a temperature file cannot both be given"
                    .to_string(),
            ));
        }
        if cfg.heat_equation {
            let heat_flux = cfg.const_temperature.unwrap_or(0.0);
            let bulk = cfg.bulk_temperature.unwrap_or(DEFAULT_TEMPERATURE);
            if heat_flux == 0.0 {
                // Zero surface flux degenerates to the bulk value.
                return Ok(TemperatureModel::Constant(bulk));
            }
            let (coefficient, conductivity) = material_heat_constants(material)?;
            return Ok(TemperatureModel::HeatEquation(HeatEquation1D::new(
                heat_flux,
                bulk,
                coefficient,
                conductivity,
                grid,
            )));
        }
        if let Some(t) = cfg.const_temperature {
            if let Some(bulk) = cfg.bulk_temperature {
                let extent = grid.position(grid.len() - 1) - grid.position(grid.surface_position());
                return Ok(TemperatureModel::Gradient {
                    surface: t,
                    bulk,
                    depth_extent: extent,
                });
            }
            return Ok(TemperatureModel::Constant(t));
        }
        if !cfg.profile.is_empty() {
            let mut samples = cfg.profile.clone();
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            return Ok(TemperatureModel::Profile(samples));
        }
        warn!("temperature information has not been given, defaulting to {DEFAULT_TEMPERATURE} K");
        Ok(TemperatureModel::Constant(DEFAULT_TEMPERATURE))
    }

    /// Temperature at a depth position and time.
    pub fn temperature(&self, position: f64, _time: f64) -> f64 {
        match self {
            TemperatureModel::Constant(t) => *t,
            TemperatureModel::Gradient {
                surface,
                bulk,
                depth_extent,
            } => {
                if *depth_extent <= 0.0 {
                    return *surface;
                }
                let w = (position / depth_extent).clamp(0.0, 1.0);
                surface + w * (bulk - surface)
            }
            TemperatureModel::Profile(samples) => interpolate(samples, position),
            TemperatureModel::HeatEquation(field) => field.sample(position),
        }
    }

    /// Advance the diffusive variant by one explicit step; the other
    /// variants are stationary.
    pub fn advance(&mut self, dt: f64) {
        if let TemperatureModel::HeatEquation(field) = self {
            field.advance(dt);
        }
    }
}

fn material_heat_constants(material: &str) -> PsiResult<(f64, f64)> {
    match material {
        "W100" | "W110" | "W111" | "W211" | "TRIDYN" => {
            Ok((TUNGSTEN_HEAT_COEFFICIENT, TUNGSTEN_HEAT_CONDUCTIVITY))
        }
        "Fe" => Ok((IRON_HEAT_COEFFICIENT, IRON_HEAT_CONDUCTIVITY)),
        "Fuel" => Ok((UO2_HEAT_COEFFICIENT, UO2_HEAT_CONDUCTIVITY)),
        other => Err(PsiError::ConfigError(format!(
            "no heat constants for material {other}"
        ))),
    }
}

fn interpolate(samples: &[(f64, f64)], position: f64) -> f64 {
    let first = samples[0];
    if position <= first.0 {
        return first.1;
    }
    for pair in samples.windows(2) {
        let (x0, t0) = pair[0];
        let (x1, t1) = pair[1];
        if position <= x1 {
            let w = (position - x0) / (x1 - x0);
            return t0 + w * (t1 - t0);
        }
    }
    samples[samples.len() - 1].1
}

/// Explicit heat-equation field on the depth grid: a surface heat flux on
/// the left, a fixed bulk temperature on the right.
pub struct HeatEquation1D {
    x: Vec<f64>,
    field: Vec<f64>,
    heat_flux: f64,
    bulk: f64,
    coefficient: f64,
    conductivity: f64,
}

impl HeatEquation1D {
    pub fn new(heat_flux: f64, bulk: f64, coefficient: f64, conductivity: f64, grid: &DepthGrid) -> Self {
        HeatEquation1D {
            x: grid.coords().to_vec(),
            field: vec![bulk; grid.len()],
            heat_flux,
            bulk,
            coefficient,
            conductivity,
        }
    }

    pub fn sample(&self, position: f64) -> f64 {
        let samples: Vec<(f64, f64)> = self.x.iter().copied().zip(self.field.iter().copied()).collect();
        interpolate(&samples, position)
    }

    /// One explicit Euler step of ∂T/∂t = α ∂²T/∂x² with the flux boundary.
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let n = self.field.len();
        let old = self.field.clone();
        for i in 1..n - 1 {
            let hl = self.x[i] - self.x[i - 1];
            let hr = self.x[i + 1] - self.x[i];
            let lap = 2.0 / (hl + hr) * ((old[i - 1] - old[i]) / hl + (old[i + 1] - old[i]) / hr);
            self.field[i] = old[i] + dt * self.coefficient * lap;
        }
        // Surface flux boundary, then fixed bulk on the right.
        let h0 = self.x[1] - self.x[0];
        self.field[0] = self.field[1] + self.heat_flux * h0 / self.conductivity;
        self.field[n - 1] = self.bulk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DepthGrid {
        DepthGrid::uniform(21, 0.5, 0.0).unwrap()
    }

    fn config_const(t: f64) -> TemperatureConfig {
        TemperatureConfig {
            const_temperature: Some(t),
            ..TemperatureConfig::default()
        }
    }

    #[test]
    fn test_constant_variant() {
        let model = TemperatureModel::from_config(&config_const(1200.0), "W110", &grid()).unwrap();
        assert_eq!(model.temperature(0.0, 0.0), 1200.0);
        assert_eq!(model.temperature(5.0, 10.0), 1200.0);
    }

    #[test]
    fn test_conflicting_options_rejected() {
        let cfg = TemperatureConfig {
            const_temperature: Some(1000.0),
            profile: vec![(0.0, 900.0), (1.0, 800.0)],
            ..TemperatureConfig::default()
        };
        assert!(TemperatureModel::from_config(&cfg, "W110", &grid()).is_err());
    }

    #[test]
    fn test_gradient_spans_surface_to_bulk() {
        let cfg = TemperatureConfig {
            const_temperature: Some(1000.0),
            bulk_temperature: Some(500.0),
            ..TemperatureConfig::default()
        };
        let model = TemperatureModel::from_config(&cfg, "W110", &grid()).unwrap();
        assert!((model.temperature(0.0, 0.0) - 1000.0).abs() < 1e-12);
        assert!((model.temperature(10.0, 0.0) - 500.0).abs() < 1e-12);
        let mid = model.temperature(5.0, 0.0);
        assert!(mid < 1000.0 && mid > 500.0);
    }

    #[test]
    fn test_profile_interpolation() {
        let cfg = TemperatureConfig {
            profile: vec![(0.0, 1000.0), (2.0, 800.0), (10.0, 400.0)],
            ..TemperatureConfig::default()
        };
        let model = TemperatureModel::from_config(&cfg, "W110", &grid()).unwrap();
        assert!((model.temperature(1.0, 0.0) - 900.0).abs() < 1e-12);
        assert!((model.temperature(6.0, 0.0) - 600.0).abs() < 1e-12);
        assert_eq!(model.temperature(50.0, 0.0), 400.0);
    }

    #[test]
    fn test_heat_equation_builds_surface_gradient() {
        let cfg = TemperatureConfig {
            const_temperature: Some(1.0e-7),
            bulk_temperature: Some(600.0),
            heat_equation: true,
            ..TemperatureConfig::default()
        };
        let g = grid();
        let mut model = TemperatureModel::from_config(&cfg, "W110", &g).unwrap();
        for _ in 0..50 {
            model.advance(1.0e-13);
        }
        let surface = model.temperature(0.0, 0.0);
        let bulk = model.temperature(10.0, 0.0);
        assert!(
            surface > bulk,
            "heat flux must warm the surface: {surface} vs {bulk}"
        );
        assert!((bulk - 600.0).abs() < 1e-9, "far field stays at bulk");
    }

    #[test]
    fn test_unknown_material_heat_constants_fail() {
        let cfg = TemperatureConfig {
            const_temperature: Some(1.0),
            heat_equation: true,
            ..TemperatureConfig::default()
        };
        assert!(TemperatureModel::from_config(&cfg, "Unobtainium", &grid()).is_err());
    }
}
