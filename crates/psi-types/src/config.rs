// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{PsiError, PsiResult};

/// Top-level simulation configuration for the 1-D cluster-transport core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Crystallographic surface / material key: W100, W110, W111, W211, Fe, Fuel.
    pub material: String,
    pub grid: GridConfig,
    pub flux: FluxConfig,
    pub temperature: TemperatureConfig,
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub bursting: BurstingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of grid points on the depth axis, boundary cells included.
    pub nx: usize,
    /// Base step size (nm).
    pub hx: f64,
    /// Percentile of the grid reserved above the initial surface position.
    #[serde(default)]
    pub void_portion: f64,
    /// Left boundary width (reservoir cells beyond the surface index).
    #[serde(default = "default_left_offset")]
    pub left_offset: usize,
    /// Right boundary width; 1 marks the bottom as a free surface.
    #[serde(default = "default_right_offset")]
    pub right_offset: usize,
}

fn default_left_offset() -> usize {
    1
}

fn default_right_offset() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluxConfig {
    /// Incident flux amplitude (nm⁻²·s⁻¹).
    pub amplitude: f64,
    /// Mean implantation depth (nm) of the deposition profile.
    #[serde(default = "default_implantation_depth")]
    pub implantation_depth: f64,
    /// Optional (time, amplitude) table; empty means constant amplitude.
    #[serde(default)]
    pub time_profile: Vec<(f64, f64)>,
}

fn default_implantation_depth() -> f64 {
    1.0
}

/// Temperature options. A constant value and a profile table are mutually
/// exclusive; `heat_equation` promotes the constant value to a surface flux.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemperatureConfig {
    #[serde(default)]
    pub const_temperature: Option<f64>,
    #[serde(default)]
    pub bulk_temperature: Option<f64>,
    /// Depth-indexed (position, temperature) samples.
    #[serde(default)]
    pub profile: Vec<(f64, f64)>,
    #[serde(default)]
    pub heat_equation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Seeded vacancy concentration below the surface.
    #[serde(default)]
    pub initial_v_conc: f64,
    /// Whether the surface index is allowed to move.
    #[serde(default)]
    pub moving_surface: bool,
    /// Sputtering yield (atoms/ion) removed from the interstitial count.
    #[serde(default)]
    pub sputtering_yield: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstingConfig {
    pub enabled: bool,
    /// Depth scale τ (nm) in the bursting probability.
    pub depth_param: f64,
    /// PRNG seed for the bursting draw.
    pub seed: u64,
}

impl Default for BurstingConfig {
    fn default() -> Self {
        BurstingConfig {
            enabled: false,
            depth_param: 10.0,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Load from a JSON file, then validate. Fails fast on contradictory
    /// options so the process can abort before any solver state exists.
    pub fn from_file(path: &str) -> PsiResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PsiResult<()> {
        if self.grid.nx < 3 {
            return Err(PsiError::ConfigError(format!(
                "grid requires at least 3 points, got {}",
                self.grid.nx
            )));
        }
        if !self.grid.hx.is_finite() || self.grid.hx <= 0.0 {
            return Err(PsiError::ConfigError(format!(
                "grid step must be finite and > 0, got {}",
                self.grid.hx
            )));
        }
        if !(0.0..100.0).contains(&self.grid.void_portion) {
            return Err(PsiError::ConfigError(format!(
                "void portion must be in [0, 100), got {}",
                self.grid.void_portion
            )));
        }
        if !self.flux.amplitude.is_finite() || self.flux.amplitude < 0.0 {
            return Err(PsiError::ConfigError(format!(
                "flux amplitude must be finite and >= 0, got {}",
                self.flux.amplitude
            )));
        }
        if self.temperature.const_temperature.is_some() && !self.temperature.profile.is_empty() {
            return Err(PsiError::ConfigError(
                "a constant temperature value and a temperature profile cannot both be given"
                    .to_string(),
            ));
        }
        if let Some(t) = self.temperature.const_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(PsiError::ConfigError(format!(
                    "constant temperature must be finite and > 0, got {t}"
                )));
            }
        }
        if self.surface.initial_v_conc < 0.0 {
            return Err(PsiError::ConfigError(format!(
                "initial vacancy concentration must be >= 0, got {}",
                self.surface.initial_v_conc
            )));
        }
        if self.bursting.enabled && self.bursting.depth_param <= 0.0 {
            return Err(PsiError::ConfigError(format!(
                "bursting depth parameter must be > 0, got {}",
                self.bursting.depth_param
            )));
        }
        Ok(())
    }
}
