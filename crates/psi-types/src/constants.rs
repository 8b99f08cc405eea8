// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Boltzmann constant (eV/K). All activation laws in the core use eV.
pub const K_BOLTZMANN_EV: f64 = 8.617343e-5;

/// Tungsten lattice constant (nm), bcc.
pub const TUNGSTEN_LATTICE: f64 = 0.317;

/// Iron lattice constant (nm), bcc.
pub const IRON_LATTICE: f64 = 0.287;

/// UO2 lattice constant (nm), fluorite.
pub const UO2_LATTICE: f64 = 0.547;

/// Tungsten atomic density (atoms/nm³); sets the surface-motion threshold.
pub const TUNGSTEN_DENSITY: f64 = 62.8;

/// Helium impurity radius (nm) used as the capture-radius floor.
pub const HELIUM_RADIUS: f64 = 0.3;

/// Tungsten heat coefficient (nm²/s) for the heat-equation temperature field.
pub const TUNGSTEN_HEAT_COEFFICIENT: f64 = 6.835e13;

/// Tungsten heat conductivity (W/(nm·K)).
pub const TUNGSTEN_HEAT_CONDUCTIVITY: f64 = 1.73e-7;

/// Iron heat coefficient (nm²/s).
pub const IRON_HEAT_COEFFICIENT: f64 = 2.26e13;

/// Iron heat conductivity (W/(nm·K)).
pub const IRON_HEAT_CONDUCTIVITY: f64 = 8.02e-8;

/// UO2 heat coefficient (nm²/s).
pub const UO2_HEAT_COEFFICIENT: f64 = 1.12e12;

/// UO2 heat conductivity (W/(nm·K)).
pub const UO2_HEAT_CONDUCTIVITY: f64 = 8.6e-9;

/// Atomic volume of bcc tungsten (nm³): a³ for 2 atoms per cell.
pub fn tungsten_atomic_volume() -> f64 {
    0.5 * TUNGSTEN_LATTICE * TUNGSTEN_LATTICE * TUNGSTEN_LATTICE
}

/// Spherical bubble radius (nm) for a cluster holding `n_v` vacancies in a
/// lattice of constant `a`: r = (√3/4)a + ∛(3a³n_v/8π) − ∛(3a³/8π).
pub fn bubble_radius(a: f64, n_v: f64) -> f64 {
    let a3 = a * a * a;
    let geom = 3.0 * a3 / (8.0 * std::f64::consts::PI);
    (3.0_f64.sqrt() / 4.0) * a + (geom * n_v).cbrt() - geom.cbrt()
}
