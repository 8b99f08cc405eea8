// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Advection Operator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Surface-sink advection: a two-point drift whose effective velocity is
//! set by the elastic interaction with the free surface, decaying as the
//! fourth power of depth. Beyond a per-cluster cutoff the drift vanishes.

use psi_types::constants::K_BOLTZMANN_EV;

use psi_network::network::ReactionNetwork;
use psi_network::species::Species;

use crate::jacobian::FillPattern;

/// Default cutoff depth (nm) beyond which surface drift is negligible.
const DEFAULT_CUTOFF: f64 = 10.0;

/// Sink strengths (eV·nm³) for the small mobile helium clusters near a
/// tungsten surface, indexed by cluster size.
const HELIUM_SINK_STRENGTH: [f64; 7] = [2.28e-3, 5.06e-3, 7.26e-3, 9.23e-3, 1.105e-2, 1.27e-2, 1.43e-2];

struct AdvectingCluster {
    id: usize,
    sink_strength: f64,
    cutoff: f64,
}

pub struct AdvectionHandler {
    advecting: Vec<AdvectingCluster>,
}

impl AdvectionHandler {
    /// Register the mobile helium chain with the tungsten sink strengths.
    pub fn helium(network: &ReactionNetwork) -> Self {
        let mut advecting = Vec::new();
        for (size, strength) in HELIUM_SINK_STRENGTH.iter().enumerate() {
            if let Some(cluster) = network.get(Species::He, size as u32 + 1) {
                if cluster.is_mobile() {
                    advecting.push(AdvectingCluster {
                        id: cluster.id,
                        sink_strength: *strength,
                        cutoff: DEFAULT_CUTOFF,
                    });
                }
            }
        }
        AdvectionHandler { advecting }
    }

    pub fn empty() -> Self {
        AdvectionHandler {
            advecting: Vec::new(),
        }
    }

    pub fn num_advecting(&self) -> usize {
        self.advecting.len()
    }

    /// Advection also couples each dof only to itself across points.
    pub fn initialize_ofill(&self, ofill: &mut FillPattern) {
        for c in &self.advecting {
            ofill.set(c.id, c.id);
        }
    }

    /// Add the two-point drift using the middle and right rows. `distance`
    /// is the depth of the middle point below the surface.
    pub fn compute_advection(
        &self,
        network: &ReactionNetwork,
        conc: [&[f64]; 2],
        out: &mut [f64],
        h_right: f64,
        distance: f64,
    ) {
        let [mid, right] = conc;
        let temperature = network.temperature();
        if temperature <= 0.0 || distance <= 0.0 {
            return;
        }
        for c in &self.advecting {
            if distance > c.cutoff {
                continue;
            }
            let d = network.diffusion_coefficient(c.id);
            let conv = 3.0 * c.sink_strength * d / (K_BOLTZMANN_EV * temperature * h_right);
            let d_right = distance + h_right;
            out[c.id] += conv * (right[c.id] / d_right.powi(4) - mid[c.id] / distance.powi(4));
        }
    }

    /// Emit per-cluster stencil coefficients in (middle, right) order.
    /// `vals` must hold `2 · num_advecting` entries. Entries beyond the
    /// cutoff stay zero so the Jacobian pattern is point-independent.
    pub fn partials_for_advection(
        &self,
        network: &ReactionNetwork,
        vals: &mut [f64],
        indices: &mut [usize],
        h_right: f64,
        distance: f64,
    ) {
        let temperature = network.temperature();
        for (i, c) in self.advecting.iter().enumerate() {
            indices[i] = c.id;
            vals[2 * i] = 0.0;
            vals[2 * i + 1] = 0.0;
            if temperature <= 0.0 || distance <= 0.0 || distance > c.cutoff {
                continue;
            }
            let d = network.diffusion_coefficient(c.id);
            let conv = 3.0 * c.sink_strength * d / (K_BOLTZMANN_EV * temperature * h_right);
            let d_right = distance + h_right;
            vals[2 * i] = -conv / distance.powi(4);
            vals[2 * i + 1] = conv / d_right.powi(4);
        }
    }
}
