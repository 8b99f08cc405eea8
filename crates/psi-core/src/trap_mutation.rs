// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Modified Trap-Mutation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Material-indexed trap-mutation: near the free surface a helium cluster
//! captures a lattice vacancy and ejects a self-interstitial,
//! He_s → HeV_{s,v} + I.
//!
//! Per crystallographic surface, each helium size carries a maximum depth at
//! which the conversion is active and the vacancy count of the product. The
//! per-grid-point index lists are precomputed at initialization; a missing
//! product cluster silently disables the channel at that site.

use psi_types::constants::K_BOLTZMANN_EV;
use psi_types::error::{PsiError, PsiResult};
use psi_types::grid::DepthGrid;

use psi_network::network::ReactionNetwork;
use psi_network::species::{Composition, Species};

/// Depth comparisons tolerate grid round-off.
const DEPTH_TOL: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    W100,
    W110,
    W111,
    W211,
    Fe,
    UO2,
}

impl Material {
    pub fn from_key(key: &str) -> PsiResult<Self> {
        match key {
            "W100" => Ok(Material::W100),
            "W110" => Ok(Material::W110),
            "W111" => Ok(Material::W111),
            "W211" => Ok(Material::W211),
            "Fe" => Ok(Material::Fe),
            "Fuel" => Ok(Material::UO2),
            other => Err(PsiError::ConfigError(format!(
                "unknown material key {other}"
            ))),
        }
    }
}

/// Activation rule for one helium size: active for depths up to
/// `max_depth` (nm), producing a HeV cluster with `vacancy` vacancies.
#[derive(Debug, Clone, Copy)]
struct MutationRule {
    size: u32,
    max_depth: f64,
    vacancy: u32,
}

/// One active conversion site: helium reactant and HeV product rows.
#[derive(Debug, Clone, Copy)]
struct MutatingPair {
    he_id: usize,
    hev_id: usize,
}

pub struct TrapMutationHandler {
    rules: Vec<MutationRule>,
    /// Desorption activation energy E_a (eV) of the surface.
    activation_energy: f64,
    k_mutation: f64,
    /// Active pairs per grid point, in helium-size order.
    index_vector: Vec<Vec<MutatingPair>>,
    he1_id: Option<usize>,
    i1_id: Option<usize>,
}

impl TrapMutationHandler {
    pub fn new(material: Material) -> Self {
        let (rules, activation_energy) = material_rules(material);
        TrapMutationHandler {
            rules,
            activation_energy,
            k_mutation: 0.0,
            index_vector: Vec::new(),
            he1_id: None,
            i1_id: None,
        }
    }

    /// Resolve the per-grid-point conversion lists against the catalogue.
    /// Must be called again after every surface movement.
    pub fn initialize(&mut self, network: &ReactionNetwork, grid: &DepthGrid) {
        self.he1_id = network.get(Species::He, 1).map(|c| c.id);
        self.i1_id = network.get(Species::I, 1).map(|c| c.id);
        self.index_vector = vec![Vec::new(); grid.len()];

        for xi in grid.interior() {
            let depth = grid.distance_from_surface(xi);
            if depth <= 0.0 {
                continue;
            }
            let mut pairs = Vec::new();
            for rule in &self.rules {
                if depth > rule.max_depth + DEPTH_TOL {
                    continue;
                }
                let Some(he) = network.get(Species::He, rule.size) else {
                    continue;
                };
                let product = Composition::pure(Species::He, rule.size).with(Species::V, rule.vacancy);
                // No product in the network: no reaction at this site.
                let Some(hev) = network.get_mixed(&product) else {
                    continue;
                };
                pairs.push(MutatingPair {
                    he_id: he.id,
                    hev_id: hev.id,
                });
            }
            self.index_vector[xi] = pairs;
        }
    }

    /// Rebuild k_tm from the helium-monomer diffusion coefficient:
    /// k_tm = 4 · exp(−E_a / k_B T) · D_He1(T).
    pub fn update_trap_mutation_rate(&mut self, network: &ReactionNetwork) {
        let Some(he1) = self.he1_id else {
            self.k_mutation = 0.0;
            return;
        };
        let temperature = network.temperature();
        if temperature <= 0.0 {
            self.k_mutation = 0.0;
            return;
        }
        let attempt = (-self.activation_energy / (K_BOLTZMANN_EV * temperature)).exp();
        self.k_mutation = 4.0 * attempt * network.diffusion_coefficient(he1);
    }

    pub fn k_mutation(&self) -> f64 {
        self.k_mutation
    }

    /// Number of helium sizes mutating at `xi`.
    pub fn num_mutating(&self, xi: usize) -> usize {
        self.index_vector[xi].len()
    }

    /// Residual contribution at grid point `xi`:
    /// out[He_s] −= k·C, out[HeV] += k·C, out[I] += k·C for every pair.
    pub fn compute_trap_mutation(&self, xi: usize, conc: &[f64], out: &mut [f64]) {
        let Some(i1) = self.i1_id else {
            return;
        };
        let k = self.k_mutation;
        for pair in &self.index_vector[xi] {
            let rate = k * conc[pair.he_id];
            out[pair.he_id] -= rate;
            out[pair.hev_id] += rate;
            out[i1] += rate;
        }
    }

    /// Jacobian triples at `xi`, three entries per mutating pair in
    /// (He row, HeV row, I row) order, all against the He column.
    /// Returns the number of mutating pairs.
    pub fn partials_for_trap_mutation(
        &self,
        vals: &mut [f64],
        indices: &mut [usize],
        xi: usize,
    ) -> usize {
        let Some(i1) = self.i1_id else {
            return 0;
        };
        let k = self.k_mutation;
        for (n, pair) in self.index_vector[xi].iter().enumerate() {
            indices[3 * n] = pair.he_id;
            indices[3 * n + 1] = pair.hev_id;
            indices[3 * n + 2] = i1;
            vals[3 * n] = -k;
            vals[3 * n + 1] = k;
            vals[3 * n + 2] = k;
        }
        self.index_vector[xi].len()
    }

    /// Rows and columns the diagonal Jacobian pass may touch, for the
    /// diagonal fill pattern. Derived from the rule table rather than the
    /// current depth lists so the pattern survives surface movement.
    pub fn fill_couplings(&self, network: &ReactionNetwork) -> Vec<(usize, usize)> {
        let Some(i1) = network.get(Species::I, 1).map(|c| c.id) else {
            return Vec::new();
        };
        let mut couplings = Vec::new();
        for rule in &self.rules {
            if rule.max_depth <= 0.0 {
                continue;
            }
            let Some(he) = network.get(Species::He, rule.size) else {
                continue;
            };
            let product = Composition::pure(Species::He, rule.size).with(Species::V, rule.vacancy);
            let Some(hev) = network.get_mixed(&product) else {
                continue;
            };
            couplings.push((he.id, he.id));
            couplings.push((hev.id, he.id));
            couplings.push((i1, he.id));
        }
        couplings.sort_unstable();
        couplings.dedup();
        couplings
    }
}

/// Per-surface rule tables. Sizes absent from the table never mutate; a
/// negative depth disables a size outright.
fn material_rules(material: Material) -> (Vec<MutationRule>, f64) {
    let table: (&[(u32, f64, u32)], f64) = match material {
        Material::W100 => (
            &[
                (1, 0.6, 1),
                (2, 0.6, 1),
                (3, 0.6, 1),
                (4, 0.6, 1),
                (5, 0.8, 1),
                (6, 0.8, 1),
                (7, 0.8, 1),
            ],
            0.0,
        ),
        Material::W110 => (
            &[
                (1, -0.1, 1),
                (2, -0.1, 1),
                (3, 0.5, 1),
                (4, 0.5, 1),
                (5, 0.5, 1),
                (6, 0.5, 1),
                (7, 1.0, 1),
                (8, 1.0, 1),
            ],
            0.0,
        ),
        Material::W111 => (
            &[
                (1, 0.6, 1),
                (2, 0.6, 1),
                (3, 0.8, 1),
                (4, 0.8, 1),
                (5, 1.0, 1),
                (6, 1.0, 1),
                (7, 1.0, 1),
            ],
            0.0,
        ),
        Material::W211 => (
            &[
                (1, 0.5, 1),
                (2, 0.5, 1),
                (3, 0.8, 1),
                (4, 0.8, 1),
                (5, 1.0, 1),
                (6, 1.0, 1),
                (7, 1.0, 1),
            ],
            0.0,
        ),
        Material::Fe => (
            &[
                (1, 0.3, 1),
                (2, 0.3, 1),
                (3, 0.3, 1),
                (4, 0.3, 1),
                (5, 0.3, 1),
                (6, 0.3, 1),
                (7, 0.3, 1),
                (8, 0.3, 1),
            ],
            0.06,
        ),
        Material::UO2 => (&[], 0.0),
    };
    let rules = table
        .0
        .iter()
        .map(|&(size, max_depth, vacancy)| MutationRule {
            size,
            max_depth,
            vacancy,
        })
        .collect();
    (rules, table.1)
}
