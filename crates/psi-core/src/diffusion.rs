// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Diffusion Operator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Nonuniform three-point diffusion stencil for mobile clusters.

use psi_network::network::ReactionNetwork;

use crate::jacobian::FillPattern;

pub struct DiffusionHandler {
    diffusing: Vec<usize>,
}

impl DiffusionHandler {
    /// Register every mobile cluster of the network.
    pub fn new(network: &ReactionNetwork) -> Self {
        let diffusing = network
            .all()
            .filter(|c| c.is_mobile())
            .map(|c| c.id)
            .collect();
        DiffusionHandler { diffusing }
    }

    pub fn num_diffusing(&self) -> usize {
        self.diffusing.len()
    }

    pub fn diffusing_ids(&self) -> &[usize] {
        &self.diffusing
    }

    /// Diffusion couples a dof only to itself on neighboring points.
    pub fn initialize_ofill(&self, ofill: &mut FillPattern) {
        for &id in &self.diffusing {
            ofill.set(id, id);
        }
    }

    /// Add `D_c · 2/(hL+hR) · ((C_l − C_m)/hL + (C_r − C_m)/hR)` for each
    /// diffusing cluster. `conc` holds the middle, left and right rows.
    pub fn compute_diffusion(
        &self,
        network: &ReactionNetwork,
        conc: [&[f64]; 3],
        out: &mut [f64],
        h_left: f64,
        h_right: f64,
    ) {
        let [mid, left, right] = conc;
        for &id in &self.diffusing {
            let d = network.diffusion_coefficient(id);
            out[id] += d * 2.0 / (h_left + h_right)
                * ((left[id] - mid[id]) / h_left + (right[id] - mid[id]) / h_right);
        }
    }

    /// Emit per-cluster stencil coefficients in (middle, left, right) order.
    /// `vals` must hold `3 · num_diffusing` entries, `indices` one per
    /// diffusing cluster.
    pub fn partials_for_diffusion(
        &self,
        network: &ReactionNetwork,
        vals: &mut [f64],
        indices: &mut [usize],
        h_left: f64,
        h_right: f64,
    ) {
        for (i, &id) in self.diffusing.iter().enumerate() {
            let d = network.diffusion_coefficient(id);
            indices[i] = id;
            vals[3 * i] = -2.0 * d / (h_left * h_right);
            vals[3 * i + 1] = 2.0 * d / ((h_left + h_right) * h_left);
            vals[3 * i + 2] = 2.0 * d / ((h_left + h_right) * h_right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_network::builder::tungsten_network;

    #[test]
    fn test_registers_mobile_clusters() {
        let network = tungsten_network();
        let handler = DiffusionHandler::new(&network);
        // I1..I3, He1..He5, V1 are mobile in the tungsten layout.
        assert_eq!(handler.num_diffusing(), 9);
    }

    #[test]
    fn test_flat_profile_has_zero_diffusion() {
        let mut network = tungsten_network();
        network.set_temperature(1000.0);
        let handler = DiffusionHandler::new(&network);
        let n = network.size();
        let row = vec![2.0e15; n];
        let mut out = vec![0.0; n];
        handler.compute_diffusion(&network, [&row, &row, &row], &mut out, 0.1, 0.1);
        assert!(out.iter().all(|v| v.abs() < 1e-6), "flat profile must not diffuse");
    }

    #[test]
    fn test_curvature_drives_positive_flux() {
        let mut network = tungsten_network();
        network.set_temperature(1000.0);
        let handler = DiffusionHandler::new(&network);
        let he1 = network.get(psi_network::species::Species::He, 1).unwrap().id;
        let n = network.size();
        let mid = vec![1.0e15; n];
        let side = vec![2.0e15; n];
        let mut out = vec![0.0; n];
        handler.compute_diffusion(&network, [&mid, &side, &side], &mut out, 0.1, 0.1);
        assert!(out[he1] > 0.0, "local minimum must fill in: {}", out[he1]);
    }

    #[test]
    fn test_partials_sum_to_zero() {
        // The stencil conserves mass: middle + left + right = 0.
        let mut network = tungsten_network();
        network.set_temperature(1000.0);
        let handler = DiffusionHandler::new(&network);
        let n = handler.num_diffusing();
        let mut vals = vec![0.0; 3 * n];
        let mut indices = vec![0usize; n];
        handler.partials_for_diffusion(&network, &mut vals, &mut indices, 0.1, 0.25);
        for i in 0..n {
            let sum = vals[3 * i] + vals[3 * i + 1] + vals[3 * i + 2];
            let scale = vals[3 * i].abs().max(1.0);
            assert!(sum.abs() <= 1e-12 * scale, "stencil row {i} must sum to zero: {sum}");
        }
    }

    #[test]
    fn test_ofill_marks_diagonal_only() {
        let network = tungsten_network();
        let handler = DiffusionHandler::new(&network);
        let mut ofill = FillPattern::new(network.size());
        handler.initialize_ofill(&mut ofill);
        for row in 0..network.size() {
            for &col in ofill.row(row) {
                assert_eq!(row, col, "diffusion must not couple species");
            }
        }
    }
}
