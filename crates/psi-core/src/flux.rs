// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Incident Flux
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Depth-profiled injection of the implanted species.
//!
//! The deposition profile is precomputed against the current surface
//! position and normalized so the integral over the interior equals one;
//! the amplitude (optionally time-tabulated) scales it at evaluation time.

use psi_types::grid::DepthGrid;

use psi_network::network::ReactionNetwork;
use psi_network::species::Species;

pub struct FluxHandler {
    amplitude: f64,
    implantation_depth: f64,
    time_profile: Vec<(f64, f64)>,
    incident_vec: Vec<f64>,
    fluence: f64,
    target_id: Option<usize>,
}

impl FluxHandler {
    pub fn new(amplitude: f64, implantation_depth: f64, time_profile: Vec<(f64, f64)>) -> Self {
        FluxHandler {
            amplitude,
            implantation_depth,
            time_profile,
            incident_vec: Vec::new(),
            fluence: 0.0,
            target_id: None,
        }
    }

    /// Precompute the deposition vector for the given surface position.
    /// Must be called again after every surface movement.
    pub fn initialize(&mut self, network: &ReactionNetwork, grid: &DepthGrid) {
        self.target_id = network.get(Species::He, 1).map(|c| c.id);
        self.incident_vec = vec![0.0; grid.len()];

        let lambda = self.implantation_depth.max(1e-6);
        let mut norm = 0.0;
        for xi in grid.interior() {
            let depth = grid.distance_from_surface(xi);
            if depth <= 0.0 {
                continue;
            }
            let dx = 0.5 * (grid.h_left(xi) + grid.h_right(xi));
            let value = depth / (lambda * lambda) * (-depth / lambda).exp();
            self.incident_vec[xi] = value;
            norm += value * dx;
        }
        if norm > 0.0 {
            for v in &mut self.incident_vec {
                *v /= norm;
            }
        }
    }

    /// Dense id of the implanted monomer, when the network carries it.
    pub fn target_id(&self) -> Option<usize> {
        self.target_id
    }

    /// Instantaneous flux amplitude, honoring the time profile.
    pub fn flux_amplitude(&self, time: f64) -> f64 {
        if self.time_profile.is_empty() {
            return self.amplitude;
        }
        let first = self.time_profile[0];
        if time <= first.0 {
            return first.1;
        }
        for pair in self.time_profile.windows(2) {
            let (t0, a0) = pair[0];
            let (t1, a1) = pair[1];
            if time <= t1 {
                let w = (time - t0) / (t1 - t0);
                return a0 + w * (a1 - a0);
            }
        }
        self.time_profile[self.time_profile.len() - 1].1
    }

    /// Source term added to the implanted species at grid point `xi`.
    pub fn incident_flux(&self, time: f64, xi: usize) -> f64 {
        self.incident_vec[xi] * self.flux_amplitude(time)
    }

    /// Integrate the fluence over one accepted step.
    pub fn increment_fluence(&mut self, dt: f64, time: f64) {
        self.fluence += self.flux_amplitude(time) * dt;
    }

    pub fn fluence(&self) -> f64 {
        self.fluence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psi_network::builder::tungsten_network;

    fn grid13() -> DepthGrid {
        DepthGrid::uniform(13, 0.1, 0.0).unwrap()
    }

    #[test]
    fn test_profile_normalized_over_interior() {
        let network = tungsten_network();
        let mut handler = FluxHandler::new(4.0e5, 1.0, Vec::new());
        let grid = grid13();
        handler.initialize(&network, &grid);

        let mut integral = 0.0;
        for xi in grid.interior() {
            let dx = 0.5 * (grid.h_left(xi) + grid.h_right(xi));
            integral += handler.incident_flux(0.0, xi) * dx;
        }
        assert!(
            (integral - 4.0e5).abs() < 1e-6 * 4.0e5,
            "deposited amplitude must integrate to the flux amplitude: {integral}"
        );
    }

    #[test]
    fn test_no_deposition_on_boundaries() {
        let network = tungsten_network();
        let mut handler = FluxHandler::new(1.0e5, 1.0, Vec::new());
        let grid = grid13();
        handler.initialize(&network, &grid);
        assert_eq!(handler.incident_flux(0.0, 0), 0.0);
        assert_eq!(handler.incident_flux(0.0, 12), 0.0);
    }

    #[test]
    fn test_time_profile_interpolates() {
        let handler = FluxHandler::new(1.0, 1.0, vec![(0.0, 0.0), (10.0, 100.0)]);
        assert_eq!(handler.flux_amplitude(-1.0), 0.0);
        assert!((handler.flux_amplitude(5.0) - 50.0).abs() < 1e-12);
        assert_eq!(handler.flux_amplitude(20.0), 100.0);
    }

    #[test]
    fn test_fluence_accumulates() {
        let mut handler = FluxHandler::new(2.0e5, 1.0, Vec::new());
        handler.increment_fluence(0.5, 0.0);
        handler.increment_fluence(0.5, 0.5);
        assert!((handler.fluence() - 2.0e5).abs() < 1e-6);
    }

    #[test]
    fn test_target_is_helium_monomer() {
        let network = tungsten_network();
        let mut handler = FluxHandler::new(1.0, 1.0, Vec::new());
        handler.initialize(&network, &grid13());
        let he1 = network.get(Species::He, 1).unwrap().id;
        assert_eq!(handler.target_id(), Some(he1));
    }
}
