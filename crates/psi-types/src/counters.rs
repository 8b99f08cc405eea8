// ─────────────────────────────────────────────────────────────────────
// SCPN PSI Core — Counters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Process-shared cumulative counters.
//!
//! Every process holds a replica; the owner of the surface (or bottom) grid
//! point updates its copy and broadcasts the packet at event boundaries.

use serde::{Deserialize, Serialize};

/// Interstitial bookkeeping for the moving surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCounters {
    pub n_interstitial: f64,
    pub previous_i_flux: f64,
}

impl SurfaceCounters {
    pub fn pack(&self) -> [f64; 2] {
        [self.n_interstitial, self.previous_i_flux]
    }

    pub fn unpack(&mut self, data: &[f64; 2]) {
        self.n_interstitial = data[0];
        self.previous_i_flux = data[1];
    }
}

/// He/D/T bulk-loss bookkeeping for a free bottom surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkCounters {
    pub n_helium: f64,
    pub previous_he_flux: f64,
    pub n_deuterium: f64,
    pub previous_d_flux: f64,
    pub n_tritium: f64,
    pub previous_t_flux: f64,
}

impl BulkCounters {
    pub fn pack(&self) -> [f64; 6] {
        [
            self.n_helium,
            self.previous_he_flux,
            self.n_deuterium,
            self.previous_d_flux,
            self.n_tritium,
            self.previous_t_flux,
        ]
    }

    pub fn unpack(&mut self, data: &[f64; 6]) {
        self.n_helium = data[0];
        self.previous_he_flux = data[1];
        self.n_deuterium = data[2];
        self.previous_d_flux = data[3];
        self.n_tritium = data[4];
        self.previous_t_flux = data[5];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_counter_pack_roundtrip() {
        let c = SurfaceCounters {
            n_interstitial: 3.5,
            previous_i_flux: -0.25,
        };
        let mut d = SurfaceCounters::default();
        d.unpack(&c.pack());
        assert_eq!(c, d);
    }

    #[test]
    fn test_bulk_counter_pack_roundtrip() {
        let c = BulkCounters {
            n_helium: 1.0,
            previous_he_flux: 2.0,
            n_deuterium: 3.0,
            previous_d_flux: 4.0,
            n_tritium: 5.0,
            previous_t_flux: 6.0,
        };
        let mut d = BulkCounters::default();
        d.unpack(&c.pack());
        assert_eq!(c, d);
    }
}
